//! Batch scheduler for rule writes.
//!
//! Writes are coalesced per class name (last write wins before a flush) and
//! committed in priority order. The host drives the cadence: it reports
//! animation frames through [`BatchScheduler::on_animation_frame`] and wakes the
//! scheduler with [`BatchScheduler::tick`] once [`BatchScheduler::next_deadline`]
//! has passed.
//!
//! ```text
//! Idle --schedule_update--> AwaitingFrame --frame--> AwaitingTimer --deadline--> flush --> Idle
//!                    \____(async mode)________________/
//! ```

use log::{debug, info};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::mem;
use std::time::{Duration, Instant};
use style_core::ConfigHandle;

/// Log target for flush diagnostics.
pub const PERF_TARGET: &str = "style_scheduler::perf";

/// Callback that commits one rule: `(class_name, css)`.
pub type InsertFn = Box<dyn FnMut(&str, &str)>;

/// A pending rule write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateTask {
    /// Monotonic id, assigned when the task is (re)scheduled.
    pub id: u64,
    /// Class the rule belongs to.
    pub class_name: String,
    /// Final CSS text.
    pub css: String,
    /// Higher priorities flush first.
    pub priority: i32,
}

/// Where the scheduler is in its flush cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushState {
    /// Nothing pending.
    Idle,
    /// Waiting for the next animation frame before starting the delay.
    AwaitingFrame,
    /// Waiting for the delay to elapse.
    AwaitingTimer {
        /// Instant at which the flush may run.
        deadline: Instant,
    },
}

/// Summary of one flush.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FlushStats {
    /// Number of tasks written.
    pub tasks: usize,
    /// Time spent writing, in microseconds.
    pub duration_us: u64,
}

/// Coalescing priority scheduler.
pub struct BatchScheduler {
    config: ConfigHandle,
    insert: Option<InsertFn>,
    pending: Vec<UpdateTask>,
    /// Class name to index in `pending`.
    by_class: FxHashMap<String, usize>,
    state: FlushState,
    next_id: u64,
    last_flush: Option<FlushStats>,
}

impl BatchScheduler {
    /// Scheduler writing through `insert`.
    pub fn new(config: ConfigHandle, insert: Option<InsertFn>) -> Self {
        Self {
            config,
            insert,
            pending: Vec::new(),
            by_class: FxHashMap::default(),
            state: FlushState::Idle,
            next_id: 0,
            last_flush: None,
        }
    }

    /// Queue a write for `class_name`, replacing any pending one.
    ///
    /// With batching disabled the write happens immediately.
    pub fn schedule_update(&mut self, class_name: &str, css: &str, priority: i32) {
        let config = self.config.get();
        if !config.enable_batch_updates {
            if let Some(insert) = self.insert.as_mut() {
                insert(class_name, css);
            }
            return;
        }

        self.next_id += 1;
        let task = UpdateTask {
            id: self.next_id,
            class_name: class_name.to_owned(),
            css: css.to_owned(),
            priority,
        };
        match self.by_class.get(class_name) {
            Some(&index) => self.pending[index] = task,
            None => {
                self.by_class.insert(class_name.to_owned(), self.pending.len());
                self.pending.push(task);
            }
        }

        if self.state == FlushState::Idle {
            self.state = if config.enable_async {
                FlushState::AwaitingTimer {
                    deadline: Instant::now() + config.batch_delay(),
                }
            } else {
                FlushState::AwaitingFrame
            };
            debug!("batch flush armed: {:?}", self.state);
        }
    }

    /// Report an animation frame. Starts the delay timer if a flush is waiting
    /// for a frame.
    pub fn on_animation_frame(&mut self, now: Instant) {
        if self.state == FlushState::AwaitingFrame {
            self.state = FlushState::AwaitingTimer {
                deadline: now + self.config.get().batch_delay(),
            };
        }
    }

    /// Run the flush if its deadline has passed. Returns the number of tasks
    /// written.
    pub fn tick(&mut self, now: Instant) -> usize {
        match self.state {
            FlushState::AwaitingTimer { deadline } if now >= deadline => self.flush(),
            FlushState::Idle | FlushState::AwaitingFrame | FlushState::AwaitingTimer { .. } => 0,
        }
    }

    /// Run an armed flush right away. No-op when nothing is armed.
    pub fn flush_sync(&mut self) -> usize {
        if self.state == FlushState::Idle {
            return 0;
        }
        self.flush()
    }

    /// Drop every pending task without writing it.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.by_class.clear();
        self.state = FlushState::Idle;
    }

    /// Drop the pending task for one class, if any.
    pub fn discard(&mut self, class_name: &str) -> bool {
        let Some(index) = self.by_class.remove(class_name) else {
            return false;
        };
        self.pending.remove(index);
        for slot in self.by_class.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        if self.pending.is_empty() {
            self.state = FlushState::Idle;
        }
        true
    }

    /// Replace the write callback. Pending tasks go through whichever callback
    /// is installed when they flush.
    pub fn set_insert_function(&mut self, insert: Option<InsertFn>) {
        self.insert = insert;
    }

    /// Number of distinct class names waiting to be written.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Current flush state.
    #[inline]
    pub fn state(&self) -> FlushState {
        self.state
    }

    /// When the host should next call [`Self::tick`], if a timer is running.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            FlushState::AwaitingTimer { deadline } => Some(deadline),
            FlushState::Idle | FlushState::AwaitingFrame => None,
        }
    }

    /// Statistics of the most recent flush.
    #[inline]
    pub fn last_flush(&self) -> Option<FlushStats> {
        self.last_flush
    }

    fn flush(&mut self) -> usize {
        let started = Instant::now();
        let mut tasks = mem::take(&mut self.pending);
        self.by_class.clear();
        self.state = FlushState::Idle;

        // Stable: equal priorities keep queue order.
        tasks.sort_by(|left, right| right.priority.cmp(&left.priority));
        if let Some(insert) = self.insert.as_mut() {
            for task in &tasks {
                insert(&task.class_name, &task.css);
            }
        }

        let stats = FlushStats {
            tasks: tasks.len(),
            duration_us: duration_micros(started.elapsed()),
        };
        self.last_flush = Some(stats);
        if self.config.get().enable_performance_monitoring {
            info!(
                target: PERF_TARGET,
                "{}",
                serde_json::to_string(&stats).unwrap_or_default()
            );
        }
        stats.tasks
    }
}

fn duration_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}
