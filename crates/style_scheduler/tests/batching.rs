use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use style_core::{ConfigHandle, StyleConfig};
use style_scheduler::{BatchScheduler, FlushState, InsertFn};

type Writes = Rc<RefCell<Vec<(String, String)>>>;

fn recorder() -> (Writes, InsertFn) {
    let writes: Writes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&writes);
    let insert: InsertFn = Box::new(move |class_name: &str, css: &str| {
        sink.borrow_mut().push((class_name.to_owned(), css.to_owned()));
    });
    (writes, insert)
}

fn batching_config() -> ConfigHandle {
    ConfigHandle::new(StyleConfig {
        enable_async: true,
        batch_delay_ms: 0,
        ..StyleConfig::default()
    })
}

#[test]
fn same_class_coalesces_to_last_write() {
    let (writes, insert) = recorder();
    let mut sched = BatchScheduler::new(batching_config(), Some(insert));

    sched.schedule_update("btn", ".btn{color:red}", 0);
    sched.schedule_update("btn", ".btn{color:blue}", 0);
    assert_eq!(sched.pending_count(), 1);

    assert_eq!(sched.flush_sync(), 1);
    assert_eq!(
        *writes.borrow(),
        vec![("btn".to_owned(), ".btn{color:blue}".to_owned())]
    );
}

#[test]
fn flush_runs_highest_priority_first() {
    let (writes, insert) = recorder();
    let mut sched = BatchScheduler::new(batching_config(), Some(insert));

    sched.schedule_update("low", "1", 1);
    sched.schedule_update("high", "10", 10);
    sched.schedule_update("mid", "5", 5);
    sched.flush_sync();

    let order: Vec<String> = writes.borrow().iter().map(|(_, css)| css.clone()).collect();
    assert_eq!(order, vec!["10", "5", "1"]);
}

#[test]
fn equal_priorities_keep_queue_order() {
    let (writes, insert) = recorder();
    let mut sched = BatchScheduler::new(batching_config(), Some(insert));
    for name in ["a", "b", "c"] {
        sched.schedule_update(name, name, 3);
    }
    sched.flush_sync();
    let order: Vec<String> = writes.borrow().iter().map(|(class, _)| class.clone()).collect();
    assert_eq!(order, vec!["a", "b", "c"]);
}

#[test]
fn immediate_mode_writes_synchronously() {
    let (writes, insert) = recorder();
    let config = ConfigHandle::new(StyleConfig {
        enable_batch_updates: false,
        ..StyleConfig::default()
    });
    let mut sched = BatchScheduler::new(config, Some(insert));

    sched.schedule_update("a", "1", 0);
    sched.schedule_update("a", "2", 0);
    assert_eq!(writes.borrow().len(), 2);
    assert_eq!(sched.pending_count(), 0);
    assert_eq!(sched.state(), FlushState::Idle);
}

#[test]
fn timer_flush_fires_after_delay() {
    let (writes, insert) = recorder();
    let config = ConfigHandle::new(StyleConfig {
        enable_async: true,
        batch_delay_ms: 20,
        ..StyleConfig::default()
    });
    let mut sched = BatchScheduler::new(config, Some(insert));
    sched.schedule_update("a", "1", 0);

    assert_eq!(sched.tick(Instant::now()), 0);
    assert!(writes.borrow().is_empty());
    assert_eq!(sched.tick(Instant::now() + Duration::from_millis(25)), 1);
    assert_eq!(writes.borrow().len(), 1);
}

#[test]
fn flush_sync_without_armed_flush_is_a_no_op() {
    let (writes, insert) = recorder();
    let mut sched = BatchScheduler::new(batching_config(), Some(insert));
    assert_eq!(sched.flush_sync(), 0);
    assert!(writes.borrow().is_empty());
    assert!(sched.last_flush().is_none());
}

#[test]
fn clear_discards_without_writing() {
    let (writes, insert) = recorder();
    let mut sched = BatchScheduler::new(batching_config(), Some(insert));
    sched.schedule_update("a", "1", 0);
    sched.schedule_update("b", "2", 0);
    sched.clear();

    assert_eq!(sched.pending_count(), 0);
    assert_eq!(sched.state(), FlushState::Idle);
    assert_eq!(sched.flush_sync(), 0);
    assert!(writes.borrow().is_empty());
}

#[test]
fn pending_tasks_use_the_callback_current_at_flush() {
    let (early_writes, early) = recorder();
    let (late_writes, late) = recorder();
    let mut sched = BatchScheduler::new(batching_config(), Some(early));

    sched.schedule_update("a", "1", 0);
    sched.set_insert_function(Some(late));
    sched.flush_sync();

    assert!(early_writes.borrow().is_empty());
    assert_eq!(late_writes.borrow().len(), 1);
}

#[test]
fn missing_callback_never_panics() {
    let mut sched = BatchScheduler::new(batching_config(), None);
    sched.schedule_update("a", "1", 0);
    assert_eq!(sched.flush_sync(), 1);
    assert_eq!(sched.pending_count(), 0);

    let immediate = ConfigHandle::new(StyleConfig {
        enable_batch_updates: false,
        ..StyleConfig::default()
    });
    let mut direct = BatchScheduler::new(immediate, None);
    direct.schedule_update("a", "1", 0);
    assert_eq!(direct.pending_count(), 0);
}

#[test]
fn monitoring_records_flush_stats() {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = batching_config();
    config.update(|config| config.enable_performance_monitoring = true);
    let mut sched = BatchScheduler::new(config, None);
    sched.schedule_update("a", "1", 0);
    sched.schedule_update("b", "2", 0);
    sched.flush_sync();
    assert_eq!(sched.last_flush().map(|stats| stats.tasks), Some(2));
}

#[test]
fn rescheduling_after_flush_rearms() {
    let (writes, insert) = recorder();
    let mut sched = BatchScheduler::new(batching_config(), Some(insert));
    sched.schedule_update("a", "1", 0);
    sched.flush_sync();
    sched.schedule_update("a", "2", 0);
    assert_ne!(sched.state(), FlushState::Idle);
    sched.flush_sync();
    assert_eq!(writes.borrow().len(), 2);
}
