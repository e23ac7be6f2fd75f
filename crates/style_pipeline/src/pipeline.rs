use crate::host::{ClassListHost, NoopClassHost};
use crate::sequence::WriteSequencer;
use anyhow::Result;
use log::debug;
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Instant;
use style_cache::{CacheStats, StyleCache};
use style_compiler::{CssCompiler, ScopedCompiler};
use style_core::{ConfigHandle, Evaluation, EvaluationContext, StyleChunk, evaluate};
use style_offload::WorkerOffload;
use style_scheduler::{BatchScheduler, InsertFn};
use style_sink::{MAX_SIZE, RuleSink};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// An off-thread evaluation that came back to the main thread.
struct Completion {
    class_name: String,
    sequence: u64,
    chunks: Vec<StyleChunk>,
    context: EvaluationContext,
    evaluation: Evaluation,
}

struct AttachedOffload {
    worker: WorkerOffload,
    runtime: Handle,
}

/// Entry point wiring cache, evaluator, compiler, scheduler and sink.
///
/// Lives on the main thread. Off-thread results are queued and applied when
/// the host calls [`StylePipeline::process_completions`] or
/// [`StylePipeline::pump`].
pub struct StylePipeline {
    config: ConfigHandle,
    cache: StyleCache,
    scheduler: BatchScheduler,
    sink: Rc<RefCell<RuleSink>>,
    compiler: Box<dyn CssCompiler>,
    host: Box<dyn ClassListHost>,
    offload: Option<AttachedOffload>,
    sequencer: WriteSequencer,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
    in_flight: usize,
}

impl StylePipeline {
    /// Pipeline with the [`ScopedCompiler`], no class-list host and no
    /// offload.
    pub fn new(config: ConfigHandle) -> Self {
        let sink = Rc::new(RefCell::new(RuleSink::with_container_capacity(MAX_SIZE)));
        let scheduler = BatchScheduler::new(config.clone(), Some(sink_writer(&sink)));
        let (completions_tx, completions_rx) = unbounded_channel();
        Self {
            cache: StyleCache::new(config.clone()),
            config,
            scheduler,
            sink,
            compiler: Box::new(ScopedCompiler::new()),
            host: Box::new(NoopClassHost),
            offload: None,
            sequencer: WriteSequencer::default(),
            completions_tx,
            completions_rx,
            in_flight: 0,
        }
    }

    /// Replace the compiler.
    #[must_use]
    pub fn with_compiler(mut self, compiler: impl CssCompiler + 'static) -> Self {
        self.compiler = Box::new(compiler);
        self
    }

    /// Replace the class-list host.
    #[must_use]
    pub fn with_class_host(mut self, host: impl ClassListHost + 'static) -> Self {
        self.host = Box::new(host);
        self
    }

    /// Evaluate large trees on `worker`, driving requests on `runtime`.
    #[must_use]
    pub fn with_offload(mut self, worker: WorkerOffload, runtime: Handle) -> Self {
        self.offload = Some(AttachedOffload { worker, runtime });
        self
    }

    /// Use a different per-container capacity for the rule sink. Only
    /// meaningful before the first write.
    #[must_use]
    pub fn with_container_capacity(self, capacity: usize) -> Self {
        *self.sink.borrow_mut() = RuleSink::with_container_capacity(capacity);
        self
    }

    /// Compute and schedule the rule for `class_name`.
    ///
    /// Returns the utility classes known right now. When the tree is handed to
    /// the worker this is empty; the classes reach the host through
    /// [`ClassListHost`] once the result is processed.
    ///
    /// # Errors
    /// Returns evaluation and compilation errors of the synchronous path.
    pub fn inject_style(
        &mut self,
        class_name: &str,
        chunks: &[StyleChunk],
        context: &EvaluationContext,
    ) -> Result<Vec<String>> {
        let sequence = self.sequencer.issue();

        if let Some(entry) = self.cache.get(chunks, context, Some(class_name)) {
            self.commit(class_name, sequence, &entry.css);
            return Ok(entry.utility_classes);
        }

        if let Some(offload) = &self.offload
            && offload.worker.qualifies(chunks)
        {
            let worker = offload.worker.clone();
            let completions = self.completions_tx.clone();
            let mut completion = Completion {
                class_name: class_name.to_owned(),
                sequence,
                chunks: chunks.to_vec(),
                context: context.clone(),
                evaluation: Evaluation::default(),
            };
            debug!("offloading style evaluation for {class_name} (#{sequence})");
            self.sequencer.defer(class_name);
            drop(offload.runtime.spawn(async move {
                completion.evaluation = worker
                    .calculate_off_thread(&completion.chunks, &completion.context)
                    .await;
                if completions.send(completion).is_err() {
                    debug!("style pipeline dropped before an offload finished");
                }
            }));
            self.in_flight += 1;
            return Ok(Vec::new());
        }

        self.compute(class_name, sequence, chunks, context)
    }

    /// Remove the rule for `class_name` along with any pending or in-flight
    /// write for it.
    pub fn remove_style(&mut self, class_name: &str) -> bool {
        self.sequencer.retire(class_name);
        let discarded = self.scheduler.discard(class_name);
        let removed = self.sink.borrow_mut().remove(class_name);
        removed || discarded
    }

    /// Apply every off-thread result that has arrived. Returns how many were
    /// processed.
    ///
    /// Empty results are evaluated on this thread instead.
    ///
    /// # Errors
    /// Returns the first evaluation or compilation error; later results stay
    /// queued for the next call.
    pub fn process_completions(&mut self) -> Result<usize> {
        let mut processed = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            processed += 1;
            self.apply_completion(completion)?;
        }
        Ok(processed)
    }

    /// Host timer hook: apply arrived results, then run a due flush. Returns
    /// the number of rules written.
    ///
    /// # Errors
    /// See [`Self::process_completions`].
    pub fn pump(&mut self, now: Instant) -> Result<usize> {
        self.process_completions()?;
        Ok(self.scheduler.tick(now))
    }

    /// Host animation-frame hook.
    pub fn on_animation_frame(&mut self, now: Instant) {
        self.scheduler.on_animation_frame(now);
    }

    /// Write every pending rule now.
    pub fn flush_sync(&mut self) -> usize {
        self.scheduler.flush_sync()
    }

    /// When the host should next call [`Self::pump`].
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Rule writes waiting for a flush.
    pub fn pending_writes(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// Off-thread evaluations not yet processed.
    #[inline]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cached computation.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// The rule sink.
    pub fn sink(&self) -> Ref<'_, RuleSink> {
        self.sink.borrow()
    }

    /// Shared configuration.
    #[inline]
    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    fn apply_completion(&mut self, completion: Completion) -> Result<()> {
        let Completion {
            class_name,
            sequence,
            chunks,
            context,
            evaluation,
        } = completion;
        if !self.sequencer.land(&class_name, sequence) {
            debug!("dropping stale offload result for {class_name} (#{sequence})");
            return Ok(());
        }

        let utility_classes = if evaluation.is_empty() {
            debug!("offload for {class_name} came back empty; evaluating here");
            self.compute(&class_name, sequence, &chunks, &context)?
        } else {
            self.finish(&class_name, sequence, &chunks, &context, evaluation)?
        };
        if !utility_classes.is_empty() {
            self.host
                .append_utility_classes(&class_name, &utility_classes);
        }
        Ok(())
    }

    fn compute(
        &mut self,
        class_name: &str,
        sequence: u64,
        chunks: &[StyleChunk],
        context: &EvaluationContext,
    ) -> Result<Vec<String>> {
        let evaluation = evaluate(chunks, context)?;
        self.finish(class_name, sequence, chunks, context, evaluation)
    }

    fn finish(
        &mut self,
        class_name: &str,
        sequence: u64,
        chunks: &[StyleChunk],
        context: &EvaluationContext,
        evaluation: Evaluation,
    ) -> Result<Vec<String>> {
        let css = self
            .compiler
            .compile(&format!(".{class_name}"), &evaluation.css_text())?;
        self.commit(class_name, sequence, &css);
        self.cache.set(
            chunks,
            context,
            &css,
            &evaluation.utility_classes,
            Some(class_name),
        );
        Ok(evaluation.utility_classes)
    }

    fn commit(&mut self, class_name: &str, sequence: u64, css: &str) {
        if self.sequencer.accept(class_name, sequence) {
            self.scheduler.schedule_update(class_name, css, 0);
        } else {
            debug!("dropping stale write for {class_name} (#{sequence})");
        }
    }
}

fn sink_writer(sink: &Rc<RefCell<RuleSink>>) -> InsertFn {
    let sink = Rc::clone(sink);
    Box::new(move |class_name: &str, css: &str| {
        sink.borrow_mut().write(class_name, css);
    })
}
