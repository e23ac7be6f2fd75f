//! Style injection pipeline.
//!
//! [`StylePipeline::inject_style`] turns a chunk tree and a render context into
//! a rule for a generated class name:
//!
//! 1. the [`StyleCache`](style_cache::StyleCache) is consulted with a
//!    content-addressed key;
//! 2. on a miss the tree is evaluated, on this thread or on the background
//!    worker for large trees;
//! 3. the raw body is compiled for `.class_name`;
//! 4. the write is handed to the batch scheduler, which commits it to the
//!    [`RuleSink`](style_sink::RuleSink) on the host's cadence;
//! 5. the result is cached.
//!
//! Writes for one class follow a latest-request-wins policy: a result computed
//! for an older request is dropped once a newer one has been written.
//!
//! ```
//! use style_core::{ConfigHandle, EvaluationContext, StyleChunk, StyleConfig, style_fn};
//! use style_pipeline::StylePipeline;
//!
//! let config = ConfigHandle::new(StyleConfig {
//!     enable_batch_updates: false,
//!     ..StyleConfig::default()
//! });
//! let mut pipeline = StylePipeline::new(config);
//! let chunks = vec![
//!     StyleChunk::from("color: "),
//!     StyleChunk::from(style_fn!(|ctx| ctx.str_prop("tone").unwrap_or("black").to_owned())),
//!     StyleChunk::utility(["rounded"]),
//! ];
//! let ctx = EvaluationContext::new().with_prop("tone", "teal");
//!
//! let utility = pipeline.inject_style("css-1", &chunks, &ctx)?;
//! assert_eq!(utility, vec!["rounded".to_owned()]);
//! assert_eq!(pipeline.sink().rule("css-1"), Some(".css-1{color:teal}"));
//! # Ok::<(), anyhow::Error>(())
//! ```

mod host;
mod pipeline;
mod sequence;

pub use host::{ClassListHost, NoopClassHost};
pub use pipeline::StylePipeline;
pub use sequence::WriteSequencer;
pub use style_cache::CacheStats;
