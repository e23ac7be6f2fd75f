//! Leaf layer of the style injection pipeline.
//!
//! This crate holds everything the other pipeline crates share:
//! - [`StyleChunk`] and [`StyleFn`], the building blocks of a style template
//! - [`EvaluationContext`], the per-render props + theme record
//! - [`evaluate`], the single evaluator used on the main thread and the worker
//! - [`StyleConfig`] / [`ConfigHandle`], the pipeline-wide settings record
//!
//! # Example
//!
//! ```
//! use style_core::{EvaluationContext, StyleChunk, evaluate, style_fn};
//!
//! let chunks = vec![
//!     StyleChunk::from("color: "),
//!     StyleChunk::from(style_fn!(|ctx| ctx.str_prop("tone").unwrap_or("black").to_owned())),
//!     StyleChunk::from(";"),
//! ];
//! let ctx = EvaluationContext::new().with_prop("tone", "teal");
//! let evaluation = evaluate(&chunks, &ctx)?;
//! assert_eq!(evaluation.css_text(), "color: teal;");
//! # Ok::<(), anyhow::Error>(())
//! ```

mod chunk;
mod config;
mod context;
mod evaluator;
mod serialize;

pub use anyhow::Result;
pub use chunk::{StyleChunk, StyleFn};
pub use config::{ConfigHandle, StyleConfig};
pub use context::EvaluationContext;
pub use evaluator::{Evaluation, MAX_NESTING, evaluate};
pub use serialize::{normalize_source, serialize_chunks};
