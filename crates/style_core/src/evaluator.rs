//! Expression evaluator.
//!
//! Flattens a chunk tree into CSS text fragments plus the side list of utility
//! classes. Pure and order-preserving; the worker thread runs this exact
//! function, so main-thread and off-thread results never drift apart.

use crate::chunk::StyleChunk;
use crate::context::EvaluationContext;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Maximum depth of functions returning functions (or nested lists).
pub const MAX_NESTING: usize = 256;

/// Result of evaluating a chunk tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// CSS text fragments in template order.
    pub fragments: Vec<String>,
    /// Utility class names collected from utility markers.
    pub utility_classes: Vec<String>,
}

impl Evaluation {
    /// True when neither fragments nor utility classes were produced.
    ///
    /// The offload path uses an empty evaluation to mean "compute it here".
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty() && self.utility_classes.is_empty()
    }

    /// Fragments concatenated into the raw CSS body.
    pub fn css_text(&self) -> String {
        self.fragments.concat()
    }
}

/// Evaluate `chunks` against `context`.
///
/// # Errors
/// Returns the first error raised by a function chunk, or an error when
/// nesting exceeds [`MAX_NESTING`]. The evaluation is abandoned; nothing is
/// retried.
pub fn evaluate(chunks: &[StyleChunk], context: &EvaluationContext) -> Result<Evaluation> {
    let mut out = Evaluation::default();
    for chunk in chunks {
        flatten(chunk, context, &mut out, 0)?;
    }
    Ok(out)
}

fn flatten(
    chunk: &StyleChunk,
    context: &EvaluationContext,
    out: &mut Evaluation,
    depth: usize,
) -> Result<()> {
    if depth > MAX_NESTING {
        bail!("style expression nesting exceeds {MAX_NESTING} levels");
    }
    match chunk {
        StyleChunk::Empty => {}
        StyleChunk::Literal(text) => {
            if !text.is_empty() {
                out.fragments.push(text.clone());
            }
        }
        StyleChunk::List(items) => {
            for item in items {
                flatten(item, context, out, depth + 1)?;
            }
        }
        StyleChunk::Function(func) => {
            let produced = func.call(context)?;
            flatten(&produced, context, out, depth + 1)?;
        }
        StyleChunk::Utility(classes) => {
            out.utility_classes.extend(classes.iter().cloned());
        }
        StyleChunk::Selector(class_name) => {
            out.fragments.push(format!(".{class_name}"));
        }
    }
    Ok(())
}
