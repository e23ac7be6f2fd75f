//! Style expression chunks.
//!
//! A style template is an ordered list of [`StyleChunk`]s. Literal CSS text,
//! functions of the render context, nested lists, utility-class markers and
//! nested-component selectors are all variants of the same enum so the
//! evaluator can match on them exhaustively.

use crate::context::EvaluationContext;
use anyhow::Result;
use core::fmt;
use std::sync::Arc;

type StyleFnBody = dyn Fn(&EvaluationContext) -> Result<StyleChunk> + Send + Sync;

/// A context-dependent chunk producer.
///
/// The source text is kept next to the closure: it is what the cache key is
/// built from, so two closures with the same source are considered the same
/// producer.
#[derive(Clone)]
pub struct StyleFn {
    source: Arc<str>,
    body: Arc<StyleFnBody>,
}

impl StyleFn {
    /// Wrap a closure together with the text that identifies it.
    pub fn new<F>(source: impl Into<Arc<str>>, body: F) -> Self
    where
        F: Fn(&EvaluationContext) -> Result<StyleChunk> + Send + Sync + 'static,
    {
        Self {
            source: source.into(),
            body: Arc::new(body),
        }
    }

    /// Source text used for cache keys.
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Invoke the producer.
    ///
    /// # Errors
    /// Returns whatever error the wrapped closure returns.
    #[inline]
    pub fn call(&self, context: &EvaluationContext) -> Result<StyleChunk> {
        (self.body)(context)
    }
}

impl fmt::Debug for StyleFn {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("StyleFn")
            .field(&self.source)
            .finish()
    }
}

/// One unit of a style template.
#[derive(Clone, Debug, Default)]
pub enum StyleChunk {
    /// Elided chunk (`null`, `false`, absent value).
    #[default]
    Empty,
    /// Raw CSS text. An empty literal is elided like [`StyleChunk::Empty`].
    Literal(String),
    /// Producer evaluated against the render context.
    Function(StyleFn),
    /// Nested chunk list, evaluated in order.
    List(Vec<StyleChunk>),
    /// Utility classes appended to the element instead of CSS text.
    Utility(Vec<String>),
    /// Another component's generated class name, rendered as its selector.
    Selector(String),
}

impl StyleChunk {
    /// Utility-class marker from any list of class names.
    pub fn utility<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Utility(classes.into_iter().map(Into::into).collect())
    }

    /// Nested-component selector marker.
    pub fn selector(class_name: impl Into<String>) -> Self {
        Self::Selector(class_name.into())
    }

    /// Whether the evaluator skips this chunk outright.
    #[inline]
    pub fn is_elided(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Literal(text) => text.is_empty(),
            Self::Function(_) | Self::List(_) | Self::Utility(_) | Self::Selector(_) => false,
        }
    }
}

impl From<&str> for StyleChunk {
    fn from(text: &str) -> Self {
        Self::Literal(text.to_owned())
    }
}

impl From<String> for StyleChunk {
    fn from(text: String) -> Self {
        Self::Literal(text)
    }
}

impl From<&String> for StyleChunk {
    fn from(text: &String) -> Self {
        Self::Literal(text.clone())
    }
}

impl From<StyleFn> for StyleChunk {
    fn from(func: StyleFn) -> Self {
        Self::Function(func)
    }
}

impl From<Vec<Self>> for StyleChunk {
    fn from(chunks: Vec<Self>) -> Self {
        Self::List(chunks)
    }
}

impl<T: Into<Self>> From<Option<T>> for StyleChunk {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

macro_rules! numeric_chunk {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for StyleChunk {
                fn from(value: $ty) -> Self {
                    Self::Literal(value.to_string())
                }
            }
        )*
    };
}

numeric_chunk!(i32, i64, u32, u64, usize, f32, f64);

/// Build a [`StyleFn`] from an infallible closure, using the closure's own
/// tokens as its source text.
///
/// The body may evaluate to anything convertible into a [`StyleChunk`].
#[macro_export]
macro_rules! style_fn {
    (|$ctx:ident| $body:expr) => {
        $crate::StyleFn::new(
            stringify!(|$ctx| $body),
            move |$ctx: &$crate::EvaluationContext| -> $crate::Result<$crate::StyleChunk> {
                ::core::result::Result::Ok($crate::StyleChunk::from($body))
            },
        )
    };
}

/// Like [`style_fn!`], for bodies that evaluate to a `Result`.
#[macro_export]
macro_rules! try_style_fn {
    (|$ctx:ident| $body:expr) => {
        $crate::StyleFn::new(
            stringify!(|$ctx| $body),
            move |$ctx: &$crate::EvaluationContext| -> $crate::Result<$crate::StyleChunk> {
                $body.map($crate::StyleChunk::from)
            },
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_literal_is_elided() {
        assert!(StyleChunk::from("").is_elided());
        assert!(StyleChunk::Empty.is_elided());
        assert!(StyleChunk::from(None::<&str>).is_elided());
        assert!(!StyleChunk::from("color: red;").is_elided());
        assert!(!StyleChunk::utility(Vec::<String>::new()).is_elided());
    }

    #[test]
    fn macro_keeps_source_text() {
        let func = crate::style_fn!(|ctx| ctx.str_prop("size").unwrap_or("1rem").to_owned());
        assert!(func.source().contains("size"), "source was {}", func.source());
        assert!(format!("{func:?}").starts_with("StyleFn"));
    }
}
