//! Per-render evaluation context.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which the ambient theme lives inside the context.
const THEME_KEY: &str = "theme";

/// Props, theme and internal attributes handed to every [`crate::StyleFn`].
///
/// The pipeline never mutates a context. Two contexts are the same for caching
/// purposes when their serialized content is the same.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationContext {
    values: Map<String, Value>,
}

impl EvaluationContext {
    /// Empty context.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context wrapping an existing JSON object.
    #[inline]
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Builder-style prop insertion.
    #[must_use]
    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_prop(name, value);
        self
    }

    /// Builder-style theme replacement.
    #[must_use]
    pub fn with_theme(mut self, theme: Value) -> Self {
        self.values.insert(THEME_KEY.to_owned(), theme);
        self
    }

    /// Insert or replace a prop.
    pub fn set_prop(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Raw prop lookup.
    #[inline]
    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// String prop lookup.
    #[inline]
    pub fn str_prop(&self, name: &str) -> Option<&str> {
        self.prop(name).and_then(Value::as_str)
    }

    /// Boolean prop lookup; anything that is not `true` reads as `false`.
    #[inline]
    pub fn flag(&self, name: &str) -> bool {
        self.prop(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Look up a dotted path inside the theme, e.g. `"colors.primary"`.
    pub fn theme(&self, path: &str) -> Option<&Value> {
        let mut current = self.values.get(THEME_KEY)?;
        for segment in path.split('.').filter(|segment| !segment.is_empty()) {
            current = match current {
                Value::Object(object) => object.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                    return None;
                }
            };
        }
        Some(current)
    }

    /// String theme lookup.
    #[inline]
    pub fn theme_str(&self, path: &str) -> Option<&str> {
        self.theme(path).and_then(Value::as_str)
    }

    /// Underlying JSON object.
    #[inline]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Canonical serialized form. Object keys come out sorted, so equal
    /// content always produces equal text regardless of insertion order.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        write_object(&self.values, &mut out);
        out
    }
}

fn write_object(object: &Map<String, Value>, out: &mut String) {
    let mut entries: Vec<(&String, &Value)> = object.iter().collect();
    entries.sort_unstable_by(|left, right| left.0.cmp(right.0));
    out.push('{');
    for (index, (key, value)) in entries.into_iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        out.push_str(&Value::from(key.as_str()).to_string());
        out.push(':');
        write_canonical(value, out);
    }
    out.push('}');
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(object) => write_object(object, out),
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            out.push_str(&value.to_string());
        }
    }
}
