//! Content serialization of chunk trees for cache keys.

use crate::chunk::StyleChunk;
use serde_json::Value;

/// Strip every whitespace character from function source text.
pub fn normalize_source(source: &str) -> String {
    source.chars().filter(|ch| !ch.is_whitespace()).collect()
}

/// Serialize a chunk tree so structurally equal trees yield equal text.
///
/// Functions contribute their whitespace-normalized source; literals,
/// utility markers and selector markers are quoted so no two shapes collide.
pub fn serialize_chunks(chunks: &[StyleChunk]) -> String {
    let mut out = String::with_capacity(chunks.len() * 16);
    write_list(chunks, &mut out);
    out
}

fn write_list(chunks: &[StyleChunk], out: &mut String) {
    out.push('[');
    for (index, chunk) in chunks.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        write_chunk(chunk, out);
    }
    out.push(']');
}

fn write_chunk(chunk: &StyleChunk, out: &mut String) {
    match chunk {
        StyleChunk::Empty => out.push_str("null"),
        StyleChunk::Literal(text) => out.push_str(&quote(text)),
        StyleChunk::Function(func) => {
            out.push_str("fn:");
            out.push_str(&quote(&normalize_source(func.source())));
        }
        StyleChunk::List(items) => write_list(items, out),
        StyleChunk::Utility(classes) => {
            out.push_str("tw:");
            out.push_str(&Value::from(classes.clone()).to_string());
        }
        StyleChunk::Selector(class_name) => {
            out.push_str("sel:");
            out.push_str(&quote(class_name));
        }
    }
}

fn quote(text: &str) -> String {
    Value::from(text).to_string()
}
