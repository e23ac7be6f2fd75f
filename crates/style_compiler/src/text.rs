//! Whitespace and list helpers shared by the parser and the emitter.

/// Drop comments and collapse whitespace runs to one space, leaving quoted
/// strings untouched.
///
/// With `tight`, spaces next to `{`, `}`, `;` and `,` are removed entirely.
pub fn minify(raw: &str, tight: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut quote: Option<char> = None;
    let mut pending_space = false;

    while let Some(current) = chars.next() {
        if let Some(open) = quote {
            out.push(current);
            if current == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if current == open {
                quote = None;
            }
            continue;
        }
        if current == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut previous = '\0';
            for inner in chars.by_ref() {
                if previous == '*' && inner == '/' {
                    break;
                }
                previous = inner;
            }
            pending_space = true;
            continue;
        }
        if current.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let glued = tight && (is_tight_punct(current) || out.ends_with(is_tight_punct));
            if !out.is_empty() && !glued {
                out.push(' ');
            }
            pending_space = false;
        }
        if current == '"' || current == '\'' {
            quote = Some(current);
        }
        out.push(current);
    }
    out
}

fn is_tight_punct(current: char) -> bool {
    matches!(current, '{' | '}' | ';' | ',')
}

/// Split on commas that are not nested in parentheses, brackets or strings.
/// Empty parts are dropped.
pub fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (index, current) in text.char_indices() {
        match quote {
            Some(open) if current == open => quote = None,
            Some(_) => {}
            None => match current {
                '"' | '\'' => quote = Some(current),
                '(' | '[' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    parts.push(text[start..index].trim());
                    start = index + 1;
                }
                _ => {}
            },
        }
    }
    parts.push(text[start..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minify_keeps_strings_and_drops_comments() {
        assert_eq!(minify("  a   /* note */  b  ", false), "a b");
        assert_eq!(minify("content: 'a   b'", false), "content: 'a   b'");
        assert_eq!(minify("from { opacity: 0 ; }", true), "from{opacity: 0;}");
        assert_eq!(minify("rgba(0, 0, 0)", true), "rgba(0,0,0)");
    }

    #[test]
    fn split_respects_nesting() {
        assert_eq!(
            split_top_level("a, :is(b, c) ,[data-x=\"1,2\"]"),
            vec!["a", ":is(b, c)", "[data-x=\"1,2\"]"]
        );
        assert!(split_top_level(" , ").is_empty());
    }
}
