//! Flat rule representation handed to plugins, and its serializer.

use crate::parse::BodyItem;
use crate::text::split_top_level;

/// Properties that also get a `-webkit-` prefixed copy.
pub const WEBKIT_PREFIXED: &[&str] = &[
    "appearance",
    "backdrop-filter",
    "box-decoration-break",
    "hyphens",
    "mask",
    "mask-image",
    "text-size-adjust",
    "user-select",
];

/// A single declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Property name, lowercased unless it is a custom property.
    pub name: String,
    /// Minified value without `!important`.
    pub value: String,
    /// Whether the declaration was marked `!important`.
    pub important: bool,
}

/// One output rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleNode {
    /// Scoped style rule.
    Style {
        /// Fully resolved selector list.
        selectors: Vec<String>,
        /// Declarations in source order.
        declarations: Vec<Declaration>,
    },
    /// Conditional group such as `@media (...)` around scoped rules.
    Group {
        /// At-rule header, e.g. `@media (max-width: 600px)`.
        at_rule: String,
        /// Rules inside the group.
        rules: Vec<RuleNode>,
    },
    /// Rule emitted as-is.
    Verbatim(String),
}

/// Resolve a nested selector prelude against its parent selectors.
///
/// `&` stands for the parent; a part without `&` becomes a descendant of it.
pub fn resolve_selectors(parents: &[String], prelude: &str) -> Vec<String> {
    let parts = split_top_level(prelude);
    let mut resolved = Vec::with_capacity(parents.len() * parts.len());
    for parent in parents {
        for part in &parts {
            if part.contains('&') {
                resolved.push(part.replace('&', parent));
            } else {
                resolved.push(format!("{parent} {part}"));
            }
        }
    }
    resolved
}

/// Flatten a parsed body scoped to `selector`.
///
/// Declarations of a level come first, then its nested rules in source order.
/// Verbatim at-rules are hoisted after everything else.
pub fn build_rules(items: Vec<BodyItem>, selector: &str) -> Vec<RuleNode> {
    let scope = split_top_level(selector)
        .into_iter()
        .map(str::to_owned)
        .collect::<Vec<_>>();
    let mut out = Vec::new();
    let mut hoisted = Vec::new();
    flatten(items, &scope, &mut out, &mut hoisted);
    out.append(&mut hoisted);
    out
}

fn flatten(
    items: Vec<BodyItem>,
    selectors: &[String],
    out: &mut Vec<RuleNode>,
    hoisted: &mut Vec<RuleNode>,
) {
    let mut declarations = Vec::new();
    let mut nested = Vec::new();
    for item in items {
        match item {
            BodyItem::Declaration {
                name,
                value,
                important,
            } => {
                if !value.is_empty() || name.starts_with("--") {
                    declarations.push(Declaration {
                        name,
                        value,
                        important,
                    });
                }
            }
            other => nested.push(other),
        }
    }
    if !declarations.is_empty() {
        out.push(RuleNode::Style {
            selectors: selectors.to_vec(),
            declarations,
        });
    }

    for item in nested {
        match item {
            BodyItem::Nested { prelude, body } => {
                let children = resolve_selectors(selectors, &prelude);
                flatten(body, &children, out, hoisted);
            }
            BodyItem::Group { at_rule, body } => {
                let mut rules = Vec::new();
                flatten(body, selectors, &mut rules, hoisted);
                if !rules.is_empty() {
                    out.push(RuleNode::Group { at_rule, rules });
                }
            }
            BodyItem::Verbatim(text) => hoisted.push(RuleNode::Verbatim(text)),
            BodyItem::Declaration { .. } => {}
        }
    }
}

/// Serialize rules into minified CSS.
pub fn emit(rules: &[RuleNode]) -> String {
    let mut css = String::new();
    for rule in rules {
        emit_rule(rule, &mut css);
    }
    css
}

fn emit_rule(rule: &RuleNode, css: &mut String) {
    match rule {
        RuleNode::Style {
            selectors,
            declarations,
        } => {
            if selectors.is_empty() || declarations.is_empty() {
                return;
            }
            css.push_str(&selectors.join(","));
            css.push('{');
            let mut first = true;
            for declaration in declarations {
                if WEBKIT_PREFIXED.contains(&declaration.name.as_str()) {
                    push_declaration(css, "-webkit-", declaration, &mut first);
                }
                push_declaration(css, "", declaration, &mut first);
            }
            css.push('}');
        }
        RuleNode::Group { at_rule, rules } => {
            let body = emit(rules);
            if !body.is_empty() {
                css.push_str(at_rule);
                css.push('{');
                css.push_str(&body);
                css.push('}');
            }
        }
        RuleNode::Verbatim(text) => css.push_str(text),
    }
}

fn push_declaration(css: &mut String, prefix: &str, declaration: &Declaration, first: &mut bool) {
    if !*first {
        css.push(';');
    }
    *first = false;
    css.push_str(prefix);
    css.push_str(&declaration.name);
    css.push(':');
    css.push_str(&declaration.value);
    if declaration.important {
        css.push_str("!important");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| (*item).to_owned()).collect()
    }

    #[test]
    fn ampersand_and_descendant_resolution() {
        let parents = owned(&[".a", ".b"]);
        assert_eq!(
            resolve_selectors(&parents, "&:hover, span"),
            owned(&[".a:hover", ".a span", ".b:hover", ".b span"])
        );
        assert_eq!(
            resolve_selectors(&owned(&[".a"]), ".dark &"),
            owned(&[".dark .a"])
        );
    }

    #[test]
    fn empty_rules_are_not_emitted() {
        let rules = vec![
            RuleNode::Style {
                selectors: owned(&[".a"]),
                declarations: Vec::new(),
            },
            RuleNode::Group {
                at_rule: "@media print".to_owned(),
                rules: Vec::new(),
            },
        ];
        assert_eq!(emit(&rules), "");
    }
}
