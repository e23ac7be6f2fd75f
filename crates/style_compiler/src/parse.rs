//! Rule-body parsing on top of `cssparser`.
//!
//! A component body is a declaration list that may also contain nested style
//! rules and at-rules, so every level is parsed with a [`RuleBodyParser`] that
//! accepts all three.

use crate::text::minify;
use anyhow::{Result, anyhow};
use cssparser::{
    AtRuleParser, BasicParseErrorKind, CowRcStr, DeclarationParser, ParseError, Parser,
    ParserInput, ParserState, QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, Token,
};

/// At-rules whose body holds rules that must be scoped like the outer body.
const GROUPING_AT_RULES: &[&str] = &["media", "supports", "container", "layer"];

/// One item of a parsed rule body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BodyItem {
    /// `name: value [!important]`.
    Declaration {
        name: String,
        value: String,
        important: bool,
    },
    /// Nested style rule with its raw selector prelude.
    Nested {
        prelude: String,
        body: Vec<BodyItem>,
    },
    /// Conditional group (`@media`, `@supports`, ...) around more body items.
    Group {
        at_rule: String,
        body: Vec<BodyItem>,
    },
    /// At-rule emitted as written (`@keyframes`, `@font-face`, ...).
    Verbatim(String),
}

/// Parse a rule body.
///
/// # Errors
/// Fails on the first item that is neither a declaration nor a rule.
pub fn parse_body(css: &str) -> Result<Vec<BodyItem>> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    parse_items(&mut parser).map_err(|error| {
        anyhow!(
            "invalid style body at line {}, column {}: {:?}",
            error.location.line + 1,
            error.location.column,
            error.kind
        )
    })
}

fn parse_items<'i>(input: &mut Parser<'i, '_>) -> Result<Vec<BodyItem>, ParseError<'i, ()>> {
    let mut items = Vec::new();
    let mut body = BodyParser;
    for item in RuleBodyParser::new(input, &mut body) {
        match item {
            Ok(item) => items.push(item),
            Err((error, _)) => return Err(error),
        }
    }
    Ok(items)
}

/// Consume the rest of `input` and return it as raw text.
fn rest_of<'i>(input: &mut Parser<'i, '_>) -> &'i str {
    let start = input.position();
    while input.next_including_whitespace_and_comments().is_ok() {}
    input.slice_from(start)
}

#[derive(Debug)]
struct AtPrelude {
    name: String,
    prelude: String,
}

impl AtPrelude {
    fn header(&self) -> String {
        if self.prelude.is_empty() {
            format!("@{}", self.name)
        } else {
            format!("@{} {}", self.name, self.prelude)
        }
    }
}

struct BodyParser;

impl<'i> DeclarationParser<'i> for BodyParser {
    type Declaration = BodyItem;
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _declaration_start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let custom = name.starts_with("--");
        let start = input.position();
        let mut saw_block = false;
        // `!important` only counts as the last tokens of the value.
        let mut bang = None;
        let mut important_at = None;
        loop {
            let before = input.position();
            match input.next_including_whitespace_and_comments() {
                Ok(Token::WhiteSpace(_) | Token::Comment(_)) => {}
                Ok(Token::Delim('!')) => {
                    bang = Some(before);
                    important_at = None;
                }
                Ok(Token::Ident(ident))
                    if bang.is_some() && ident.eq_ignore_ascii_case("important") =>
                {
                    important_at = bang.take();
                }
                Ok(token) => {
                    if matches!(token, Token::CurlyBracketBlock) {
                        saw_block = true;
                    }
                    bang = None;
                    important_at = None;
                }
                Err(_) => break,
            }
        }
        // `div:hover { ... }` looks like a declaration until its block shows up.
        if saw_block && !custom {
            return Err(input.new_custom_error(()));
        }
        let important = important_at.is_some();
        let raw = match important_at {
            Some(bang_at) => input.slice(start..bang_at),
            None => input.slice_from(start),
        };
        let value = minify(raw.trim(), true);
        let name = if custom {
            String::from(&*name)
        } else {
            name.to_ascii_lowercase()
        };
        Ok(BodyItem::Declaration {
            name,
            value,
            important,
        })
    }
}

impl<'i> AtRuleParser<'i> for BodyParser {
    type Prelude = AtPrelude;
    type AtRule = BodyItem;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Ok(AtPrelude {
            name: name.to_ascii_lowercase(),
            prelude: minify(rest_of(input), false),
        })
    }

    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        Ok(BodyItem::Verbatim(format!("{};", prelude.header())))
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        if GROUPING_AT_RULES.contains(&prelude.name.as_str()) {
            let body = parse_items(input)?;
            return Ok(BodyItem::Group {
                at_rule: prelude.header(),
                body,
            });
        }
        let block = minify(rest_of(input), true);
        Ok(BodyItem::Verbatim(format!("{}{{{block}}}", prelude.header())))
    }
}

impl<'i> QualifiedRuleParser<'i> for BodyParser {
    type Prelude = String;
    type QualifiedRule = BodyItem;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let prelude = minify(rest_of(input), false);
        if prelude.is_empty() {
            return Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid));
        }
        Ok(prelude)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        Ok(BodyItem::Nested {
            prelude,
            body: parse_items(input)?,
        })
    }
}

impl<'i> RuleBodyItemParser<'i, BodyItem, ()> for BodyParser {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        true
    }
}
