//! CSS compilation for generated class names.
//!
//! [`CssCompiler`] is the seam the pipeline compiles through. The default
//! [`ScopedCompiler`] takes a component's raw style body (declarations plus
//! nested rules and at-rules), scopes it to the generated selector, flattens
//! nesting and emits minified CSS:
//!
//! ```
//! use style_compiler::{CssCompiler, ScopedCompiler};
//!
//! let css = ScopedCompiler::new().compile(
//!     ".css-1",
//!     "color: red; &:hover { color: blue } @media (max-width: 600px) { padding: 0 }",
//! )?;
//! assert_eq!(
//!     css,
//!     ".css-1{color:red}.css-1:hover{color:blue}@media (max-width: 600px){.css-1{padding:0}}"
//! );
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! It is deliberately small: values are passed through untouched apart from
//! whitespace, and only a fixed property table is vendor-prefixed.

mod parse;
mod plugin;
mod rules;
mod text;

use anyhow::{Result, bail};

pub use plugin::{PluginRegistry, StylePlugin};
pub use rules::{Declaration, RuleNode, WEBKIT_PREFIXED, emit, resolve_selectors};

/// Turns a selector and a raw style body into final CSS.
pub trait CssCompiler {
    /// Compile `raw_css` scoped to `selector`.
    ///
    /// # Errors
    /// Returns an error when the body cannot be compiled. Callers abandon the
    /// write for that class.
    fn compile(&self, selector: &str, raw_css: &str) -> Result<String>;
}

impl<F> CssCompiler for F
where
    F: Fn(&str, &str) -> Result<String>,
{
    fn compile(&self, selector: &str, raw_css: &str) -> Result<String> {
        self(selector, raw_css)
    }
}

/// Default compiler: selector scoping, nesting, prefixing, minification.
#[derive(Debug, Default)]
pub struct ScopedCompiler {
    plugins: PluginRegistry,
}

impl ScopedCompiler {
    /// Compiler without plugins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiler running `plugins` around every build.
    pub fn with_plugins(plugins: PluginRegistry) -> Self {
        Self { plugins }
    }

    /// Registered plugins.
    #[inline]
    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Mutable access for registering more plugins.
    #[inline]
    pub fn plugins_mut(&mut self) -> &mut PluginRegistry {
        &mut self.plugins
    }

    /// Parse and flatten without serializing.
    ///
    /// # Errors
    /// Returns an error for an empty selector or an unparsable body.
    pub fn build(&self, selector: &str, raw_css: &str) -> Result<Vec<RuleNode>> {
        let selector = selector.trim();
        if selector.is_empty() {
            bail!("cannot scope styles to an empty selector");
        }
        let items = parse::parse_body(raw_css)?;
        Ok(rules::build_rules(items, selector))
    }
}

impl CssCompiler for ScopedCompiler {
    fn compile(&self, selector: &str, raw_css: &str) -> Result<String> {
        let mut rules = self.build(selector, raw_css)?;
        self.plugins.run_before_build(&mut rules);
        let css = emit(&rules);
        Ok(self.plugins.run_after_build(css))
    }
}
