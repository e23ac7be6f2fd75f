//! Build hooks around the compiler.

use crate::rules::RuleNode;
use core::fmt;
use log::trace;

/// Hook into compilation.
///
/// `before_build` sees the flattened rules before they are serialized;
/// `after_build` may rewrite the serialized CSS.
pub trait StylePlugin {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Inspect or rewrite the rule list.
    fn before_build(&self, _rules: &mut Vec<RuleNode>) {}

    /// Rewrite the final CSS text.
    fn after_build(&self, css: String) -> String {
        css
    }
}

/// Ordered set of plugins. Hooks run in registration order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn StylePlugin>>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.names()).finish()
    }
}

impl PluginRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin.
    pub fn register(&mut self, plugin: impl StylePlugin + 'static) {
        trace!("registered style plugin {}", plugin.name());
        self.plugins.push(Box::new(plugin));
    }

    /// Plugin names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|plugin| plugin.name())
    }

    /// Number of registered plugins.
    #[inline]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub(crate) fn run_before_build(&self, rules: &mut Vec<RuleNode>) {
        for plugin in &self.plugins {
            plugin.before_build(rules);
        }
    }

    pub(crate) fn run_after_build(&self, css: String) -> String {
        self.plugins
            .iter()
            .fold(css, |css, plugin| plugin.after_build(css))
    }
}
