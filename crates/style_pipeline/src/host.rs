/// Access to the host's element class lists.
///
/// Called when utility classes arrive after [`crate::StylePipeline::inject_style`]
/// already returned, so the host must find the elements carrying `class_name`
/// itself.
pub trait ClassListHost {
    /// Append `utility_classes` to every element whose class list contains
    /// `class_name`.
    fn append_utility_classes(&mut self, class_name: &str, utility_classes: &[String]);
}

/// Host without elements; late utility classes are dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopClassHost;

impl ClassListHost for NoopClassHost {
    fn append_utility_classes(&mut self, _class_name: &str, _utility_classes: &[String]) {}
}
