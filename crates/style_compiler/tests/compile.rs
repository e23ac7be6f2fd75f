use style_compiler::{
    CssCompiler, Declaration, PluginRegistry, RuleNode, ScopedCompiler, StylePlugin,
};

fn compile(selector: &str, body: &str) -> String {
    ScopedCompiler::new()
        .compile(selector, body)
        .unwrap_or_else(|error| unreachable!("compile failed: {error:#}"))
}

#[test]
fn declarations_are_scoped_and_minified() {
    assert_eq!(
        compile(".c", "\n  color : red;\n  margin: 0   auto !important;\n"),
        ".c{color:red;margin:0 auto!important}"
    );
}

#[test]
fn nesting_is_flattened() {
    let css = compile(
        ".c",
        "padding: 4px; &:hover, &.active { color: blue; .icon { fill: blue } } span { margin: 0 }",
    );
    assert_eq!(
        css,
        ".c{padding:4px}.c:hover,.c.active{color:blue}.c:hover .icon,.c.active .icon{fill:blue}.c span{margin:0}"
    );
}

#[test]
fn conditional_groups_wrap_scoped_rules() {
    let css = compile(
        ".c",
        "@supports (display: grid) { display: grid; &:hover { gap: 1px } } @media print { }",
    );
    assert_eq!(
        css,
        "@supports (display: grid){.c{display:grid}.c:hover{gap:1px}}"
    );
}

#[test]
fn keyframes_pass_through_after_scoped_rules() {
    let css = compile(
        ".c",
        "@keyframes spin { from { opacity: 0 } to { opacity: 1 } } animation: spin 1s;",
    );
    assert_eq!(
        css,
        ".c{animation:spin 1s}@keyframes spin{from{opacity: 0}to{opacity: 1}}"
    );
}

#[test]
fn table_properties_get_webkit_copies() {
    assert_eq!(
        compile(".c", "user-select: none; color: red"),
        ".c{-webkit-user-select:none;user-select:none;color:red}"
    );
}

#[test]
fn invalid_bodies_and_selectors_are_errors() {
    let compiler = ScopedCompiler::new();
    assert!(compiler.compile(".c", "color red;").is_err());
    assert!(compiler.compile("  ", "color: red").is_err());
}

#[test]
fn closures_are_compilers() {
    let upper = |selector: &str, body: &str| -> anyhow::Result<String> {
        Ok(format!("{selector}{{{}}}", body.to_uppercase()))
    };
    assert_eq!(upper.compile(".x", "a:b").ok(), Some(".x{A:B}".to_owned()));
}

struct AddOutline;

impl StylePlugin for AddOutline {
    fn name(&self) -> &str {
        "outline"
    }

    fn before_build(&self, rules: &mut Vec<RuleNode>) {
        for rule in rules.iter_mut() {
            if let RuleNode::Style { declarations, .. } = rule {
                declarations.push(Declaration {
                    name: "outline".to_owned(),
                    value: "none".to_owned(),
                    important: false,
                });
            }
        }
    }
}

struct Marker(&'static str);

impl StylePlugin for Marker {
    fn name(&self) -> &str {
        self.0
    }

    fn after_build(&self, css: String) -> String {
        format!("{css}/*{}*/", self.0)
    }
}

#[test]
fn plugins_run_in_registration_order() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut plugins = PluginRegistry::new();
    plugins.register(AddOutline);
    plugins.register(Marker("first"));
    plugins.register(Marker("second"));
    let compiler = ScopedCompiler::with_plugins(plugins);

    assert_eq!(
        compiler.plugins().names().collect::<Vec<_>>(),
        vec!["outline", "first", "second"]
    );
    assert_eq!(
        compiler.compile(".c", "color: red").ok(),
        Some(".c{color:red;outline:none}/*first*//*second*/".to_owned())
    );
}
