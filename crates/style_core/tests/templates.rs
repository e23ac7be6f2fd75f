use serde_json::json;
use style_core::{
    ConfigHandle, EvaluationContext, StyleChunk, StyleConfig, evaluate, serialize_chunks, style_fn,
};

fn themed_button() -> Vec<StyleChunk> {
    let spacing = style_fn!(|ctx| match ctx.str_prop("size") {
        Some("lg") => "padding: 12px;",
        _ => "padding: 4px;",
    });
    vec![
        StyleChunk::from("display: inline-flex;"),
        StyleChunk::from(spacing),
        StyleChunk::from(style_fn!(|ctx| format!(
            "color: {};",
            ctx.theme_str("palette.fg").unwrap_or("inherit")
        ))),
        StyleChunk::Selector("css-icon".to_owned()),
        StyleChunk::from(" { margin-left: 2px; }"),
        StyleChunk::from(layout_utilities()),
    ]
}

fn layout_utilities() -> StyleChunk {
    StyleChunk::utility(["inline-flex", "items-center"])
}

#[test]
fn template_renders_against_props_and_theme() -> anyhow::Result<()> {
    let ctx = EvaluationContext::new()
        .with_prop("size", "lg")
        .with_theme(json!({ "palette": { "fg": "#111" } }));
    let evaluation = evaluate(&themed_button(), &ctx)?;

    assert_eq!(
        evaluation.css_text(),
        "display: inline-flex;padding: 12px;color: #111;.css-icon { margin-left: 2px; }"
    );
    assert_eq!(evaluation.utility_classes, vec!["inline-flex", "items-center"]);
    Ok(())
}

#[test]
fn serialized_templates_ignore_closure_identity() {
    assert_eq!(serialize_chunks(&themed_button()), serialize_chunks(&themed_button()));
}

#[test]
fn config_sources_agree() -> anyhow::Result<()> {
    let from_json = StyleConfig::from_json(r#"{ "cacheSize": 2, "enableAsync": true }"#)?;
    assert_eq!(from_json.cache_size, 2);
    assert!(from_json.enable_async);
    assert!(from_json.enable_cache, "missing keys keep defaults");

    let handle = ConfigHandle::new(from_json);
    let shared = handle.clone();
    let detached = handle.detached();
    shared.update(|config| config.batch_delay_ms = -5);
    assert_eq!(handle.get().batch_delay_ms, -5);
    assert!(handle.get().batch_delay().is_zero());
    assert_eq!(detached.get().batch_delay_ms, 16);

    handle.reset();
    assert_eq!(shared.get(), StyleConfig::default());
    Ok(())
}
