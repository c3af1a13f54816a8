//! Compiled-in HTML templates and Markdown rendering for narration.

use std::sync::LazyLock;

use axum::response::Html;
use lore_core::error::DomainError;
use minijinja::{Environment, Value};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag};

const TEMPLATES: [(&str, &str); 12] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("home.html", include_str!("../../templates/home.html")),
    ("scenario.html", include_str!("../../templates/scenario.html")),
    ("adventure.html", include_str!("../../templates/adventure.html")),
    ("event.html", include_str!("../../templates/event.html")),
    ("scene.html", include_str!("../../templates/scene.html")),
    ("history.html", include_str!("../../templates/history.html")),
    ("turn.html", include_str!("../../templates/turn.html")),
    ("undo.html", include_str!("../../templates/undo.html")),
    ("settings.html", include_str!("../../templates/settings.html")),
    ("settings_form.html", include_str!("../../templates/settings_form.html")),
    ("error.html", include_str!("../../templates/error.html")),
];

static ENVIRONMENT: LazyLock<Result<Environment<'static>, minijinja::Error>> =
    LazyLock::new(build_template_environment);

fn build_template_environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_filter("markdown", |text: &str| {
        Value::from_safe_string(render_markdown(text))
    });
    for (name, source) in TEMPLATES {
        env.add_template(name, source)?;
    }
    Ok(env)
}

const SAFE_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Keeps relative URLs and `http`, `https` and `mailto` ones; anything else
/// becomes `#`. Browsers ignore tabs and newlines inside a scheme, so those
/// are dropped before looking for it.
fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let compact: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    let scheme = compact
        .split_once(':')
        .map(|(head, _)| head)
        .filter(|head| !head.contains(['/', '?', '#']));
    match scheme {
        Some(scheme) if !SAFE_SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) => {
            CowStr::Borrowed("#")
        }
        _ => url,
    }
}

/// Renders Markdown to HTML. Raw HTML in the input is emitted as escaped
/// text and link or image URLs with unsafe schemes are replaced by `#`.
#[must_use]
pub fn render_markdown(text: &str) -> String {
    let parser = Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    html
}

/// Renders the named template with `ctx`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the templates failed to compile
/// or rendering fails.
pub fn render(name: &str, ctx: &Value) -> Result<Html<String>, DomainError> {
    let env = ENVIRONMENT
        .as_ref()
        .map_err(|e| DomainError::Infrastructure(format!("failed to compile templates: {e}")))?;
    let template = env.get_template(name).map_err(|e| {
        DomainError::Infrastructure(format!("failed to load template '{name}': {e}"))
    })?;
    template.render(ctx).map(Html).map_err(|e| {
        DomainError::Infrastructure(format!("failed to render template '{name}': {e}"))
    })
}
