use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

/// Render user copy written in Markdown. Raw HTML in the source is escaped,
/// never passed through, and link or image targets with a scheme other than
/// http, https or mailto are dropped.
pub fn render_rich_text(source: &str) -> String {
    if source.trim().is_empty() {
        return String::new();
    }

    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let events = Parser::new_ext(source, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_target(dest_url, "#"),
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
            dest_url: safe_target(dest_url, ""),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::new();
    html::push_html(&mut out, events);
    out
}

fn safe_target<'a>(url: CowStr<'a>, replacement: &'static str) -> CowStr<'a> {
    if is_safe_url(&url) {
        url
    } else {
        tracing::debug!(url = %url, "dropping unsafe link target");
        CowStr::Borrowed(replacement)
    }
}

/// Relative URLs and fragments are fine; absolute ones need an allowed scheme.
fn is_safe_url(url: &str) -> bool {
    // Browsers ignore whitespace and control characters inside a scheme.
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    let scheme_end = cleaned.find(|c| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(pos) if cleaned[pos..].starts_with(':') => {
            let scheme = cleaned[..pos].to_ascii_lowercase();
            matches!(scheme.as_str(), "http" | "https" | "mailto")
        }
        _ => true,
    }
}
