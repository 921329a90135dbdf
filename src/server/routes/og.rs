use axum::{
    extract::Query,
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::IntoResponse,
};
use serde::Deserialize;

pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 630;
pub const MAX_TITLE_CHARS: usize = 80;
pub const MAX_SUBTITLE_CHARS: usize = 120;
pub const DEFAULT_TITLE: &str = "Wearsearch";

#[derive(Debug, Default, Deserialize)]
pub struct OgQuery {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub price: Option<String>,
}

/// GET /api/og
pub async fn og_image(Query(query): Query<OgQuery>) -> impl IntoResponse {
    (
        [
            (CONTENT_TYPE, "image/svg+xml"),
            (CACHE_CONTROL, "public, max-age=86400"),
        ],
        render_card(&query),
    )
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn render_card(query: &OgQuery) -> String {
    let title = escape_xml(&truncate(
        non_blank(&query.title).unwrap_or(DEFAULT_TITLE),
        MAX_TITLE_CHARS,
    ));

    let mut lines = format!(
        r##"<text x="80" y="280" font-family="Inter, Arial, sans-serif" font-size="64" font-weight="700" fill="#ffffff">{}</text>"##,
        title
    );
    if let Some(subtitle) = non_blank(&query.subtitle) {
        lines.push_str(&format!(
            r##"<text x="80" y="360" font-family="Inter, Arial, sans-serif" font-size="36" fill="#a1a1aa">{}</text>"##,
            escape_xml(&truncate(subtitle, MAX_SUBTITLE_CHARS))
        ));
    }
    if let Some(price) = non_blank(&query.price) {
        lines.push_str(&format!(
            r##"<text x="80" y="480" font-family="Inter, Arial, sans-serif" font-size="48" font-weight="700" fill="#22c55e">{}</text>"##,
            escape_xml(&truncate(price, 32))
        ));
    }

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="{w}" height="{h}" fill="#09090b"/><text x="80" y="120" font-family="Inter, Arial, sans-serif" font-size="32" letter-spacing="6" fill="#71717a">WEARSEARCH</text>{lines}</svg>"##,
        w = WIDTH,
        h = HEIGHT,
        lines = lines
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_title() {
        let svg = render_card(&OgQuery::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="1200""#));
        assert!(svg.contains(r#"height="630""#));
        assert!(svg.contains(">Wearsearch</text>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let svg = render_card(&OgQuery {
            title: Some("<script>&\"".to_string()),
            subtitle: Some("Tom's".to_string()),
            price: None,
        });
        assert!(svg.contains("&lt;script&gt;&amp;&quot;"));
        assert!(svg.contains("Tom&apos;s"));
        assert!(!svg.contains("<script>"));
    }

    #[test]
    fn test_title_truncated_to_limit() {
        let title = "я".repeat(200);
        let truncated = truncate(&title, MAX_TITLE_CHARS);
        assert_eq!(truncated.chars().count(), MAX_TITLE_CHARS);
        assert!(truncated.ends_with('…'));
        assert_eq!(truncate("short", MAX_TITLE_CHARS), "short");
    }
}
