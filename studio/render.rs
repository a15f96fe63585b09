/// Central template renderer for the Jean-O-Type studio.
///
/// Both pages share one HTML template (`studio/assets/studio.html`) with
/// `{{TOKEN}}` placeholders, loaded at compile time. Navigation and headings
/// are filled here; the page body comes from the caller's closure. Tokens the
/// closure leaves behind are blanked so raw `{{TOKEN}}` never reaches the
/// browser.

const TEMPLATE: &str = include_str!("assets/studio.html");

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Classify,
    Trends,
}

impl Page {
    fn title(self) -> &'static str {
        match self {
            Page::Classify => "Jean-O-Type",
            Page::Trends   => "Jean Trend Comparison",
        }
    }

    fn heading(self) -> &'static str {
        match self {
            Page::Classify => "🦖 JEAN-O-TYPE",
            Page::Trends   => "Compare Jean Style Trends 📈👖",
        }
    }

    fn tagline(self) -> &'static str {
        match self {
            Page::Classify => "Upload a photo of jeans to discover your denim destiny!",
            Page::Trends   => "Select one or more styles to compare their monthly popularity since 2004.",
        }
    }
}

/// Renders a full page; `fill` substitutes `{{BODY}}` and any extra tokens.
pub fn render_page<F>(page: Page, fill: F) -> String
where
    F: FnOnce(String) -> String,
{
    let active = |p: Page| if p == page { "active" } else { "" };

    let mut html = TEMPLATE.to_owned();
    html = html.replace("{{PAGE_TITLE}}",   page.title());
    html = html.replace("{{HEADING}}",      page.heading());
    html = html.replace("{{TAGLINE}}",      page.tagline());
    html = html.replace("{{NAV_CLASSIFY}}", active(Page::Classify));
    html = html.replace("{{NAV_TRENDS}}",   active(Page::Trends));

    html = fill(html);

    blank_remaining(html)
}

/// Drops every `{{...}}` placeholder still left in `html`. An unclosed
/// `{{` is kept as text.
fn blank_remaining(html: String) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html.as_str();
    while let Some(open) = rest.find("{{") {
        let Some(len) = rest[open..].find("}}") else { break };
        out.push_str(&rest[..open]);
        rest = &rest[open + len + 2..];
    }
    out.push_str(rest);
    out
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
     .replace('<', "&lt;")
     .replace('>', "&gt;")
     .replace('"', "&quot;")
}

pub fn error_html(msg: &str) -> String {
    format!(r#"<div class="result-card"><h2>Error</h2><div class="error-box">{}</div></div>"#, msg)
}

pub fn warning_html(msg: &str) -> String {
    format!(r#"<div class="result-card"><div class="warn-box">{}</div></div>"#, msg)
}

pub fn info_html(msg: &str) -> String {
    format!(r#"<div class="result-card"><div class="info-box">{}</div></div>"#, msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfilled_tokens_are_blanked() {
        let html = render_page(Page::Trends, |t| t);
        assert!(!html.contains("{{"));
        assert!(html.contains("Jean Trend Comparison"));
    }

    #[test]
    fn leftover_placeholders_are_removed_but_unclosed_braces_kept() {
        assert_eq!(blank_remaining("a{{X}}b{{Y}}c".to_owned()), "abc");
        assert_eq!(blank_remaining("a{{X}}b{{open".to_owned()), "ab{{open");
    }

    #[test]
    fn active_nav_link_is_marked() {
        let html = render_page(Page::Classify, |t| t.replace("{{BODY}}", "<p>hi</p>"));
        assert!(html.contains(r#"<a href="/" class="active">"#));
        assert!(html.contains(r#"<a href="/trends" class="">"#));
        assert!(html.contains("<p>hi</p>"));
    }

    #[test]
    fn escape_handles_markup() {
        assert_eq!(html_escape(r#"<a href="x">&</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}
