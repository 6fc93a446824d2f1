//! Removal of non-content markup.
//!
//! The rules run in a fixed order within a single rewriting pass:
//!
//! 1. known boilerplate and advertisement fragments are dropped,
//! 2. iframes are demoted to plain links (or dropped when they have no `src`),
//! 3. scripts, stylesheet links, buttons and inputs are dropped,
//! 4. `contenteditable` is stripped,
//! 5. `loading` / `srcset` hints are stripped from media elements,
//! 6. zero `width` / `height` are stripped from media elements.
//!
//! Charset declarations are also rewritten to UTF-8, since the document is
//! re-encoded as UTF-8 in the message.

use lol_html::html_content::{ContentType, Element};
use lol_html::{element, rewrite_str, RewriteStrSettings, Selector};

/// Fragments that are never part of the saved content.
pub const BOILERPLATE_SELECTORS: &[&str] = &[
    "ins.adsbygoogle",
    "[data-ad-slot]",
    "[data-ad-client]",
    "div[id^=\"div-gpt-ad\"]",
    "div[id^=\"google_ads\"]",
    "iframe[src*=\"doubleclick.net\"]",
    "iframe[src*=\"googlesyndication.com\"]",
    "img[src*=\"/pixel.gif\"]",
    "img[width=\"1\"][height=\"1\"]",
];

/// Elements dropped unconditionally.
const REMOVED_ELEMENTS: &[&str] = &["script", "link[rel~=\"stylesheet\" i]", "button", "input"];

/// Rendering hints that only make sense in a live page.
const MEDIA_HINT_ATTRIBUTES: &[&str] = &["loading", "srcset"];

/// Elements that carry media hints and dimensions.
const MEDIA_ELEMENTS: &[&str] = &["img", "video", "source"];

/// Sanitization rules for one run.
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    extra_selectors: Vec<String>,
}

impl Sanitizer {
    /// Sanitizer with the built-in rules only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also drop elements matching `selectors`.
    ///
    /// Selectors the rewriter cannot parse are skipped with a warning.
    pub fn with_extra_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for selector in selectors {
            let selector = selector.into();
            match selector.parse::<Selector>() {
                Ok(_) => self.extra_selectors.push(selector),
                Err(e) => tracing::warn!(%selector, error = %e, "Ignoring invalid selector"),
            }
        }
        self
    }

    /// Apply every rule to `html` and return the rewritten markup.
    pub fn sanitize(&self, html: &str) -> Result<String, lol_html::errors::RewritingError> {
        let mut handlers = Vec::new();

        for selector in BOILERPLATE_SELECTORS
            .iter()
            .copied()
            .chain(self.extra_selectors.iter().map(String::as_str))
        {
            handlers.push(element!(selector, |el| {
                el.remove();
                Ok(())
            }));
        }

        handlers.push(element!("iframe", |el| {
            demote_iframe(el)?;
            Ok(())
        }));

        for selector in REMOVED_ELEMENTS {
            handlers.push(element!(*selector, |el| {
                el.remove();
                Ok(())
            }));
        }

        handlers.push(element!("*[contenteditable]", |el| {
            el.remove_attribute("contenteditable");
            Ok(())
        }));

        for selector in MEDIA_ELEMENTS {
            handlers.push(element!(*selector, |el| {
                strip_media_hints(el);
                Ok(())
            }));
        }

        handlers.push(element!("meta[charset]", |el| {
            el.set_attribute("charset", "utf-8")?;
            Ok(())
        }));
        handlers.push(element!("meta[http-equiv=\"content-type\" i]", |el| {
            el.set_attribute("content", "text/html; charset=utf-8")?;
            Ok(())
        }));

        rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: handlers,
                ..RewriteStrSettings::new()
            },
        )
    }
}

/// Replace an iframe by a link to its source, or drop it if it has none.
///
/// Iframes already dropped as boilerplate stay dropped.
fn demote_iframe(el: &mut Element<'_, '_>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if el.removed() {
        return Ok(());
    }
    let src = el.get_attribute("src").unwrap_or_default();
    if src.trim().is_empty() {
        el.remove();
        return Ok(());
    }

    let names: Vec<String> = el.attributes().iter().map(|a| a.name()).collect();
    for name in names {
        el.remove_attribute(&name);
    }
    el.set_tag_name("a")?;
    el.set_attribute("href", &src)?;
    el.set_inner_content(&escape_text(&src), ContentType::Html);
    Ok(())
}

/// Strip rendering hints and zero dimensions from a media element.
fn strip_media_hints(el: &mut Element<'_, '_>) {
    if el.removed() {
        return;
    }
    for attr in MEDIA_HINT_ATTRIBUTES {
        el.remove_attribute(attr);
    }
    for attr in ["width", "height"] {
        if el.get_attribute(attr).is_some_and(|v| v.trim() == "0") {
            el.remove_attribute(attr);
        }
    }
}

/// Escape `<` and `>` so a raw attribute value can be used as link text.
///
/// Attribute values are kept as written in the source, so existing
/// character references stay untouched.
fn escape_text(raw: &str) -> String {
    raw.replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitize(html: &str) -> String {
        Sanitizer::new().sanitize(html).unwrap()
    }

    #[test]
    fn test_removes_scripts_buttons_inputs() {
        let out = sanitize(
            r#"<p>keep</p><script>alert(1)</script><button>Go</button><input type="text"><p>end</p>"#,
        );
        assert!(!out.contains("<script"));
        assert!(!out.contains("alert"));
        assert!(!out.contains("<button"));
        assert!(!out.contains("<input"));
        assert!(out.contains("<p>keep</p>"));
        assert!(out.contains("<p>end</p>"));
    }

    #[test]
    fn test_iframe_becomes_link() {
        let out = sanitize(r#"<iframe src="https://x" width="560"></iframe>"#);
        assert_eq!(out, r#"<a href="https://x">https://x</a>"#);
    }

    #[test]
    fn test_empty_iframe_removed() {
        assert_eq!(sanitize(r#"<div><iframe src=""></iframe></div>"#), "<div></div>");
        assert_eq!(sanitize("<div><iframe></iframe></div>"), "<div></div>");
    }

    #[test]
    fn test_stylesheet_links_removed() {
        let out = sanitize(
            r#"<link rel="stylesheet" href="a.css"><link rel="Alternate Stylesheet" href="b.css"><link rel="icon" href="i.png">"#,
        );
        assert!(!out.contains("a.css"));
        assert!(!out.contains("b.css"));
        assert!(out.contains("i.png"));
    }

    #[test]
    fn test_contenteditable_stripped() {
        let out = sanitize(r#"<div contenteditable="true">text</div>"#);
        assert_eq!(out, "<div>text</div>");
    }

    #[test]
    fn test_media_hints_stripped() {
        let out = sanitize(
            r#"<img src="a.png" loading="lazy" srcset="a2.png 2x" width="0" height="120">"#,
        );
        assert!(!out.contains("loading"));
        assert!(!out.contains("srcset"));
        assert!(!out.contains("width"));
        assert!(out.contains(r#"height="120""#));
    }

    #[test]
    fn test_ad_fragments_removed() {
        let out = sanitize(
            r#"<p>a</p><ins class="adsbygoogle" data-ad-client="x"></ins><div id="div-gpt-ad-1"><iframe src="https://ads"></iframe></div><p>b</p>"#,
        );
        assert_eq!(out, "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_ad_iframe_removed_not_demoted() {
        assert_eq!(
            sanitize(r#"<p>a</p><iframe src="https://ad.doubleclick.net/x"></iframe><p>b</p>"#),
            "<p>a</p><p>b</p>"
        );
        assert_eq!(
            sanitize(r#"<p>a</p><iframe src="https://tpc.googlesyndication.com/ad"></iframe><p>b</p>"#),
            "<p>a</p><p>b</p>"
        );
    }

    #[test]
    fn test_extra_selector_matching_iframe() {
        let sanitizer = Sanitizer::new().with_extra_selectors(["iframe[src*=\"tracker.example\"]"]);
        let out = sanitizer
            .sanitize(
                r#"<p>a</p><iframe src="https://tracker.example/p"></iframe><iframe src="https://video.example/1"></iframe><p>b</p>"#,
            )
            .unwrap();
        assert_eq!(
            out,
            r#"<p>a</p><a href="https://video.example/1">https://video.example/1</a><p>b</p>"#
        );
    }

    #[test]
    fn test_tracking_pixel_removed() {
        let out = sanitize(r#"<p>a</p><img src="https://t.example/pixel.gif" loading="lazy"><img width="1" height="1" src="x.gif"><p>b</p>"#);
        assert_eq!(out, "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_picture_source_hints_stripped() {
        let out = sanitize(
            r#"<picture><source srcset="a.webp 1x, a@2x.webp 2x" type="image/webp"><img src="a.jpg"></picture>"#,
        );
        assert_eq!(
            out,
            r#"<picture><source type="image/webp"><img src="a.jpg"></picture>"#
        );
    }

    #[test]
    fn test_extra_selectors() {
        let sanitizer = Sanitizer::new().with_extra_selectors([".newsletter", "[[invalid"]);
        let out = sanitizer
            .sanitize(r#"<div class="newsletter">Subscribe</div><p>x</p>"#)
            .unwrap();
        assert_eq!(out, "<p>x</p>");
    }

    #[test]
    fn test_charset_declaration_rewritten() {
        let out = sanitize(r#"<meta charset="gbk">"#);
        assert_eq!(out, r#"<meta charset="utf-8">"#);
    }

    #[test]
    fn test_no_matches_is_noop() {
        let html = "<html><body><p>Nothing to do</p></body></html>";
        assert_eq!(sanitize(html), html);
    }
}
