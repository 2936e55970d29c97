//! CAPTCHA gate detection.
//!
//! Detection is a heuristic over the rendered document, applied in three
//! passes that stop at the first hit:
//!
//! 1. the document text (script, style and template content excluded),
//! 2. the serialized markup of every `img`, `input`, `form` and `div`,
//! 3. the `src` and `alt` attributes of every `img`, for the literal `captcha`.

use once_cell::sync::Lazy;
use regex::RegexSet;
use scraper::{Html, Selector};

/// Phrases that mark a page as gated.
pub const CAPTCHA_SIGNATURES: &[&str] = &[
    r"captcha",
    r"verify.*human",
    r"prove.*human",
    r"are you a robot",
    r"not.*robot",
];

static SIGNATURES: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new(CAPTCHA_SIGNATURES.iter().map(|p| format!("(?i){p}")))
        .expect("valid CAPTCHA signatures")
});

static MARKUP_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img, input, form, div").expect("valid markup selector"));

static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("valid img selector"));

const HIDDEN_TEXT_ELEMENTS: &[&str] = &["script", "style", "template"];

/// Classifies rendered HTML as CAPTCHA-gated or not.
///
/// Stateless; one instance can be shared freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptchaDetector;

impl CaptchaDetector {
    /// Create a detector.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Whether `html` shows a CAPTCHA challenge.
    #[must_use]
    pub fn detect(&self, html: &str) -> bool {
        detect_captcha(html)
    }
}

/// Whether `html` shows a CAPTCHA challenge.
#[must_use]
pub fn detect_captcha(html: &str) -> bool {
    let document = Html::parse_document(html);

    if SIGNATURES.is_match(&visible_text(&document)) {
        tracing::trace!("CAPTCHA signature found in visible text");
        return true;
    }

    if document
        .select(&MARKUP_SELECTOR)
        .any(|element| SIGNATURES.is_match(&element.html()))
    {
        tracing::trace!("CAPTCHA signature found in element markup");
        return true;
    }

    document.select(&IMG_SELECTOR).any(|img| {
        ["src", "alt"].iter().any(|attr| {
            img.value()
                .attr(attr)
                .is_some_and(|value| value.to_lowercase().contains("captcha"))
        })
    })
}

fn visible_text(document: &Html) -> String {
    let mut text = String::new();

    for node in document.tree.root().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| HIDDEN_TEXT_ELEMENTS.contains(&element.name()))
        });

        if !hidden {
            text.push_str(fragment);
        }
    }

    text
}
