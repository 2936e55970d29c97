//! Shared types used across Pagesight.
//!
//! A [`FetchResult`] is what the browser hands back for one page load; the
//! pipeline inspects it, may pull a [`CaptchaChallenge`] out of it, and finally
//! produces an [`AnalysisResult`].

use crate::error::PagesightError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Image reference (URL or data URI as it appeared in the page) to inlined data URI.
///
/// Entries keep the order the images appear in the document.
pub type ImageMap = IndexMap<String, String>;

/// Rendered HTML for one page load plus the images inlined from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    /// Rendered document markup
    pub html: String,
    /// Inlined images keyed by their original reference
    pub images: ImageMap,
}

impl FetchResult {
    /// Create a fetch result from markup and an image map.
    #[must_use]
    pub fn new(html: impl Into<String>, images: ImageMap) -> Self {
        Self {
            html: html.into(),
            images,
        }
    }

    /// Select the CAPTCHA image to solve: the first image in the page whose
    /// reference contains `captcha`, ignoring case.
    #[must_use]
    pub fn captcha_challenge(&self) -> Option<CaptchaChallenge> {
        self.images
            .iter()
            .find(|(source, _)| source.to_lowercase().contains("captcha"))
            .map(|(source, data_uri)| CaptchaChallenge {
                source: source.clone(),
                image_data_uri: data_uri.clone(),
            })
    }
}

/// An image challenge selected from a gated page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptchaChallenge {
    /// Reference the image was found under
    pub source: String,
    /// Inlined image data
    pub image_data_uri: String,
}

/// Answer to a question about a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Direct answer to the question
    pub answer: String,
    /// How the answer was derived
    pub reasoning: String,
    /// Markup of the element holding the answer, when the model named one
    pub html_element: Option<String>,
}

impl AnalysisResult {
    /// Create an analysis result.
    #[must_use]
    pub fn new(
        answer: impl Into<String>,
        reasoning: impl Into<String>,
        html_element: Option<String>,
    ) -> Self {
        Self {
            answer: answer.into(),
            reasoning: reasoning.into(),
            html_element,
        }
    }
}

/// A parsed `data:<media type>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    media_type: String,
    data: String,
}

impl DataUri {
    /// Parse a base64 data URI.
    ///
    /// # Errors
    /// Returns error if the scheme, the `;base64` marker or the payload is missing.
    pub fn parse(uri: &str) -> Result<Self, PagesightError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| PagesightError::InvalidDataUri("missing data: scheme".to_string()))?;

        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| PagesightError::InvalidDataUri("missing ',' separator".to_string()))?;

        let media_type = header.strip_suffix(";base64").ok_or_else(|| {
            PagesightError::InvalidDataUri("only base64 data URIs are supported".to_string())
        })?;

        if data.is_empty() {
            return Err(PagesightError::InvalidDataUri("empty payload".to_string()));
        }

        let media_type = if media_type.is_empty() {
            "image/png"
        } else {
            media_type
        };

        Ok(Self {
            media_type: media_type.to_string(),
            data: data.to_string(),
        })
    }

    /// Encode raw bytes as a data URI.
    #[must_use]
    pub fn from_bytes(media_type: &str, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.to_string(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Media type, e.g. `image/png`.
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Base64 payload without the header.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.media_type, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images(entries: &[(&str, &str)]) -> ImageMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_captcha_challenge_selection_is_case_insensitive() {
        let page = FetchResult::new(
            "<html></html>",
            images(&[
                ("https://example.com/logo.png", "data:image/png;base64,AAAA"),
                ("https://example.com/CAPTCHA/img.jpg", "data:image/jpeg;base64,BBBB"),
            ]),
        );

        let challenge = page.captcha_challenge().expect("challenge selected");
        assert_eq!(challenge.source, "https://example.com/CAPTCHA/img.jpg");
        assert_eq!(challenge.image_data_uri, "data:image/jpeg;base64,BBBB");
    }

    #[test]
    fn test_captcha_challenge_first_match_wins() {
        let page = FetchResult::new(
            "",
            images(&[
                ("a-captcha.png", "data:image/png;base64,AAAA"),
                ("b-captcha.png", "data:image/png;base64,BBBB"),
            ]),
        );
        assert_eq!(page.captcha_challenge().unwrap().source, "a-captcha.png");
    }

    #[test]
    fn test_captcha_challenge_follows_page_order() {
        let page = FetchResult::new(
            "",
            images(&[
                ("/z/captcha.png", "data:image/png;base64,ZZZZ"),
                ("/a/captcha.png", "data:image/png;base64,AAAA"),
            ]),
        );

        let challenge = page.captcha_challenge().expect("challenge selected");
        assert_eq!(challenge.source, "/z/captcha.png");
        assert_eq!(challenge.image_data_uri, "data:image/png;base64,ZZZZ");
    }

    #[test]
    fn test_captcha_challenge_absent() {
        let page = FetchResult::new(
            "<p>Please verify you are human</p>",
            images(&[("banner.png", "data:image/png;base64,AAAA")]),
        );
        assert!(page.captcha_challenge().is_none());
        assert!(FetchResult::default().captcha_challenge().is_none());
    }

    #[test]
    fn test_data_uri_parse() {
        let uri = DataUri::parse("data:image/jpeg;base64,QUJD").expect("valid data URI");
        assert_eq!(uri.media_type(), "image/jpeg");
        assert_eq!(uri.data(), "QUJD");
        assert_eq!(uri.to_string(), "data:image/jpeg;base64,QUJD");
    }

    #[test]
    fn test_data_uri_defaults_media_type() {
        let uri = DataUri::parse("data:;base64,QUJD").expect("valid data URI");
        assert_eq!(uri.media_type(), "image/png");
    }

    #[test]
    fn test_data_uri_rejects_malformed() {
        assert!(DataUri::parse("https://example.com/a.png").is_err());
        assert!(DataUri::parse("data:image/png;base64").is_err());
        assert!(DataUri::parse("data:image/svg+xml,<svg/>").is_err());
        assert!(DataUri::parse("data:image/png;base64,").is_err());
    }

    #[test]
    fn test_data_uri_from_bytes() {
        let uri = DataUri::from_bytes("image/png", b"fake image data");
        assert_eq!(uri.to_string(), "data:image/png;base64,ZmFrZSBpbWFnZSBkYXRh");
    }

    #[test]
    fn test_analysis_result_serialization() {
        let result = AnalysisResult::new("42", "Found in the page", None);
        let json = serde_json::to_value(&result).expect("serialize result");
        assert_eq!(json["answer"], "42");
        assert!(json["html_element"].is_null());
    }
}
