//! Image extraction for rendered pages.
//!
//! Only two kinds of `<img>` are inlined: sources that already are data URIs,
//! and sources that look like CAPTCHA images, which are downloaded with the
//! page as referer. Everything else is left out of the map.

use crate::error::{BrowserError, Result};
use pagesight_core::{DataUri, ImageMap};
use reqwest::header::{CONTENT_TYPE, REFERER};
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

const FALLBACK_MEDIA_TYPE: &str = "image/png";

/// How an `<img src>` value should be handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Already inline; kept as is
    Inline(String),
    /// Remote image that looks like a challenge; must be downloaded
    Challenge(String),
}

/// Collect the `src` values of every `<img>` worth inlining, in document order.
pub fn image_sources(html: &str) -> Vec<ImageSource> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("img[src]").expect("valid img selector");

    document
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .filter_map(|src| {
            if src.starts_with("data:image") {
                Some(ImageSource::Inline(src.to_string()))
            } else if src.to_lowercase().contains("captcha") {
                Some(ImageSource::Challenge(src.to_string()))
            } else {
                None
            }
        })
        .collect()
}

/// Downloads challenge images and builds the image map for a page.
#[derive(Debug, Clone)]
pub struct ImageCollector {
    client: Client,
}

impl ImageCollector {
    /// Create a collector whose downloads give up after `timeout`.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| BrowserError::ChromiumError(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Build the image map for `html` loaded from `page_url`.
    ///
    /// Failed downloads are logged and skipped.
    pub async fn collect(&self, html: &str, page_url: &Url) -> ImageMap {
        let mut images = ImageMap::new();

        for source in image_sources(html) {
            match source {
                ImageSource::Inline(src) => {
                    images.insert(src.clone(), src);
                }
                ImageSource::Challenge(src) => match self.download(&src, page_url).await {
                    Ok(data_uri) => {
                        images.insert(src, data_uri);
                    }
                    Err(e) => {
                        tracing::warn!("Skipping challenge image: {}", e);
                    }
                },
            }
        }

        images
    }

    async fn download(&self, src: &str, page_url: &Url) -> Result<String> {
        let image_url = page_url.join(src).map_err(|e| BrowserError::ImageDownload {
            url: src.to_string(),
            message: format!("cannot resolve against {page_url}: {e}"),
        })?;

        let download_error = |message: String| BrowserError::ImageDownload {
            url: image_url.to_string(),
            message,
        };

        let response = self
            .client
            .get(image_url.clone())
            .header(REFERER, page_url.as_str())
            .send()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(format!("HTTP {}", status.as_u16())));
        }

        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or_else(|| FALLBACK_MEDIA_TYPE.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        tracing::debug!("Inlined challenge image {} ({} bytes)", image_url, bytes.len());
        Ok(DataUri::from_bytes(&media_type, &bytes).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagesight_core::FetchResult;

    #[test]
    fn test_image_sources_classification() {
        let html = r#"
            <html><body>
                <img src="/static/logo.png" alt="Logo">
                <img src="data:image/gif;base64,R0lGOD" alt="pixel">
                <img src="/Captcha/challenge.jpg" alt="challenge">
                <img alt="no source">
                <img src="   ">
            </body></html>
        "#;

        let sources = image_sources(html);
        assert_eq!(
            sources,
            vec![
                ImageSource::Inline("data:image/gif;base64,R0lGOD".to_string()),
                ImageSource::Challenge("/Captcha/challenge.jpg".to_string()),
            ]
        );
    }

    #[test]
    fn test_image_sources_empty_page() {
        assert!(image_sources("<html><body><p>hello</p></body></html>").is_empty());
    }

    #[tokio::test]
    async fn test_collect_keeps_inline_images_without_network() {
        let collector =
            ImageCollector::new(Duration::from_secs(1), "TestAgent/1.0").expect("create collector");
        let page_url = Url::parse("https://example.com/form").unwrap();
        let html = r#"<img src="data:image/png;base64,AAAA"><img src="/banner.png">"#;

        let images = collector.collect(html, &page_url).await;
        assert_eq!(images.len(), 1);
        assert_eq!(
            images.get("data:image/png;base64,AAAA").map(String::as_str),
            Some("data:image/png;base64,AAAA")
        );
    }

    #[tokio::test]
    async fn test_collect_keeps_document_order() {
        let collector =
            ImageCollector::new(Duration::from_secs(1), "TestAgent/1.0").expect("create collector");
        let page_url = Url::parse("https://example.com/form").unwrap();
        let html = r#"<img src="data:image/png;base64,ZZZZ#z-captcha">
                      <img src="data:image/png;base64,AAAA#a-captcha">"#;

        let images = collector.collect(html, &page_url).await;
        let keys: Vec<&str> = images.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "data:image/png;base64,ZZZZ#z-captcha",
                "data:image/png;base64,AAAA#a-captcha",
            ]
        );

        let challenge = FetchResult::new(html, images)
            .captcha_challenge()
            .expect("challenge selected");
        assert_eq!(challenge.source, "data:image/png;base64,ZZZZ#z-captcha");
    }

    #[tokio::test]
    async fn test_collect_skips_unresolvable_challenge() {
        let collector =
            ImageCollector::new(Duration::from_millis(200), "TestAgent/1.0").expect("create collector");
        // Port 9 on localhost refuses connections, so the download fails fast
        let page_url = Url::parse("http://127.0.0.1:9/form").unwrap();
        let html = r#"<img src="/captcha.png">"#;

        let images = collector.collect(html, &page_url).await;
        assert!(images.is_empty());
    }
}
