use crate::error::{BrowserError, Result};
use pagesight_core::FetchResult;
use url::Url;

/// Acquires rendered HTML and inlined images for a URL.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Load `url` and return its rendered markup and images
    async fn fetch(&self, url: &str) -> Result<FetchResult>;

    /// Release the underlying browser resources
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Opens one fetcher session per top-level operation.
///
/// The caller owns the returned fetcher and must `close` it when done.
#[async_trait::async_trait]
pub trait FetcherLauncher: Send + Sync {
    /// Start a new session
    async fn launch(&self) -> Result<Box<dyn PageFetcher>>;
}

/// Parse a URL the browser is allowed to navigate to (http or https with a host).
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| BrowserError::InvalidUrl(format!("{url}: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(BrowserError::InvalidUrl(format!(
            "{url}: unsupported scheme '{}'",
            parsed.scheme()
        )));
    }

    if parsed.host_str().is_none() {
        return Err(BrowserError::InvalidUrl(format!("{url}: no host")));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        let url = validate_url("https://example.com/path").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));

        let url = validate_url("http://subdomain.example.com:8080/path").unwrap();
        assert_eq!(url.host_str(), Some("subdomain.example.com"));
    }

    #[test]
    fn test_validate_url_invalid() {
        assert!(validate_url("not-a-url").is_err());
        assert!(validate_url("ftp://example.com/file").is_err());
        assert!(validate_url("file:///etc/passwd").is_err());
    }
}
