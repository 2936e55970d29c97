use crate::error::{BrowserError, Result};
use crate::fetcher::{validate_url, FetcherLauncher, PageFetcher};
use crate::fingerprint::FingerprintConfig;
use crate::images::ImageCollector;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromiumConfig};
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use pagesight_core::{BrowserConfig, FetchResult};
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// Headless Chromium session.
///
/// One engine backs one top-level query. Call [`PageFetcher::close`] when
/// done; dropping an engine without closing it kills the browser process.
pub struct BrowserEngine {
    browser: Browser,
    handler: Option<JoinHandle<()>>,
    images: ImageCollector,
    navigation_timeout: Duration,
}

impl BrowserEngine {
    /// Launch a browser with default configuration
    pub async fn new() -> Result<Self> {
        Self::launch(&BrowserConfig::default(), FingerprintConfig::randomized()).await
    }

    /// Launch a browser with the given settings and identity
    pub async fn launch(config: &BrowserConfig, fingerprint: FingerprintConfig) -> Result<Self> {
        let mut builder = ChromiumConfig::builder()
            .no_sandbox()
            .window_size(config.window_width, config.window_height)
            .args(fingerprint.launch_args());

        if !config.headless {
            builder = builder.with_head();
        }

        let chromium_config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(chromium_config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        // Drive the CDP connection until the browser goes away
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("Browser handler event error: {}", e);
                }
            }
        });

        let images = ImageCollector::new(
            Duration::from_secs(config.image_timeout_secs),
            &fingerprint.user_agent,
        )?;

        tracing::debug!(
            "Launched browser (headless: {}, user agent: {})",
            config.headless,
            fingerprint.user_agent
        );

        Ok(Self {
            browser,
            handler: Some(handler),
            images,
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
        })
    }

    async fn load(&self, page: &Page, url: &Url) -> Result<FetchResult> {
        tokio::time::timeout(self.navigation_timeout, page.goto(url.as_str()))
            .await
            .map_err(|_| {
                BrowserError::Timeout(format!(
                    "navigation to {url} exceeded {:?}",
                    self.navigation_timeout
                ))
            })?
            .map_err(|e| BrowserError::NavigationError(format!("failed to load {url}: {e}")))?;

        let html = page
            .content()
            .await
            .map_err(|e| BrowserError::NavigationError(format!("failed to read {url}: {e}")))?;

        let images = self.images.collect(&html, url).await;

        Ok(FetchResult::new(html, images))
    }
}

#[async_trait::async_trait]
impl PageFetcher for BrowserEngine {
    async fn fetch(&self, url: &str) -> Result<FetchResult> {
        let url = validate_url(url)?;

        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::ChromiumError(format!("failed to open page: {e}")))?;

        let result = self.load(&page, &url).await;

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page for {}: {}", url, e);
        }

        if let Ok(fetched) = &result {
            tracing::debug!(
                "Fetched {} ({} bytes, {} images)",
                url,
                fetched.html.len(),
                fetched.images.len()
            );
        }

        result
    }

    async fn close(&mut self) -> Result<()> {
        let closed = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::ChromiumError(format!("failed to close browser: {e}")));

        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Failed waiting for browser exit: {}", e);
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        closed
    }
}

impl Drop for BrowserEngine {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

/// Launches a fresh [`BrowserEngine`] for every session.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    config: BrowserConfig,
}

impl ChromiumLauncher {
    /// Launch sessions with `config`, each under a freshly randomized fingerprint
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl FetcherLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn PageFetcher>> {
        let engine = BrowserEngine::launch(&self.config, FingerprintConfig::randomized()).await?;
        Ok(Box::new(engine))
    }
}
