use rand::seq::SliceRandom;

const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

const LANGUAGES: [&str; 3] = ["en-US", "en-GB", "en"];

/// Browser identity presented to the sites being fetched
#[derive(Debug, Clone)]
pub struct FingerprintConfig {
    /// Sent as the browser user agent and on image downloads
    pub user_agent: String,
    /// Browser UI and `Accept-Language` locale
    pub language: String,
}

impl FingerprintConfig {
    /// Pick a common desktop identity at random
    pub fn randomized() -> Self {
        let mut rng = rand::thread_rng();

        Self {
            user_agent: USER_AGENTS
                .choose(&mut rng)
                .copied()
                .unwrap_or(USER_AGENTS[0])
                .to_string(),
            language: LANGUAGES
                .choose(&mut rng)
                .copied()
                .unwrap_or(LANGUAGES[0])
                .to_string(),
        }
    }

    /// Chromium command line switches applying this identity
    pub fn launch_args(&self) -> Vec<String> {
        vec![
            format!("--user-agent={}", self.user_agent),
            format!("--lang={}", self.language),
        ]
    }
}
