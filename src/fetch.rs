use crate::config::EtlConfig;
use crate::error::Result;
use reqwest::blocking::Client;
use tracing::{debug, instrument};

/// Source of raw page markup.
pub trait PageFetcher {
    fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP fetcher. One GET per call, non-success statuses are errors.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &EtlConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(skip(self))]
    fn fetch_page(&self, url: &str) -> Result<String> {
        let body = self.client.get(url).send()?.error_for_status()?.text()?;
        debug!("Fetched {} bytes", body.len());
        Ok(body)
    }
}

/// Serves a fixed document regardless of the URL asked for. Stands in for
/// [`HttpFetcher`] in the integration tests.
pub struct StaticPage(pub String);

impl PageFetcher for StaticPage {
    fn fetch_page(&self, _url: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}
