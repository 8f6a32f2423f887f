/// Groupe E lake level page client
///
/// Retrieves the public "niveau des lacs" page published by Groupe E,
/// which lists the current and previous day's level of the lakes of the
/// canton of Fribourg.
///
/// Page: https://www.groupe-e.ch/fr/univers-groupe-e/niveau-lacs

use std::time::Duration;

use crate::ingest::Fetcher;
use crate::model::FetchError;

const DEFAULT_USER_AGENT: &str = concat!("niveau_lacs/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Fetcher
// ============================================================================

/// Fetches the page over HTTP with a single attempt.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Builds a client with the given request timeout and user agent.
    pub fn new(timeout: Duration, user_agent: Option<&str>) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "text/html")
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Http(response.status().as_u16()));
        }

        // Decodes according to the charset announced by the server
        response.text().map_err(|e| FetchError::Decode(e.to_string()))
    }
}
