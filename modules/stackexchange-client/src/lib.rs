pub mod error;
pub mod types;

pub use error::{Result, StackExchangeError};
pub use types::{Answer, Question, Wrapper};

use std::time::Duration;

const BASE_URL: &str = "https://api.stackexchange.com/2.3";

/// Site parameter sent with every query. Only Stack Overflow is
/// supported.
const SITE: &str = "stackoverflow";

pub struct StackExchangeClient {
    client: reqwest::Client,
    base_url: String,
}

impl StackExchangeClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Fetch one question by id, body included. `None` when the API
    /// returns an empty item list (deleted or never existed).
    pub async fn question(&self, id: u64) -> Result<Option<Question>> {
        let url = format!("{}/questions/{}", self.base_url, id);
        tracing::debug!(id, "Fetching question");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("order", "desc"),
                ("sort", "activity"),
                ("site", SITE),
                ("filter", "withbody"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(StackExchangeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let wrapper: Wrapper<Question> = resp.json().await?;
        Ok(wrapper.items.into_iter().next())
    }

    /// Fetch up to `limit` answers for a question, highest score first.
    pub async fn answers(&self, id: u64, limit: u32) -> Result<Vec<Answer>> {
        let url = format!("{}/questions/{}/answers", self.base_url, id);
        tracing::debug!(id, limit, "Fetching answers");

        let pagesize = limit.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("order", "desc"),
                ("sort", "votes"),
                ("site", SITE),
                ("filter", "withbody"),
                ("pagesize", pagesize.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(StackExchangeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let wrapper: Wrapper<Answer> = resp.json().await?;
        Ok(wrapper.items)
    }
}
