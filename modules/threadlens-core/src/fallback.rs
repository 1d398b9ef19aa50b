use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use scraper::Html;
use tracing::{info, warn};

use stackexchange_client::{Answer, Question, StackExchangeClient};
use threadlens_common::{QuestionThread, ThreadLensError, MAX_ANSWERS};

/// Path shapes a question link can take. First match wins.
const ID_PATTERNS: &[&str] = &[r"/questions/(\d+)", r"/q/(\d+)"];

pub const API_TITLE_PLACEHOLDER: &str = "No title";

/// Second retrieval path, consulted only once direct fetching is
/// confirmed blocked.
#[async_trait]
pub trait FallbackSource: Send + Sync {
    async fn lookup(&self, url: &str) -> Result<QuestionThread, ThreadLensError>;
}

/// The two read calls the fallback needs, behind a trait so tests can
/// script them without a network.
#[async_trait]
pub trait QuestionApi: Send + Sync {
    async fn question(&self, id: u64) -> stackexchange_client::Result<Option<Question>>;
    async fn answers(&self, id: u64, limit: u32) -> stackexchange_client::Result<Vec<Answer>>;
}

#[async_trait]
impl QuestionApi for StackExchangeClient {
    async fn question(&self, id: u64) -> stackexchange_client::Result<Option<Question>> {
        StackExchangeClient::question(self, id).await
    }

    async fn answers(&self, id: u64, limit: u32) -> stackexchange_client::Result<Vec<Answer>> {
        StackExchangeClient::answers(self, id, limit).await
    }
}

pub struct ApiFallback {
    api: Arc<dyn QuestionApi>,
}

impl ApiFallback {
    pub fn new(client: StackExchangeClient) -> Self {
        Self {
            api: Arc::new(client),
        }
    }

    pub fn with_api(api: Arc<dyn QuestionApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl FallbackSource for ApiFallback {
    async fn lookup(&self, url: &str) -> Result<QuestionThread, ThreadLensError> {
        let id = question_id(url).ok_or_else(|| {
            ThreadLensError::Validation(format!("Could not extract question id from {url}"))
        })?;

        info!(url, id, "Querying Stack Exchange API");

        let question = self
            .api
            .question(id)
            .await
            .map_err(|e| ThreadLensError::Upstream(e.to_string()))?
            .ok_or_else(|| ThreadLensError::Upstream(format!("Question {id} not found")))?;

        // Answers are best-effort: a failing answers call degrades to
        // an empty list instead of sinking the lookup.
        let answers = match self.api.answers(id, MAX_ANSWERS as u32).await {
            Ok(items) => items,
            Err(e) => {
                warn!(id, error = %e, "Answers query failed, continuing without answers");
                Vec::new()
            }
        };

        info!(id, answers = answers.len(), "Fallback lookup complete");

        Ok(map_thread(question, answers, url))
    }
}

/// Extract the numeric question id from a question URL.
pub fn question_id(url: &str) -> Option<u64> {
    for pattern in ID_PATTERNS {
        let re = Regex::new(pattern).expect("valid pattern");
        if let Some(cap) = re.captures(url) {
            if let Ok(id) = cap[1].parse() {
                return Some(id);
            }
        }
    }
    None
}

/// Map API records into the canonical shape. API fields carry the
/// source's rendered HTML; strip it so both retrieval paths produce
/// plain text.
fn map_thread(question: Question, answers: Vec<Answer>, url: &str) -> QuestionThread {
    let title = question
        .title
        .as_deref()
        .map(strip_html)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| API_TITLE_PLACEHOLDER.to_string());

    QuestionThread {
        title,
        question_body: question.body.as_deref().map(strip_html).unwrap_or_default(),
        answers: answers
            .into_iter()
            .take(MAX_ANSWERS)
            .filter_map(|a| a.body)
            .map(|body| strip_html(&body))
            .collect(),
        tags: question.tags,
        source_url: url.to_string(),
    }
}

/// Plain text of an HTML fragment: tags dropped, entities decoded.
fn strip_html(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    let text: String = parsed.root_element().text().collect::<Vec<_>>().join(" ");
    text.trim().to_string()
}
