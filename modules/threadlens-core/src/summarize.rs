use std::sync::Arc;

use tracing::info;

use ai_client::CompletionBackend;
use threadlens_common::{QuestionThread, ThreadLensError};

/// Caps keep the completion request bounded no matter how large the
/// thread is.
const MAX_QUESTION_CHARS: usize = 2000;
const MAX_ANSWER_CHARS: usize = 1500;

/// Only the top answers go into the prompt.
const PROMPT_ANSWERS: usize = 2;

const SYSTEM_PROMPT: &str = "You are a technical summarizer. Create a concise HTML summary of this StackOverflow question.
Format your response as:
<strong>\u{1F9F5} TL;DR</strong>
<ul>
<li>Key point 1</li>
<li>Key point 2</li>
<li>Key point 3</li>
</ul>
Keep it under 150 words total. Focus on the problem, solution approach, and key technical details.";

pub struct Summarizer {
    backend: Arc<dyn CompletionBackend>,
}

impl Summarizer {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Produce the digest for a thread.
    pub async fn summarize(&self, thread: &QuestionThread) -> Result<String, ThreadLensError> {
        let message = build_user_message(thread);

        info!(
            url = %thread.source_url,
            message_chars = message.len(),
            "Requesting summary"
        );

        let summary = self
            .backend
            .complete(SYSTEM_PROMPT, &message)
            .await
            .map_err(|e| ThreadLensError::Upstream(e.to_string()))?;

        info!(url = %thread.source_url, summary_chars = summary.len(), "Summary generated");
        Ok(summary)
    }
}

/// Assemble the prompt body. Deterministic: the same thread always
/// produces the same message.
pub fn build_user_message(thread: &QuestionThread) -> String {
    let question = truncate_chars(&thread.question_body, MAX_QUESTION_CHARS);

    let joined = thread
        .answers
        .iter()
        .take(PROMPT_ANSWERS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    let answers = truncate_chars(&joined, MAX_ANSWER_CHARS);

    let tags = thread.tags.join(", ");

    format!(
        "Title: {}\n\nQuestion: {}\n\nTop Answers:\n{}\n\nTags: {}",
        thread.title, question, answers, tags
    )
}

/// Truncate to at most `max` characters, on a char boundary.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
