use serde::{Deserialize, Serialize};

/// Answers carried per thread, whichever path produced them.
pub const MAX_ANSWERS: usize = 3;

/// A question thread normalized into one shape, regardless of whether
/// it came from the live page or the Stack Exchange API. Downstream
/// code must not care which path produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionThread {
    /// Never empty; a placeholder literal stands in when no source
    /// field resolves.
    pub title: String,
    /// May be empty when extraction finds nothing.
    pub question_body: String,
    /// Up to [`MAX_ANSWERS`], in source order: page order when scraped,
    /// highest-voted first when fetched through the API.
    pub answers: Vec<String>,
    pub tags: Vec<String>,
    /// The URL the request asked for, kept verbatim for traceability.
    pub source_url: String,
}
