use serde::Deserialize;

/// Wrapper for Stack Exchange API responses. Every endpoint returns a
/// paginated `items` list.
#[derive(Debug, Clone, Deserialize)]
pub struct Wrapper<T> {
    #[serde(default)]
    pub items: Vec<T>,
}

/// A question record, requested with `filter=withbody` so `body`
/// carries the rendered HTML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub question_id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// An answer record, requested with `filter=withbody`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Answer {
    #[serde(default)]
    pub answer_id: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub is_accepted: bool,
}
