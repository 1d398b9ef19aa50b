pub mod extract;
pub mod fallback;
pub mod fetch;
pub mod profiles;
pub mod summarize;

pub use extract::extract_thread;
pub use fallback::{ApiFallback, FallbackSource, QuestionApi};
pub use fetch::{HttpFetcher, PageFetcher, PageResponse, Retriever, RetryPolicy};
pub use profiles::{pick_profile, HeaderProfile, PROFILES};
pub use summarize::Summarizer;
