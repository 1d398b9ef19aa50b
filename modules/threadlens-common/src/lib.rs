pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::ThreadLensError;
pub use types::{QuestionThread, MAX_ANSWERS};
