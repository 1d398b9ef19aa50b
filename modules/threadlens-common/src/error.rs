use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThreadLensError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Direct fetch failed after {attempts} attempts: {reason}")]
    TransientFetch { attempts: u32, reason: String },

    #[error("Upstream returned status {status}")]
    PermanentFetch { status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Upstream API error: {0}")]
    Upstream(String),

    #[error("Direct fetch blocked and API fallback failed: {0}")]
    Exhausted(String),
}
