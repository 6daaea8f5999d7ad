use thiserror::Error;

/// Errors from locator resolution.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Locator resolution timed out after {0}s")]
    Timeout(u64),

    #[error("Locator service unavailable: {0}")]
    Unavailable(String),

    /// The source produced no locator for this item.
    #[error("No locator found for item")]
    NoLocator,

    #[error("Locator resolution exhausted after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

impl ResolverError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        ResolverError::Unavailable(msg.into())
    }
}
