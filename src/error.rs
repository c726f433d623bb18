use thiserror::Error;

/// Boxed error produced by caller code inside a visitor.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Returned by a visitor to skip the subtree rooted at the node it was
    /// just called for. Walks swallow it; it never reaches the caller.
    #[error("skip this subtree")]
    SkipSubtree,

    /// Any error raised by a visitor. Aborts the walk and is returned as is.
    #[error(transparent)]
    Visitor(#[from] BoxError),

    #[error("invalid config: {field} = {value} ({reason})")]
    InvalidConfig {
        field: &'static str,
        value: usize,
        reason: &'static str,
    },
}

impl Error {
    pub fn visitor(err: impl Into<BoxError>) -> Self {
        Error::Visitor(err.into())
    }

    #[inline]
    pub fn is_skip_subtree(&self) -> bool {
        matches!(self, Error::SkipSubtree)
    }
}
