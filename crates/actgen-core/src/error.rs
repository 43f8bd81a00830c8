//! Error types for the actgen generation engine.
//!
//! Collaborator traits return `anyhow::Result` so hosts can surface whatever
//! they like; the engine wraps those failures verbatim in
//! [`Error::Collaborator`].

use thiserror::Error;

/// Main error type for generation, partitioning and output.
#[derive(Error, Debug)]
pub enum Error {
    /// The request is malformed or semantically invalid.
    #[error("invalid input data: {0}")]
    InvalidInput(String),

    /// A referenced namespace does not exist.
    #[error("namespace {0} not found")]
    NamespaceNotFound(String),

    /// No usable mount could be found for a namespace.
    #[error("unable to find matching mount in namespace {namespace}")]
    MountNotFound {
        /// Namespace the lookup ran in.
        namespace: String,
    },

    /// Implicit partitioning has no usable segments left.
    #[error(
        "num segments {total} is too low, it must be greater than {} ({skipped} skipped indexes + {empty} empty indexes)",
        .skipped + .empty
    )]
    TooFewSegments {
        /// Requested segment count (1 when unset).
        total: usize,
        /// Number of skip indexes.
        skipped: usize,
        /// Number of empty indexes.
        empty: usize,
    },

    /// A repetition directive found fewer matching clients than requested.
    #[error("missing repeated {missing} clients matching given parameters")]
    MissingRepeated {
        /// Requested minus available.
        missing: usize,
    },

    /// The identifier source could not produce an identifier.
    #[error("failed to generate client id: {0}")]
    IdGeneration(String),

    /// Calendar arithmetic left the representable range.
    #[error("cannot compute start of month {months_ago} months before {now}")]
    Timestamp {
        /// Offset that failed.
        months_ago: u32,
        /// Reference instant.
        now: chrono::DateTime<chrono::Utc>,
    },

    /// Processing a single month failed.
    #[error("failed to process data for month {months_ago}")]
    Month {
        /// Month offset being processed.
        months_ago: u32,
        /// Underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// A host collaborator call failed.
    #[error("{op} failed")]
    Collaborator {
        /// Collaborator operation name.
        op: &'static str,
        /// Error returned by the collaborator.
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    /// Wrap `self` with the month it occurred in.
    #[must_use]
    pub fn in_month(self, months_ago: u32) -> Self {
        Self::Month {
            months_ago,
            source: Box::new(self),
        }
    }

    /// Wrap a collaborator failure.
    #[must_use]
    pub fn collaborator(op: &'static str, source: anyhow::Error) -> Self {
        Self::Collaborator { op, source }
    }

    /// Innermost engine error, looking through [`Error::Month`] wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Month { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the caller must change the request to succeed.
    #[must_use]
    pub fn is_request_error(&self) -> bool {
        matches!(
            self.root(),
            Self::InvalidInput(_)
                | Self::NamespaceNotFound(_)
                | Self::MountNotFound { .. }
                | Self::TooFewSegments { .. }
                | Self::MissingRepeated { .. }
        )
    }
}

/// Result type alias for actgen operations.
pub type Result<T> = std::result::Result<T, Error>;
