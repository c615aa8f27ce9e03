use std::fmt;

use reqwest::StatusCode;

/// The backend call an error came from. Each component reports failures
/// through the message of the operation it issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Scan,
    Search,
    Cover,
    Embed,
    UpdateMetadata,
    Download,
}

impl Operation {
    pub fn user_message(&self) -> &'static str {
        match self {
            Operation::Scan => "Failed to scan library.",
            Operation::Search => "Search failed.",
            Operation::Cover => "Failed to load cover.",
            Operation::Embed => "Failed to embed cover.",
            Operation::UpdateMetadata => "Save failed.",
            Operation::Download => "Download failed.",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Scan => "scan",
            Operation::Search => "search",
            Operation::Cover => "cover",
            Operation::Embed => "embed",
            Operation::UpdateMetadata => "update_meta",
            Operation::Download => "download",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TaggerError {
    #[error("{operation} request failed: {source}")]
    Http {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },
    #[error("{operation} returned HTTP {status}")]
    Status {
        operation: Operation,
        status: StatusCode,
    },
    #[error("search query is empty")]
    EmptyQuery,
    #[error("catalog candidate {remote_id} has no high resolution artwork")]
    MissingArtwork { remote_id: i64 },
    #[error("invalid backend url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TaggerError {
    pub(crate) fn http(operation: Operation, source: reqwest::Error) -> Self {
        TaggerError::Http { operation, source }
    }

    /// The request never completed or the backend answered non-2xx.
    pub fn is_network(&self) -> bool {
        matches!(self, TaggerError::Http { .. } | TaggerError::Status { .. })
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            TaggerError::Http { operation, .. } | TaggerError::Status { operation, .. } => {
                Some(*operation)
            }
            TaggerError::EmptyQuery => Some(Operation::Search),
            TaggerError::MissingArtwork { .. } => Some(Operation::Embed),
            TaggerError::InvalidBaseUrl(_) | TaggerError::Client(_) | TaggerError::Io(_) => None,
        }
    }

    /// Message shown to the user by the component that issued the call.
    pub fn user_message(&self) -> String {
        match self {
            TaggerError::EmptyQuery => "Enter keywords to search.".to_string(),
            TaggerError::MissingArtwork { .. } => {
                "This result has no full size artwork.".to_string()
            }
            other => match other.operation() {
                Some(operation) => operation.user_message().to_string(),
                None => other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, TaggerError>;
