use thiserror::Error;

/// Errors surfaced by the client library. Every variant is recoverable:
/// command handlers translate them into a message and exit; nothing here
/// aborts the process on its own.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No gateway reachable, no signer configured, or a malformed response.
    #[error("connection error: {0}")]
    Connectivity(String),

    /// The caller is not the party allowed to perform the action.
    #[error("not authorized: {0}")]
    Authorization(String),

    /// A client-side guard refused the action before any gateway contact.
    #[error("{0}")]
    Precondition(#[from] PreconditionError),

    /// The transaction was rejected, reverted, or its receipt reported failure.
    #[error("transaction failed: {0}")]
    Transaction(String),

    /// Upload rejected locally or by the pinning service.
    #[error("upload failed: {0}")]
    Upload(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("claim must be verified by the hospital first")]
    HospitalNotVerified,

    #[error("claim is already verified")]
    AlreadyVerified,

    #[error("claim {0} has not been loaded")]
    ClaimNotLoaded(u64),

    #[error("a verification for claim {0} is already in flight")]
    VerificationInFlight(u64),

    #[error("operation {0} is already running")]
    OperationBusy(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Connectivity(err.to_string())
    }
}

impl ClientError {
    /// True for errors raised by a local guard, i.e. refused before any
    /// request was dispatched.
    pub fn is_precondition(&self) -> bool {
        matches!(self, ClientError::Precondition(_))
    }
}
