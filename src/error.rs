use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrderError {
    /// Caller-supplied input rejected before any state change.
    #[error("Validation error: {0}")]
    Validation(String),
    /// Approval attempted on a manual payment that has no confirmation code
    /// yet. Surfaced so the caller can prompt for the code; never a transition.
    #[error("Payment {0} requires a confirmation code before approval")]
    ConfirmationCodeRequired(u64),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    /// A self-service document has no payment linked by document id. The
    /// reconciler refuses to guess a payment by user id.
    #[error("No payment linked to document {document_id}")]
    MissingPaymentLinkage { document_id: u64 },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Downstream call failed: {0}")]
    Downstream(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OrderError>;
