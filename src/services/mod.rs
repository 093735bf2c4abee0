//! Application services orchestrating token issuance and verification.
pub mod tokens;

/// Convenience alias for service results.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("token rejected")]
    InvalidToken,
    #[error("failed to sign token")]
    TokenSigning(#[source] jsonwebtoken::errors::Error),
}
