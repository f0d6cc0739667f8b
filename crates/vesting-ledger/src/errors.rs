//! The error kinds the ledger operations can return.

use vesting_schedule_window::ComputationError;

/// An error that can occur at a ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The parameters of the call are malformed.
    #[error("invalid parameters")]
    InvalidParameters,
    /// The caller does not hold the role the operation requires.
    #[error("unauthorized")]
    Unauthorized,
    /// The custodian declined a transfer.
    #[error("transfer failed")]
    TransferFailed,
    /// There is currently nothing to release for the caller.
    #[error("nothing to release")]
    NothingToRelease,
    /// The schedule is not revokable, or has already been revoked.
    #[error("cannot revoke")]
    CannotRevoke,
    /// The call arrived while another transfer-performing operation was still in flight.
    #[error("reentrant call")]
    ReentrantCall,
    /// Something went wrong in the balance computations.
    #[error("arithmetic: {0}")]
    Arithmetic(#[from] ComputationError),
}
