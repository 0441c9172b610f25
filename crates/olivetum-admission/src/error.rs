//! Admission error values.

use thiserror::Error;

/// Reasons a transaction is refused admission.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionError {
    /// Sender and recipient are the same address.
    #[error("self transfers not allowed")]
    SelfTransfer,

    /// A management transaction from a non-administrator.
    #[error("unauthorized management transaction")]
    UnauthorizedManagementTx,

    /// Access lists are not allowed.
    #[error("access lists not allowed")]
    AccessListNotAllowed,

    /// A management transaction carried value.
    #[error("value not allowed")]
    ValueNotAllowed,

    /// Payload data is not allowed for this recipient.
    #[error("data not allowed")]
    DataNotAllowed,

    /// Payload data has the wrong length for this management contract.
    #[error("invalid data length")]
    DataLengthInvalid,

    /// Contract creation is not admitted.
    #[error("contract creation not allowed")]
    CreationNotAllowed,

    /// Transaction value below the configured minimum.
    #[error("transaction value below minimum")]
    UnderMinAmount,

    /// Sender exhausted its transactions for the window.
    #[error("transaction rate limit exceeded")]
    RateLimit,

    /// A single off-session transaction above the per-transaction cap.
    #[error("over off-session maximum amount")]
    OverMaxOffSession,

    /// The cumulative off-session window budget would be exceeded.
    #[error("over off-session budget")]
    OverOffSessionBudget,

    /// A dividend claim that would not pay out.
    #[error("dividend claim not eligible")]
    DividendNotEligible,

    /// A dividend trigger during the round cooldown.
    #[error("dividend round still cooling down")]
    DividendRoundTooSoon,
}

/// Result type for admission checks.
pub type AdmissionResult<T> = Result<T, AdmissionError>;
