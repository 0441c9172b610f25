//! # olivetum-admission
//!
//! Transaction admission for Olivetum: the validation rules applied at the
//! chain's edge and the apply-path effects of admitted transactions.
//!
//! Checks run most-specific first: self-transfer, management authorization,
//! payload shape, minimum amount, rate limit, off-session caps and budgets,
//! dividend eligibility. Validation is read-only; budgets and counters are
//! consumed only when a transaction is applied, so re-validating a known
//! transaction never double-counts it.

mod apply;
mod error;
mod payload;
mod policy;

pub use apply::apply_transaction;
pub use error::{AdmissionError, AdmissionResult};
pub use payload::validate_payload;
pub use policy::{validate_transaction, AdmissionPolicy, BlockEnv};
