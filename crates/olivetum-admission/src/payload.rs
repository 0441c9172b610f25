//! Payload shape validation, active once the economy fork is reached.

use crate::error::{AdmissionError, AdmissionResult};
use olivetum_params::{
    BURN_CONTRACT, DIVIDEND_CONTRACT, GAS_LIMIT_CONTRACT, MANAGEMENT_ADMIN,
    MIN_TX_AMOUNT_CONTRACT, OFF_SESSION_MAX_CONTRACT, OFF_SESSION_RATE_CONTRACT, PERIOD_CONTRACT,
    SESSION_TZ_CONTRACT, TX_RATE_CONTRACT,
};
use olivetum_types::Transaction;

/// Validates value, data and access-list shape against the recipient.
///
/// Management contracts take zero value and a fixed-width payload; the
/// dividend contract additionally accepts empty data (a claim) or a single
/// byte from the administrator (a trigger). Plain accounts take no data at
/// all.
pub fn validate_payload(tx: &Transaction, economy_fork_active: bool) -> AdmissionResult<()> {
    if !economy_fork_active {
        return Ok(());
    }
    if !tx.access_list.is_empty() {
        return Err(AdmissionError::AccessListNotAllowed);
    }
    let Some(to) = tx.to else {
        return Err(AdmissionError::CreationNotAllowed);
    };

    match to {
        addr if addr == DIVIDEND_CONTRACT => {
            if !tx.value.is_zero() {
                return Err(AdmissionError::ValueNotAllowed);
            }
            if tx.data.is_empty() {
                return Ok(());
            }
            if tx.data.len() == 1 && tx.from == MANAGEMENT_ADMIN {
                return Ok(());
            }
            Err(AdmissionError::DataNotAllowed)
        }
        addr if addr == BURN_CONTRACT
            || addr == GAS_LIMIT_CONTRACT
            || addr == PERIOD_CONTRACT
            || addr == TX_RATE_CONTRACT
            || addr == OFF_SESSION_RATE_CONTRACT =>
        {
            if !tx.value.is_zero() {
                return Err(AdmissionError::ValueNotAllowed);
            }
            if tx.data.len() != 1 {
                return Err(AdmissionError::DataLengthInvalid);
            }
            Ok(())
        }
        addr if addr == MIN_TX_AMOUNT_CONTRACT || addr == OFF_SESSION_MAX_CONTRACT => {
            if !tx.value.is_zero() {
                return Err(AdmissionError::ValueNotAllowed);
            }
            if tx.data.len() != 8 {
                return Err(AdmissionError::DataLengthInvalid);
            }
            Ok(())
        }
        addr if addr == SESSION_TZ_CONTRACT => {
            if !tx.value.is_zero() {
                return Err(AdmissionError::ValueNotAllowed);
            }
            if tx.data.len() != 4 {
                return Err(AdmissionError::DataLengthInvalid);
            }
            Ok(())
        }
        _ => {
            if !tx.data.is_empty() {
                return Err(AdmissionError::DataNotAllowed);
            }
            Ok(())
        }
    }
}
