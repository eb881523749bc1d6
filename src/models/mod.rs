//! Data models for descil-mturk
//!
//! Core abstractions:
//! - `AccessCodeRecord`: one access code and its local session state
//! - `CodeResult`: the outcome of a session, posted back in bulk
//! - `Operation`: the service's operation vocabulary
//! - `ServiceRequest` / `ServiceResponse`: the wire envelopes

pub mod access_code;
pub mod operation;
pub mod wire;

pub use access_code::{AccessCodeRecord, CodeResult};
pub use operation::Operation;
pub use wire::{ServiceRequest, ServiceResponse};

use serde::{Deserialize, Deserializer, Serializer};

/// Serialize a money amount, as an integer when it has no fractional part
#[allow(clippy::trivially_copy_pass_by_ref, clippy::cast_possible_truncation)]
pub(crate) fn serialize_amount<S: Serializer>(
    amount: &f64,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    if amount.fract() == 0.0 && amount.abs() < 9.0e15 {
        serializer.serialize_i64(*amount as i64)
    } else {
        serializer.serialize_f64(*amount)
    }
}

/// Whether a money amount is usable: finite and not negative
#[must_use]
pub const fn is_valid_amount(amount: f64) -> bool {
    amount.is_finite() && amount >= 0.0
}

/// Deserialize a field that the service may send as `null`
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a flag that defaults to `true`, also when sent as `null`
pub(crate) fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}
