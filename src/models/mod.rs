//! Data models for the lodge backend.
//!
//! Field names serialize in camelCase and enum values use the Portuguese
//! wire names the web client already speaks.

mod agenda;
mod brother;
mod contact;
mod finance;
mod minutes;
mod position;

pub use agenda::*;
pub use brother::*;
pub use contact::*;
pub use finance::*;
pub use minutes::*;
pub use position::*;

use serde::{Deserialize, Deserializer};

/// Deserializer for clearable fields of partial updates: an absent field is
/// `None` (keep), `null` is `Some(None)` (clear). Pair with `#[serde(default)]`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
