//! Indicator scoring and the IQT calculation.
//!
//! Raw metrics are bucketed into ordinal scores by [`scorer`] (with the
//! qualitative vocabularies in [`tiers`]), combined by [`iqt`] into the
//! weighted index, and classified into the four IQT bands.

pub mod iqt;
pub mod scorer;
pub mod tiers;
pub mod types;
pub mod utility;
