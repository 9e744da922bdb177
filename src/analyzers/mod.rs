//! Aggregate reports over the survey table.
//!
//! Missing-value rates, category frequencies, descriptive statistics,
//! phonological section totals, chart distributions and the per-enumerator
//! summary. Every function here is pure: the same table yields the same
//! report.

pub mod describe;
pub mod distribution;
pub mod enumerator;
pub mod frequency;
pub mod missing;
pub mod totals;
pub mod utility;
