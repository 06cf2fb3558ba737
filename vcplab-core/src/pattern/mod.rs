//! Price-structure analysis: local extrema, contraction legs, VCP flags.

pub mod contraction;
pub mod extrema;
pub mod vcp;

pub use contraction::{contraction_legs, contraction_stats, ContractionStats, Leg};
pub use extrema::{alternating_extrema, local_maxima, local_minima, ExtremaPoint, ExtremumKind};
pub use vcp::{analyze_vcp, VcpCriteria, VcpFlags, VcpReading};
