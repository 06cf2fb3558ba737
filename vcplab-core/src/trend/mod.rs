//! Trend classification: regression slopes and the stage-two template.

pub mod slope;
pub mod template;

pub use slope::{least_squares_slope, rolling_slope};
pub use template::{evaluate, is_stage2, rs_line, TemplateInputs, TrendFlags};
