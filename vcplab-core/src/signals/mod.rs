//! Rule-based trade signals.

pub mod advisor;

pub use advisor::{advise, Advice, Verdict, VoteBreakdown, WARMUP_BARS};
