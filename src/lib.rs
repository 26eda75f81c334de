//! logfacade - a small leveled logging facade
//!
//! Named loggers, a single logger threshold, per-sink thresholds and
//! conversion-pattern layouts, plus the `sender` demonstration program.

pub mod config;
pub mod logging;
pub mod sender;
