//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! session/, ledger/, config/ produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (session request counters, cache gauge)
//!
//! Consumers:
//!     → stderr (pretty or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Secrets never reach a log field; mnemonics and seeds print as redacted
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
