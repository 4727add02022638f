//! # Observability
//!
//! - **Logging**: structured events via `tracing`, subscriber setup in [`logging`]
//! - **Metrics**: atomic counters and a chunk-duration histogram in [`metrics`]
//!
//! ```text
//!   SpectrumInterference
//!     │  tracing::trace!/debug!/warn!      metrics.chunks_evaluated.inc()
//!     ▼                                    ▼
//!   ┌─────────┐                      ┌─────────────────────┐
//!   │ Logging │                      │ InterferenceMetrics │
//!   └─────────┘                      └─────────────────────┘
//!     │                                    │
//!     ▼                                    ▼
//!   stdout (pretty/compact/json)     snapshot() / to_prometheus()
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use metrics::{Counter, Histogram, InterferenceMetrics, MetricsSnapshot};
