//! Heartbeat Monitor: scheduled liveness check for a backend queue
//!
//! Each invocation polls a remote API for its heartbeat timestamp, compares it
//! with the value seen by the previous run and raises a rate-limited alert
//! when the timestamp stops advancing. The process is meant to be started by
//! an external scheduler and exits after one cycle.
//!
//! # Components
//!
//! - **Observation source**: guest-token exchange plus heartbeat fetch
//! - **Evaluator**: pure up/down state machine over the persisted records
//! - **Throttle**: cooldown between alerts of one outage, reset on recovery
//! - **Notifier**: Slack incoming webhook, or the log when none is configured
//! - **State store**: three small files that survive between runs
//!
//! # Example
//!
//! ```no_run
//! use heartbeat_monitor::alerts::{Notifier, NotifyTarget};
//! use heartbeat_monitor::config::MonitorConfig;
//! use heartbeat_monitor::monitor::{run_once, RunContext};
//! use heartbeat_monitor::source::ApiSource;
//! use heartbeat_monitor::state::FileStateStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MonitorConfig::from_env()?;
//! let source = ApiSource::new(&config)?;
//! let notifier = Notifier::new(NotifyTarget::from_config(&config))?;
//! let store = FileStateStore::new(
//!     &config.heartbeat_file,
//!     &config.status_file,
//!     &config.throttle_file,
//! );
//!
//! let ctx = RunContext {
//!     config: &config,
//!     source: &source,
//!     notifier: &notifier,
//!     store: &store,
//! };
//! let report = run_once(&ctx, chrono::Utc::now()).await?;
//! println!("{}", report.decision);
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod config;
pub mod monitor;
pub mod source;
pub mod state;

// Re-export commonly used types
pub use config::{ConfigError, MonitorConfig};
pub use monitor::runner::MonitorError;
pub use monitor::{run_once, Decision, RunContext, RunReport, Status};
pub use state::{FileStateStore, StateError, StateStore};
