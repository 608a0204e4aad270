//! Tracing targets.
//!
//! restlink logs through the `tracing` crate and never installs a
//! subscriber. To see its output, install one in your application and filter
//! on the targets below:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("restlink::connection=debug")
//!     .init();
//! ```

/// Target names for log filtering.
pub mod targets {
    /// Request dispatch and outcome classification.
    pub const CONNECTION: &str = "restlink::connection";
    /// Wire-level transport activity.
    pub const TRANSPORT: &str = "restlink::transport";
}
