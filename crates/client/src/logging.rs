//! Tracing setup
//!
//! The client only emits `tracing` events and never installs a subscriber
//! itself. Applications normally bring their own; this helper is for
//! small tools that want readable output, including the `req`/`res`
//! events enabled by the `debug` config switch, without extra setup.

use tracing_subscriber::EnvFilter;

/// Filter used when `debug` is requested and `RUST_LOG` is unset
pub const DEBUG_FILTER: &str = "manta_client=debug,manta_core=debug";

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins when set. Calling this again, or after another
/// subscriber was installed, is a no-op.
pub fn init_tracing(debug: bool) {
    let default = if debug { DEBUG_FILTER } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
