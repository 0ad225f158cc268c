//! Deterministic test support for the Wardline security core.
//!
//! [`SimEnv`] replaces the OS random source with a seeded stream so key
//! material and handshakes are reproducible. The recording collaborators
//! stand in for the message builder in integration tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod collaborators;
pub mod fixtures;
pub mod sim_env;

pub use collaborators::{DelayedCryptoContext, RecordingDebugContext, RecordingTokenBuilder};
pub use fixtures::{TEST_RSA_BITS, default_key_store, key_exchange_context, peers};
pub use sim_env::SimEnv;

/// Install a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry().with(fmt::layer().with_test_writer()).with(filter).try_init();
}
