//! Driver for the ABI bridge generator.
//!
//! Wires the phases together and owns everything that touches the
//! filesystem:
//!
//! ```text
//! abigen.json ──► GenConfig
//! headers     ──► phase 1 (parallel): read, scan, parse  ──► HeaderUnit*
//!             ──► phase 2: build_graph                   ──► ResourceGraph
//!             ──► phase 3 (parallel): render trees + aggregates
//!             ──► write artifacts, mirror common resources
//! ```

pub mod cli;
mod config;
mod pipeline;
mod writer;

use std::sync::Once;

pub use config::load_config;
pub use pipeline::{load_headers, run, Options, Summary};
pub use writer::{mirror_common_resources, write_artifacts, CommonResources};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing subscriber for debugging.
///
/// Set `RUST_LOG=abi_resolve=debug` (or similar) to see per-item events.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    });
}
