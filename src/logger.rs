use std::sync::Once;

use env_logger::{Builder, Target};
use log::LevelFilter;

static INIT: Once = Once::new();

/// Installs the global logger once. Output goes to stderr so it never mixes
/// with the lookup loop on stdout; `RUST_LOG` overrides the levels below.
pub fn initialize_logger() {
    INIT.call_once_force(|_| {
        let mut builder = Builder::new();

        builder
            .filter_level(LevelFilter::Warn)
            .filter_module("forecast_index", LevelFilter::Info)
            .target(Target::Stderr)
            .format_timestamp_millis()
            .parse_default_env();

        // Another logger may already be installed, e.g. by a test harness.
        let _ = builder.try_init();
    });
}
