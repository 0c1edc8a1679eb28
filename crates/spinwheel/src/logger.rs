//! Tracing subscriber setup for the server binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are shown at the default level.
const WORKSPACE_TARGETS: [&str; 4] = [
    "spinwheel",
    "spinwheel_room",
    "spinwheel_transport",
    "spinwheel_protocol",
];

/// Builds the default filter directive: `default_level` for every workspace
/// crate and for `binary_name`, nothing for dependencies.
pub fn default_directive(binary_name: &str, default_level: &str) -> String {
    WORKSPACE_TARGETS
        .iter()
        .copied()
        .chain(std::iter::once(binary_name))
        .map(|target| format!("{}={default_level}", target.replace('-', "_")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` overrides the default directive when it is set.
///
/// ```no_run
/// spinwheel::logger::setup_logger("spinwheel-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(binary_name, default_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_covers_workspace_and_binary() {
        let directive = default_directive("spinwheel-server", "debug");
        assert_eq!(
            directive,
            "spinwheel=debug,spinwheel_room=debug,spinwheel_transport=debug,\
             spinwheel_protocol=debug,spinwheel_server=debug"
        );
    }

    #[test]
    fn test_default_directive_parses() {
        let directive = default_directive("spinwheel-server", "info");
        assert!(tracing_subscriber::EnvFilter::try_new(directive).is_ok());
    }
}
