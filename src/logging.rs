// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tracing setup for host binaries

use tracing_subscriber::EnvFilter;

/// Targets switched to debug by `verbose`
pub const CRATE_TARGETS: [&str; 5] = [
    "parley.session",
    "parley.events",
    "parley.provider",
    "parley.registry",
    "parley.decoder",
];

/// Filter with WARN as the floor. `RUST_LOG` directives still apply.
pub fn env_filter(verbose: bool) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into());

    if verbose {
        for target in CRATE_TARGETS {
            if let Ok(directive) = format!("{}=debug", target).parse() {
                filter = filter.add_directive(directive);
            }
        }
    }

    filter
}

/// Install a global fmt subscriber. Returns false if one was already set.
pub fn init_tracing(verbose: bool) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_filter_mentions_crate_targets() {
        let rendered = env_filter(true).to_string();
        for target in CRATE_TARGETS {
            assert!(rendered.contains(target), "missing {} in {}", target, rendered);
        }
    }

    #[test]
    fn test_verbose_filter_enables_event_target() {
        let rendered = env_filter(true).to_string();
        assert!(rendered.contains("parley.events=debug"), "{}", rendered);
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing(false);
        assert!(!init_tracing(false));
    }
}
