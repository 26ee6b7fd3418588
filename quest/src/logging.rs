//! Diagnostic tracing for the tutor, kept apart from what the learner sees.
//!
//! Narration goes through `io::console` to stdout and is always shown.
//! Tracing events go to stderr and only appear when `RUST_LOG` asks for them,
//! so a learner never sees span noise between lab prompts.

use std::io::IsTerminal;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr subscriber.
///
/// `RUST_LOG` selects what is shown; without it only warnings pass. Colors
/// are used only when stderr is a terminal. Calling this twice is harmless.
///
/// ```bash
/// RUST_LOG=quest=debug git-quest play --level 3 2> quest.log
/// ```
pub fn init() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(true)
        .compact();

    // A second call finds a subscriber already set; keep the first one.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}
