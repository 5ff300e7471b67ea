use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;
use tracing_tree::time::Uptime;

/// Environment variable holding the filter directives, e.g.
/// `PULSE_LOG=pulse_layout=debug`.
pub const LOG_ENV: &str = "PULSE_LOG";

const DEFAULT_DIRECTIVES: &str = "warn";

pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let tree = HierarchicalLayer::new(2)
        .with_targets(true)
        .with_bracketed_fields(true)
        .with_writer(std::io::stderr)
        .with_timer(Uptime::default());

    // A subscriber may already be installed when embedded in a host program.
    _ = Registry::default().with(filter).with(tree).try_init();
}
