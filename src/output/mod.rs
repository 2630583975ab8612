mod styling;
mod summary;
mod tables;

use styling::{dim, magenta_bold};
pub use summary::{render_replay, render_scenarios, render_transitions, render_validation};

/// Prints the `qapipe` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🧪 qapipe"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("QA Test Pipeline Toolkit")
    );
}
