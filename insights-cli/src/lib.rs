//! The `genomic-insights` pipeline as a library, so the binary stays thin
//! and the stages can be tested directly.

pub mod args;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod settings;

pub use args::Args;
pub use logging::{init_tracing, Verbosity};
pub use pipeline::{analyze, render_charts, run, Analysis};
pub use settings::Settings;
