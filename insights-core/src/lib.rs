//! Shared primitives for the Genomic Insights toolkit.
//!
//! `insights-core` is the foundation the other workspace crates build on:
//!
//! - **Error types**: [`InsightsError`] and [`Result`] for structured error handling
//! - **Traits**: [`Sequence`], [`Annotated`], [`Summarizable`]

pub mod error;
pub mod traits;

pub use error::{InsightsError, Result};
pub use traits::*;
