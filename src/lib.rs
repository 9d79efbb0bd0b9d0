//! Analytical pipeline for labeled customer-feedback reviews.
//!
//! Rows decoded from a spreadsheet are admitted into [`types::ReviewRecord`]s,
//! given temporal fields by [`period`], narrowed by the cascading filters in
//! [`filter`], and turned into frequency tables, time series, trend deltas and
//! paginated review lists. [`pipeline::DashboardSnapshot`] runs the whole
//! derivation for one [`pipeline::ViewState`].

pub mod aggregate;
pub mod browse;
pub mod error;
pub mod filter;
pub mod history;
pub mod loader;
pub mod output;
pub mod period;
pub mod pipeline;
pub mod trend;
pub mod types;
pub mod util;

pub use error::{DashboardError, Result};
pub use pipeline::{DashboardSnapshot, ViewState};
