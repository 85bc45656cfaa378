//! Output generation.
//!
//! - [`json`]: reads and writes the data files every pipeline produces
//! - [`dashboard`]: renders those files as a Markdown report

pub mod dashboard;
pub mod json;
