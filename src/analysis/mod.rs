//! Statistics over the collected article links.
//!
//! - [`ngram`]: keyword frequency over page content and URL slugs
//! - [`domain`]: link counts per site

pub mod domain;
pub mod ngram;
