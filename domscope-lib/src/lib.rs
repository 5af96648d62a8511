//! In-page CSS diagnostics: rule resolution, live edits, and AI
//! snapshot export for a parsed HTML document.

pub mod dom;
pub mod error;
pub mod inspect;
pub mod parser;
pub mod style;

pub use error::Error;
