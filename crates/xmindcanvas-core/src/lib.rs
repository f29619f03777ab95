#![forbid(unsafe_code)]

//! XMind workbook parser + document model (headless).
//!
//! Design goals:
//! - tolerant of the several incompatible encodings XMind uses for the same
//!   logical tree (child lists, notes, labels)
//! - deterministic, testable outputs
//! - fatal at document scope, silent at item scope: a broken image or an odd
//!   child-list shape never aborts a parse that can still produce a workbook

pub mod error;
pub mod model;
pub mod parser;

pub use error::{Error, Result};
pub use model::{ImageResource, Sheet, TopicImage, TopicNode, Workbook};
pub use parser::WorkbookParser;
