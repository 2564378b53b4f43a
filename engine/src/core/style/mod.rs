//! Subtitle Style Module
//!
//! Style records, default filling and the preset catalog collaborator.

mod catalog;
mod models;

pub use catalog::*;
pub use models::*;
