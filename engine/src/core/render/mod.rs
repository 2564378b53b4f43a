//! Export Module
//!
//! Burned-in export of the captioned video.
//!
//! # Modules
//!
//! - `export`: resolution tiers, transcoder collaborator, export coordinator

mod export;

pub use export::*;
