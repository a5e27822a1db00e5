//! Output generation for the digest.
//!
//! # Submodules
//!
//! - [`email`]: Renders the digest into a plain-text or HTML email body
//! - [`json`]: Archives the digest as JSON (optional, `--json-output-dir`)

pub mod email;
pub mod json;
