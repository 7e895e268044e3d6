//! Utilities for Linkpilot.
//!
//! Submodules:
//! - `template`: `{placeholder}` substitution for outgoing text.
//! - `text`: keyword matching and hashtag formatting.

pub mod template;
pub mod text;
