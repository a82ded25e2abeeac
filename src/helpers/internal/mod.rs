//! Internal utility modules
//!
//! Shared functionality used by the fetch helpers. Not part of the public API.

pub mod fs_utils;
pub mod hash;
pub mod progress;
pub mod url_utils;
