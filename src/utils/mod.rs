//! Internal helpers for search-term sanitizing and serde field handling.

pub(crate) mod query;
pub(crate) mod serde;
