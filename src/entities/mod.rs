//! Entity-level lookup workflows.

pub(crate) mod drug;
