//! Transform adapters from upstream API shapes into entity models.

pub(crate) mod drug;
