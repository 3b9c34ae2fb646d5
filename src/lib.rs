#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

//! Drug identity lookup across openFDA drug labels and RxNorm.
//!
//! ```no_run
//! # async fn run() -> Result<(), ofda::OfdaError> {
//! let service = ofda::DrugService::new("my-openfda-key")?;
//! for drug in service.search("xarelto").await? {
//!     tracing::info!(unii = %drug.unii, rxcui = %drug.rxcui, "{}", drug.generic_name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;

mod entities;
mod sources;
mod transform;
mod utils;

pub use entities::drug::{DrugRecord, DrugService};
pub use error::OfdaError;
pub use utils::query::{is_safe_char, sanitize};
