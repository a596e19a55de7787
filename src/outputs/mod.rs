//! Output generation: card markup, the published page, and run reports.
//!
//! # Submodules
//!
//! - [`cards`]: Renders `FactCheck` results as `falsehood-card` HTML
//! - [`page`]: Splices cards into the page after the marker comment
//! - [`json`]: Writes a `RunReport` per run for later inspection
//!
//! # Output Structure
//!
//! ```text
//! index.html                 # cards inserted after <!-- FACT_CHECK_CARDS -->
//!
//! json_output_dir/
//! └── 2025-05-06/
//!     └── 091500.json        # one report per run
//! ```

pub mod cards;
pub mod json;
pub mod page;
