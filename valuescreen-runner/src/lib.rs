//! valuescreen runner: wires the core stages into one run and writes its
//! artifacts.
//!
//! - `pipeline`: identifiers → collect → normalize → join
//! - `export`: CSV / Parquet / manifest artifacts and reading them back

pub mod export;
pub mod pipeline;

pub use export::{load_manifest, load_screen_csv, save_artifacts, RunManifest};
pub use pipeline::{build_screen, run_pipeline, PipelineError, PipelineReport, RunOptions};
