//! Decision-model (VSE) artifacts: file naming, export of trained
//! preprocessors and policies, and zip bundles of artifact directories.

pub mod archive;
pub mod export;
pub mod naming;

pub use archive::{export_archive, import_archive};
pub use export::{load_preprocessor, save_policy_tflite, save_preprocessor, ModelConverter};
