pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{HtmlFormSubmitter, RecordingSubmitter};
pub use config::toml_config::DocumentConfig;
pub use crate::core::{
    codec::QueryStringCodec,
    controller::{ControllerSettings, RePostController},
};
pub use domain::model::{BatchReport, FrameState, LoadOutcome, SubmissionRequest, TargetElement};
pub use utils::error::{RepostError, Result};
