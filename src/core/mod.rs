pub mod codec;
pub mod controller;

pub use crate::domain::model::{LoadOutcome, ParsedUrl, SubmissionRequest, TargetElement};
pub use crate::domain::ports::FormSubmitter;
pub use crate::utils::error::Result;
