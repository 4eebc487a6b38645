// Adapters layer: concrete form submitters standing in for the host document.

pub mod html;
pub mod recording;

pub use html::HtmlFormSubmitter;
pub use recording::{RecordedSubmission, RecordingSubmitter};
