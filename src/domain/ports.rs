use crate::domain::model::SubmissionRequest;

/// The host's form-submission primitive.
///
/// `submit` builds a transient form for the request and triggers navigation of
/// the named target. It returns immediately; the resulting navigation raises a
/// new load notification later, out of band.
pub trait FormSubmitter: Send + Sync {
    fn submit(&self, request: &SubmissionRequest);

    /// Removes the transient form. Missing artifacts are ignored.
    fn remove_artifact(&self, artifact_id: &str);
}
