use crate::domain::model::SubmissionRequest;
use crate::domain::ports::FormSubmitter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone, Serialize)]
pub struct RecordedSubmission {
    pub dispatched_at: DateTime<Utc>,
    pub request: SubmissionRequest,
}

/// Keeps every dispatched request instead of navigating anything.
#[derive(Debug, Default)]
pub struct RecordingSubmitter {
    submissions: Mutex<Vec<RecordedSubmission>>,
    removed: Mutex<Vec<String>>,
}

impl RecordingSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<SubmissionRequest> {
        self.submissions()
            .into_iter()
            .map(|s| s.request)
            .collect()
    }

    pub fn removed_artifacts(&self) -> Vec<String> {
        self.removed.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.submissions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FormSubmitter for RecordingSubmitter {
    fn submit(&self, request: &SubmissionRequest) {
        if let Ok(mut submissions) = self.submissions.lock() {
            submissions.push(RecordedSubmission {
                dispatched_at: Utc::now(),
                request: request.clone(),
            });
        }
    }

    fn remove_artifact(&self, artifact_id: &str) {
        if let Ok(mut removed) = self.removed.lock() {
            removed.push(artifact_id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_dispatch_order() {
        let submitter = RecordingSubmitter::new();
        let first = SubmissionRequest::new("https://a.example.com/".into(), "a".into(), vec![]);
        let second = SubmissionRequest::new("https://b.example.com/".into(), "b".into(), vec![]);

        submitter.submit(&first);
        submitter.submit(&second);

        let recorded = submitter.submissions();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].request, first);
        assert!(recorded[0].dispatched_at <= recorded[1].dispatched_at);
    }
}
