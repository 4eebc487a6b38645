use crate::core::codec::QueryStringCodec;
use crate::domain::model::{
    BatchEntry, BatchEntryResult, BatchReport, ElementKind, FrameState, LoadOutcome,
    SubmissionRequest, TargetElement,
};
use crate::domain::ports::FormSubmitter;
use crate::utils::error::{RepostError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_ARTIFACT_CLEANUP_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_INTER_ELEMENT_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Strip the live `src` on attach so the host never issues the initial GET.
    pub suppress_initial_navigation: bool,
    pub artifact_cleanup_delay: Duration,
    pub codec: QueryStringCodec,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            suppress_initial_navigation: false,
            artifact_cleanup_delay: DEFAULT_ARTIFACT_CLEANUP_DELAY,
            codec: QueryStringCodec::new(),
        }
    }
}

/// Turns GET navigations of iframes into POST submissions of the same fields.
///
/// Guard state lives here, keyed by element identifier: once a submission is
/// dispatched the element is marked in progress, and the load notification
/// that submission causes clears the mark instead of posting again.
pub struct RePostController<F: FormSubmitter + 'static> {
    submitter: Arc<F>,
    settings: ControllerSettings,
    states: HashMap<String, FrameState>,
}

impl<F: FormSubmitter + 'static> RePostController<F> {
    pub fn new(submitter: Arc<F>) -> Self {
        Self::with_settings(submitter, ControllerSettings::default())
    }

    pub fn with_settings(submitter: Arc<F>, settings: ControllerSettings) -> Self {
        Self {
            submitter,
            settings,
            states: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn state_of(&self, identifier: &str) -> FrameState {
        self.states.get(identifier).copied().unwrap_or_default()
    }

    /// Initial readiness of an element.
    pub fn attach(&mut self, element: &mut TargetElement) -> Result<LoadOutcome> {
        if self.settings.suppress_initial_navigation {
            tracing::debug!("Suppressing initial navigation of '{}'", element.identifier());
            element.strip_live_source();
        }
        self.handle_load_or_ready(element)
    }

    pub fn handle_load_or_ready(&mut self, element: &TargetElement) -> Result<LoadOutcome> {
        if let Some(state) = self.states.get_mut(element.identifier()) {
            if state.in_progress {
                state.in_progress = false;
                tracing::debug!(
                    "Absorbed load notification caused by our own post to '{}'",
                    element.identifier()
                );
                return Ok(LoadOutcome::Absorbed);
            }
        }

        let Some(request) = self.plan(element)? else {
            tracing::debug!(
                "No query string on '{}', nothing to post",
                element.identifier()
            );
            return Ok(LoadOutcome::NothingToSubmit);
        };

        // The mark must be in place before dispatch so the resulting load is absorbed.
        let state = self.states.entry(element.identifier().to_string()).or_default();
        state.in_progress = true;
        self.submitter.submit(&request);
        state.request_count += 1;
        let request_count = state.request_count;

        tracing::info!(
            "Posted {} field(s) to {} for frame '{}' (post #{})",
            request.fields.len(),
            request.destination,
            request.target,
            request_count
        );

        self.schedule_cleanup(request.artifact_id());

        Ok(LoadOutcome::Submitted {
            request,
            request_count,
        })
    }

    /// Decides what would be posted for `element` without touching any state.
    ///
    /// `Ok(None)` means the source has no query string. Element validation runs
    /// before the URL is parsed.
    pub fn plan(&self, element: &TargetElement) -> Result<Option<SubmissionRequest>> {
        let clean_url = QueryStringCodec::strip_fragment(element.recorded_source_url());
        if !QueryStringCodec::has_query_component(clean_url) {
            return Ok(None);
        }

        validate_target(element)?;

        let parsed = self.settings.codec.parse(clean_url)?;
        Ok(Some(SubmissionRequest::new(
            QueryStringCodec::destination_of(&parsed),
            element.identifier().to_string(),
            QueryStringCodec::parameters_of(&parsed)?,
        )))
    }

    /// Strips every live source first, then handles the elements one at a
    /// time with `inter_element_delay` between consecutive elements.
    ///
    /// A failing element is recorded in the report and does not stop the batch.
    pub async fn process_all(
        &mut self,
        elements: &mut [TargetElement],
        inter_element_delay: Duration,
    ) -> BatchReport {
        for element in elements.iter_mut() {
            element.strip_live_source();
        }

        let mut report = BatchReport::default();
        for (index, element) in elements.iter().enumerate() {
            if index > 0 && !inter_element_delay.is_zero() {
                tokio::time::sleep(inter_element_delay).await;
            }

            let result = match self.handle_load_or_ready(element) {
                Ok(outcome) => BatchEntryResult::Ok { outcome },
                Err(e) => {
                    tracing::warn!("Frame '{}' was not posted: {}", element.identifier(), e);
                    BatchEntryResult::Failed { error: e }
                }
            };
            report.entries.push(BatchEntry {
                identifier: element.identifier().to_string(),
                result,
            });
        }

        tracing::info!(
            "Batch finished: {} of {} frame(s) posted",
            report.submitted(),
            report.entries.len()
        );
        report
    }

    fn schedule_cleanup(&self, artifact_id: String) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No runtime available, leaving form '{}' in place", artifact_id);
            return;
        };

        let submitter = Arc::clone(&self.submitter);
        let delay = self.settings.artifact_cleanup_delay;
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            submitter.remove_artifact(&artifact_id);
        });
    }
}

pub fn validate_target(element: &TargetElement) -> Result<()> {
    if let ElementKind::Other(name) = element.kind() {
        return Err(RepostError::invalid_target(
            element.identifier(),
            format!("supplied element is a <{}>, not an iframe", name),
        ));
    }

    if element.identifier().is_empty() || element.group_name().is_empty() {
        return Err(RepostError::invalid_target(
            element.identifier(),
            "iframe id and name must not be empty",
        ));
    }

    if element.identifier() != element.group_name() {
        return Err(RepostError::invalid_target(
            element.identifier(),
            format!(
                "id '{}' and name '{}' must be the same",
                element.identifier(),
                element.group_name()
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::recording::RecordingSubmitter;
    use crate::utils::error::ErrorCategory;

    fn controller() -> (Arc<RecordingSubmitter>, RePostController<RecordingSubmitter>) {
        let submitter = Arc::new(RecordingSubmitter::new());
        let controller = RePostController::new(Arc::clone(&submitter));
        (submitter, controller)
    }

    #[test]
    fn test_submits_once_then_absorbs_own_reload() {
        let (submitter, mut controller) = controller();
        let frame = TargetElement::iframe("results", "https://example.com/search?q=rust");

        let first = controller.handle_load_or_ready(&frame).unwrap();
        assert!(first.is_submitted());
        assert!(controller.state_of("results").in_progress);

        let second = controller.handle_load_or_ready(&frame).unwrap();
        assert_eq!(second, LoadOutcome::Absorbed);
        assert!(!controller.state_of("results").in_progress);

        assert_eq!(submitter.len(), 1);
    }

    #[test]
    fn test_next_navigation_after_absorb_posts_again() {
        let (submitter, mut controller) = controller();
        let frame = TargetElement::iframe("results", "https://example.com/search?q=rust");

        controller.handle_load_or_ready(&frame).unwrap();
        controller.handle_load_or_ready(&frame).unwrap();
        let third = controller.handle_load_or_ready(&frame).unwrap();

        assert_eq!(
            third,
            LoadOutcome::Submitted {
                request: submitter.requests()[1].clone(),
                request_count: 2,
            }
        );
        assert_eq!(controller.state_of("results").request_count, 2);
    }

    #[test]
    fn test_source_without_query_is_a_no_op() {
        let (submitter, mut controller) = controller();
        let frame = TargetElement::iframe("page", "https://example.com/page");

        let outcome = controller.handle_load_or_ready(&frame).unwrap();

        assert_eq!(outcome, LoadOutcome::NothingToSubmit);
        assert!(submitter.is_empty());
        assert_eq!(controller.state_of("page"), FrameState::default());
    }

    #[test]
    fn test_mismatched_id_and_name_is_rejected_before_submission() {
        let (submitter, mut controller) = controller();
        let frame = TargetElement::new("frameA", "frameB", "https://example.com/a?x=1");

        let err = controller.handle_load_or_ready(&frame).unwrap_err();

        assert!(matches!(err, RepostError::InvalidTarget { .. }));
        assert!(submitter.is_empty());
        assert!(!controller.state_of("frameA").in_progress);
    }

    #[test]
    fn test_empty_identity_is_rejected() {
        let (_, controller) = controller();

        let no_id = TargetElement::new("", "", "https://example.com/a?x=1");
        assert!(matches!(
            controller.plan(&no_id),
            Err(RepostError::InvalidTarget { .. })
        ));

        let no_name = TargetElement::new("frameA", "", "https://example.com/a?x=1");
        assert!(matches!(
            controller.plan(&no_name),
            Err(RepostError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_non_iframe_element_is_rejected() {
        let (_, controller) = controller();
        let div = TargetElement::iframe("box", "https://example.com/a?x=1")
            .with_kind(ElementKind::from_node_name("DIV"));

        let err = controller.plan(&div).unwrap_err();
        assert!(err.to_string().contains("<div>"));
    }

    #[test]
    fn test_invalid_target_without_query_is_still_a_no_op() {
        let (_, controller) = controller();
        let frame = TargetElement::new("frameA", "frameB", "https://example.com/page");

        assert!(controller.plan(&frame).unwrap().is_none());
    }

    #[test]
    fn test_malformed_url_propagates_and_leaves_state_clear() {
        let (submitter, mut controller) = controller();
        let frame = TargetElement::iframe("broken", "https://exa mple.com/a?x=1");

        let err = controller.handle_load_or_ready(&frame).unwrap_err();

        assert!(matches!(err, RepostError::InvalidUrl { .. }));
        assert!(submitter.is_empty());
        assert!(!controller.state_of("broken").in_progress);
    }

    #[test]
    fn test_process_all_reports_url_and_target_errors_apart() {
        let (_, mut controller) = controller();
        let mut frames = vec![
            TargetElement::iframe("latin1", "https://example.com/a?name=Jos%E9"),
            TargetElement::new("frameA", "frameB", "https://example.com/b?x=1"),
        ];

        let report = tokio_test::block_on(controller.process_all(&mut frames, Duration::ZERO));

        let categories: Vec<_> = report
            .entries
            .iter()
            .map(|e| e.result.error_category())
            .collect();
        assert_eq!(
            categories,
            vec![Some(ErrorCategory::Input), Some(ErrorCategory::Target)]
        );
    }

    #[test]
    fn test_empty_query_pieces_still_post_fields() {
        let (submitter, mut controller) = controller();
        let frame = TargetElement::iframe("blank", "https://example.com/a?&&");

        let outcome = controller.handle_load_or_ready(&frame).unwrap();

        assert!(outcome.is_submitted());
        let requests = submitter.requests();
        assert_eq!(requests[0].fields.len(), 3);
        assert!(requests[0].fields.iter().all(|(n, v)| n.is_empty() && v.is_empty()));
    }

    #[test]
    fn test_plan_end_to_end_scenario() {
        let (_, controller) = controller();
        let frame = TargetElement::iframe(
            "results",
            "https://example.com/search?q=hello%20world&tag=a&tag=b#frag",
        );

        let request = controller.plan(&frame).unwrap().unwrap();

        assert_eq!(request.destination, "https://example.com/search");
        assert_eq!(request.target, "results");
        assert_eq!(
            request.fields,
            vec![
                ("q".to_string(), "hello world".to_string()),
                ("tag".to_string(), "a".to_string()),
                ("tag".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_attach_strips_live_source_when_suppressing() {
        let submitter = Arc::new(RecordingSubmitter::new());
        let settings = ControllerSettings {
            suppress_initial_navigation: true,
            ..ControllerSettings::default()
        };
        let mut controller = RePostController::with_settings(Arc::clone(&submitter), settings);
        let mut frame = TargetElement::iframe("results", "https://example.com/search?q=1");

        let outcome = controller.attach(&mut frame).unwrap();

        assert!(outcome.is_submitted());
        assert_eq!(frame.live_source(), None);
        assert_eq!(submitter.len(), 1);
    }

    #[test]
    fn test_attach_keeps_live_source_by_default() {
        let (_, mut controller) = controller();
        let mut frame = TargetElement::iframe("results", "https://example.com/search?q=1");

        controller.attach(&mut frame).unwrap();

        assert_eq!(frame.live_source(), Some("https://example.com/search?q=1"));
    }

    #[test]
    fn test_guard_state_is_per_element() {
        let (submitter, mut controller) = controller();
        let a = TargetElement::iframe("a", "https://example.com/a?x=1");
        let b = TargetElement::iframe("b", "https://example.com/b?y=2");

        controller.handle_load_or_ready(&a).unwrap();
        let outcome = controller.handle_load_or_ready(&b).unwrap();

        assert!(outcome.is_submitted());
        assert!(controller.state_of("a").in_progress);
        assert_eq!(submitter.len(), 2);
    }

    #[tokio::test]
    async fn test_artifact_removed_after_cleanup_delay() {
        let submitter = Arc::new(RecordingSubmitter::new());
        let settings = ControllerSettings {
            artifact_cleanup_delay: Duration::from_millis(10),
            ..ControllerSettings::default()
        };
        let mut controller = RePostController::with_settings(Arc::clone(&submitter), settings);
        let frame = TargetElement::iframe("results", "https://example.com/search?q=1");

        controller.handle_load_or_ready(&frame).unwrap();
        assert!(submitter.removed_artifacts().is_empty());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(submitter.removed_artifacts(), vec!["formresults".to_string()]);
    }

    #[tokio::test]
    async fn test_process_all_strips_sources_and_collects_failures() {
        let (submitter, mut controller) = controller();
        let mut frames = vec![
            TargetElement::iframe("one", "https://example.com/one?a=1"),
            TargetElement::iframe("plain", "https://example.com/plain"),
            TargetElement::new("left", "right", "https://example.com/two?b=2"),
            TargetElement::iframe("three", "https://example.com/three?c=3"),
        ];

        let report = controller
            .process_all(&mut frames, Duration::from_millis(1))
            .await;

        assert!(frames.iter().all(|f| f.live_source().is_none()));
        assert_eq!(report.entries.len(), 4);
        assert_eq!(report.submitted(), 2);
        assert_eq!(report.failures().count(), 1);
        let failure = report.failures().next().unwrap();
        assert_eq!(failure.identifier, "left");
        assert!(matches!(
            failure.result,
            BatchEntryResult::Failed {
                error: RepostError::InvalidTarget { .. }
            }
        ));

        let targets: Vec<String> = submitter.requests().into_iter().map(|r| r.target).collect();
        assert_eq!(targets, vec!["one".to_string(), "three".to_string()]);
    }
}
