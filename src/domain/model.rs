use crate::utils::error::{ErrorCategory, RepostError};
use serde::{Serialize, Serializer};
use std::fmt;

/// The kind of element a load notification came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ElementKind {
    #[default]
    Iframe,
    Other(String),
}

impl ElementKind {
    pub fn from_node_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("iframe") {
            Self::Iframe
        } else {
            Self::Other(name.to_ascii_lowercase())
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iframe => f.write_str("iframe"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// An iframe-like navigation container owned by the host document.
///
/// `recorded_source_url` is captured once at construction; stripping the live
/// `src` afterwards does not change what gets re-posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetElement {
    identifier: String,
    group_name: String,
    kind: ElementKind,
    recorded_source_url: String,
    live_source: Option<String>,
}

impl TargetElement {
    pub fn new(
        identifier: impl Into<String>,
        group_name: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        let source_url = source_url.into();
        Self {
            identifier: identifier.into(),
            group_name: group_name.into(),
            kind: ElementKind::Iframe,
            live_source: Some(source_url.clone()),
            recorded_source_url: source_url,
        }
    }

    /// Shorthand for the common case of an iframe whose id and name agree.
    pub fn iframe(name: impl Into<String>, source_url: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name, source_url)
    }

    pub fn with_kind(mut self, kind: ElementKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn recorded_source_url(&self) -> &str {
        &self.recorded_source_url
    }

    pub fn live_source(&self) -> Option<&str> {
        self.live_source.as_deref()
    }

    /// Removes the live `src` so the host never performs the initial GET.
    pub fn strip_live_source(&mut self) {
        self.live_source = None;
    }
}

/// Guard state the controller keeps per element identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameState {
    pub in_progress: bool,
    pub request_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    /// The source as given, fragment removed.
    pub url: String,
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub parameter_list: Vec<(String, String)>,
}

impl ParsedUrl {
    pub fn has_parameters(&self) -> bool {
        !self.parameter_list.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post => f.write_str("post"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRequest {
    pub destination: String,
    pub method: HttpMethod,
    pub target: String,
    pub fields: Vec<(String, String)>,
}

impl SubmissionRequest {
    pub fn new(destination: String, target: String, fields: Vec<(String, String)>) -> Self {
        Self {
            destination,
            method: HttpMethod::Post,
            target,
            fields,
        }
    }

    /// Id of the transient form built for this request.
    pub fn artifact_id(&self) -> String {
        format!("form{}", self.target)
    }

    /// The fields as they would travel in the POST body.
    pub fn form_body(&self) -> String {
        crate::core::codec::QueryStringCodec::encode_fields(&self.fields)
    }
}

/// What a single load notification resulted in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// The notification was caused by our own submission and has been swallowed.
    Absorbed,
    NothingToSubmit,
    Submitted {
        request: SubmissionRequest,
        request_count: u64,
    },
}

impl LoadOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted { .. })
    }
}

#[derive(Debug, Serialize)]
pub struct BatchEntry {
    pub identifier: String,
    #[serde(flatten)]
    pub result: BatchEntryResult,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchEntryResult {
    Ok {
        outcome: LoadOutcome,
    },
    Failed {
        #[serde(serialize_with = "serialize_display")]
        error: RepostError,
    },
}

impl BatchEntryResult {
    pub fn error(&self) -> Option<&RepostError> {
        match self {
            Self::Failed { error } => Some(error),
            Self::Ok { .. } => None,
        }
    }

    pub fn error_category(&self) -> Option<ErrorCategory> {
        self.error().map(RepostError::category)
    }
}

fn serialize_display<T: fmt::Display, S: Serializer>(
    value: &T,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn submitted(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(&e.result, BatchEntryResult::Ok { outcome } if outcome.is_submitted()))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.result, BatchEntryResult::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}
