use crate::domain::model::SubmissionRequest;
use crate::domain::ports::FormSubmitter;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Mutex;

/// Renders each submission as the hidden-field `<form>` a browser would post.
///
/// Live artifacts stay in the document until removed; `rendered()` keeps a
/// log of every form ever built.
#[derive(Debug, Default)]
pub struct HtmlFormSubmitter {
    live: Mutex<BTreeMap<String, String>>,
    rendered: Mutex<Vec<String>>,
}

impl HtmlFormSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(request: &SubmissionRequest) -> String {
        let mut html = String::new();
        let _ = writeln!(
            html,
            r#"<form action="{}" method="{}" target="{}" id="{}">"#,
            escape_attr(&request.destination),
            request.method,
            escape_attr(&request.target),
            escape_attr(&request.artifact_id()),
        );
        for (name, value) in &request.fields {
            let _ = writeln!(
                html,
                r#"  <input type="hidden" name="{}" value="{}">"#,
                escape_attr(name),
                escape_attr(value),
            );
        }
        html.push_str("</form>");
        html
    }

    pub fn live_artifact(&self, artifact_id: &str) -> Option<String> {
        self.live.lock().ok()?.get(artifact_id).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl FormSubmitter for HtmlFormSubmitter {
    fn submit(&self, request: &SubmissionRequest) {
        let markup = Self::render(request);
        tracing::debug!("Appending form '{}' to document", request.artifact_id());

        if let Ok(mut rendered) = self.rendered.lock() {
            rendered.push(markup.clone());
        }
        // A second post to the same target replaces the earlier form, as ids are unique.
        if let Ok(mut live) = self.live.lock() {
            live.insert(request.artifact_id(), markup);
        }
    }

    fn remove_artifact(&self, artifact_id: &str) {
        if let Ok(mut live) = self.live.lock() {
            if live.remove(artifact_id).is_some() {
                tracing::debug!("Removed form '{}'", artifact_id);
            }
        }
    }
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
