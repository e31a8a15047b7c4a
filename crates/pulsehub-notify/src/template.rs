//! Template rendering — substitutes named variables into stored templates.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::error::{NotifyError, NotifyResult};
use crate::store::TemplateStore;

/// Content produced by rendering a template.
#[derive(Debug, Clone)]
pub struct RenderedContent {
    /// Rendered title.
    pub title: String,
    /// Rendered body text.
    pub message: String,
    /// Rendered email body, when the template defines one.
    pub email_body: Option<String>,
}

/// Renders notification templates by `{{variable}}` substitution.
///
/// Rendering is a pure lookup-and-substitute: no side effects beyond the
/// template fetch.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    /// Template store for lookups.
    templates: Arc<dyn TemplateStore>,
}

impl TemplateRenderer {
    /// Create a new template renderer.
    pub fn new(templates: Arc<dyn TemplateStore>) -> Self {
        Self { templates }
    }

    /// Render the template with the given variables.
    ///
    /// Every `{{key}}` occurrence is replaced for every key present in the
    /// mapping. Placeholders without a matching key are left verbatim.
    /// Fails if the id does not resolve to an active template.
    pub async fn render(
        &self,
        template_id: Uuid,
        variables: &serde_json::Map<String, Value>,
    ) -> NotifyResult<RenderedContent> {
        let template = self
            .templates
            .find_by_id(template_id)
            .await?
            .filter(|t| t.is_active)
            .ok_or_else(|| NotifyError::TemplateNotFound(template_id.to_string()))?;

        Ok(RenderedContent {
            title: substitute(&template.subject, variables),
            message: substitute(&template.content, variables),
            email_body: template
                .email_content
                .as_deref()
                .map(|content| substitute(content, variables)),
        })
    }
}

/// Replace every `{{key}}` occurrence with the stringified value.
fn substitute(input: &str, variables: &serde_json::Map<String, Value>) -> String {
    let mut output = input.to_string();
    for (key, value) in variables {
        let placeholder = format!("{{{{{key}}}}}");
        if output.contains(&placeholder) {
            output = output.replace(&placeholder, &stringify(value));
        }
    }
    output
}

/// Render a JSON value for interpolation into text.
///
/// Strings are inserted verbatim; other value types use their JSON
/// representation so numbers and booleans render naturally.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
