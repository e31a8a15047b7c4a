//! Administrative flows: template CRUD and user preference management.
//!
//! Templates and preference rows are owned by these flows; the engine
//! itself only reads them.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use pulsehub_entity::notification::{NotificationCategory, NotificationChannel};
use pulsehub_entity::preference::NotificationPreference;
use pulsehub_entity::template::NotificationTemplate;

use crate::error::{NotifyError, NotifyResult};
use crate::preference::PreferenceResolver;
use crate::store::{PreferenceStore, TemplateStore};

/// Input for creating a template.
#[derive(Debug, Clone)]
pub struct TemplateInput {
    /// Unique lookup key.
    pub key: String,
    /// Category the template produces notifications for.
    pub category: NotificationCategory,
    /// Title template.
    pub subject: String,
    /// Body template.
    pub content: String,
    /// Email body template.
    pub email_content: Option<String>,
    /// Placeholder names the template expects.
    pub variables: Vec<String>,
    /// Whether the template is usable immediately.
    pub is_active: bool,
}

/// Partial update for a template; unset fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TemplateUpdate {
    /// New lookup key.
    pub key: Option<String>,
    /// New subject template.
    pub subject: Option<String>,
    /// New body template.
    pub content: Option<String>,
    /// New email body template (`Some(None)` clears it).
    pub email_content: Option<Option<String>>,
    /// New placeholder list.
    pub variables: Option<Vec<String>>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// Template administration.
#[derive(Debug, Clone)]
pub struct TemplateAdmin {
    /// Template store.
    templates: Arc<dyn TemplateStore>,
}

impl TemplateAdmin {
    /// Create a new template admin service.
    pub fn new(templates: Arc<dyn TemplateStore>) -> Self {
        Self { templates }
    }

    /// Create a template. A duplicate key is a conflict.
    pub async fn create_template(
        &self,
        input: TemplateInput,
    ) -> NotifyResult<NotificationTemplate> {
        let now = Utc::now();
        let template = NotificationTemplate {
            id: Uuid::new_v4(),
            key: input.key,
            category: input.category,
            subject: input.subject,
            content: input.content,
            email_content: input.email_content,
            variables: input.variables,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };

        self.templates.insert(&template).await?;
        tracing::info!(template_id = %template.id, key = %template.key, "Template created");
        Ok(template)
    }

    /// Apply a partial update to a template.
    pub async fn update_template(
        &self,
        id: Uuid,
        update: TemplateUpdate,
    ) -> NotifyResult<NotificationTemplate> {
        let mut template = self
            .templates
            .find_by_id(id)
            .await?
            .ok_or_else(|| NotifyError::TemplateNotFound(id.to_string()))?;

        if let Some(key) = update.key {
            template.key = key;
        }
        if let Some(subject) = update.subject {
            template.subject = subject;
        }
        if let Some(content) = update.content {
            template.content = content;
        }
        if let Some(email_content) = update.email_content {
            template.email_content = email_content;
        }
        if let Some(variables) = update.variables {
            template.variables = variables;
        }
        if let Some(is_active) = update.is_active {
            template.is_active = is_active;
        }
        template.updated_at = Utc::now();

        self.templates.update(&template).await?;
        tracing::info!(template_id = %id, "Template updated");
        Ok(template)
    }

    /// Look a template up by its unique key.
    pub async fn get_template(&self, key: &str) -> NotifyResult<NotificationTemplate> {
        self.templates
            .find_by_key(key)
            .await?
            .ok_or_else(|| NotifyError::TemplateNotFound(key.to_string()))
    }

    /// List templates, optionally limited to one category.
    pub async fn list_templates(
        &self,
        category: Option<NotificationCategory>,
    ) -> NotifyResult<Vec<NotificationTemplate>> {
        Ok(self.templates.list(category).await?)
    }
}

/// Input for one preference row.
#[derive(Debug, Clone)]
pub struct PreferenceInput {
    /// The category this row configures.
    pub category: NotificationCategory,
    /// Channels the user allows for this category.
    pub channels: Vec<NotificationChannel>,
    /// Whether the category is enabled at all.
    pub enabled: bool,
    /// Quiet hours start, local `"HH:MM"`.
    pub quiet_hours_start: Option<String>,
    /// Quiet hours end, local `"HH:MM"`.
    pub quiet_hours_end: Option<String>,
    /// Fixed-offset timezone for quiet hours.
    pub timezone: Option<String>,
}

/// User preference administration.
#[derive(Debug, Clone)]
pub struct PreferenceAdmin {
    /// Preference store.
    prefs: Arc<dyn PreferenceStore>,
    /// Resolver whose cached rows must be dropped after writes.
    resolver: Arc<PreferenceResolver>,
}

impl PreferenceAdmin {
    /// Create a new preference admin service.
    pub fn new(prefs: Arc<dyn PreferenceStore>, resolver: Arc<PreferenceResolver>) -> Self {
        Self { prefs, resolver }
    }

    /// Replace every preference row for a user.
    ///
    /// Existing rows are deleted and recreated from the input; categories
    /// not listed end up with no row, which disables them.
    pub async fn update_preferences(
        &self,
        user_id: Uuid,
        preferences: Vec<PreferenceInput>,
    ) -> NotifyResult<Vec<NotificationPreference>> {
        let now = Utc::now();
        let rows: Vec<NotificationPreference> = preferences
            .into_iter()
            .map(|input| NotificationPreference {
                user_id,
                category: input.category,
                channels: input.channels,
                enabled: input.enabled,
                quiet_hours_start: input.quiet_hours_start,
                quiet_hours_end: input.quiet_hours_end,
                timezone: input.timezone,
                updated_at: now,
            })
            .collect();

        self.prefs.replace_all(user_id, &rows).await?;
        self.resolver.invalidate(user_id).await;

        tracing::info!(%user_id, rows = rows.len(), "Notification preferences replaced");
        Ok(rows)
    }

    /// Fetch every preference row for a user.
    pub async fn get_preferences(
        &self,
        user_id: Uuid,
    ) -> NotifyResult<Vec<NotificationPreference>> {
        Ok(self.prefs.find_all(user_id).await?)
    }
}
