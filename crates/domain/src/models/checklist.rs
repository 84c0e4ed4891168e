//! Checklist items attached to ticket types, and holders' answers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecklistKind {
    Select,
    Text,
    Link,
}

impl ChecklistKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecklistKind::Select => "select",
            ChecklistKind::Text => "text",
            ChecklistKind::Link => "link",
        }
    }
}

impl FromStr for ChecklistKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "select" => Ok(ChecklistKind::Select),
            "text" => Ok(ChecklistKind::Text),
            "link" => Ok(ChecklistKind::Link),
            _ => Err(format!("Invalid checklist kind: {}", s)),
        }
    }
}

impl fmt::Display for ChecklistKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One option of a select item. Configured either as a bare string or as
/// `{"item": "...", "limit": N}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub item: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSelectOption {
    Plain(String),
    Limited { item: String, limit: Option<i64> },
}

impl<'de> Deserialize<'de> for SelectOption {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match RawSelectOption::deserialize(deserializer)? {
            RawSelectOption::Plain(item) => SelectOption { item, limit: None },
            RawSelectOption::Limited { item, limit } => SelectOption { item, limit },
        })
    }
}

/// A named checklist item. Ids are short stable slugs shared across events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checklist {
    pub id: String,
    pub name: String,
    pub kind: ChecklistKind,
    /// Kind-specific configuration; for select items a list of options.
    pub value: Option<serde_json::Value>,
    pub is_required: bool,
    pub created_at: DateTime<Utc>,
}

impl Checklist {
    /// Parsed select options. Unparseable entries are skipped.
    pub fn select_options(&self) -> Vec<SelectOption> {
        if self.kind != ChecklistKind::Select {
            return Vec::new();
        }
        match &self.value {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| serde_json::from_value::<SelectOption>(v.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn find_option(&self, answer: &str) -> Option<SelectOption> {
        self.select_options()
            .into_iter()
            .find(|option| option.item == answer)
    }
}

/// A holder's answer to one checklist item.
///
/// At most one per (ticket, user, checklist).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistAnswer {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Option<Uuid>,
    pub checklist_id: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for submitting an answer.
#[derive(Debug, Clone, Deserialize, validator::Validate)]
pub struct SubmitAnswerRequest {
    #[validate(length(min = 1, max = 32, message = "Checklist id is required"))]
    pub checklist_id: String,
    #[validate(custom(function = "shared::validation::validate_answer_value"))]
    pub answer_value: Option<String>,
}

impl SubmitAnswerRequest {
    /// The trimmed answer, `None` when the holder wants to clear it.
    pub fn normalized_answer(&self) -> Option<&str> {
        self.answer_value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}
