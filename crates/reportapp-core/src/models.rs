//! Wire and in-memory data types.

use serde::{Deserialize, Serialize};

/// A report category (the service calls these "types").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Type reference embedded in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportType {
    pub id: i64,
    pub name: String,
}

/// A report as held by the service.
///
/// `id` is always server-assigned. Text fields missing from a response
/// decode as empty strings; a missing or null `type` decodes as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub report_type: Option<ReportType>,
}

impl Report {
    /// Category id as the string the form picker uses; empty when untyped.
    pub fn category_value(&self) -> String {
        self.report_type
            .as_ref()
            .map(|t| t.id.to_string())
            .unwrap_or_default()
    }
}

/// The signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// A reverse-geocoded position captured while composing a report.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationDraft {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

/// In-progress fields of one report being created or edited.
///
/// `category` is the selected category id as a string; empty means
/// "no category selected". `image` is an opaque reference produced by the
/// camera capability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormDraft {
    pub title: String,
    pub category: String,
    pub description: String,
    pub image: Option<String>,
    pub location: String,
}

impl FormDraft {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Checks the fields the service requires.
    ///
    /// # Errors
    /// Returns `ClientError::Validation` naming the first missing field.
    pub fn validate(&self) -> crate::ClientResult<()> {
        if self.title.trim().is_empty() {
            return Err(crate::ClientError::Validation("title"));
        }
        if self.category.trim().is_empty() {
            return Err(crate::ClientError::Validation("category"));
        }
        Ok(())
    }
}
