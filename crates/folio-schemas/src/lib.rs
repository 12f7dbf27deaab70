//! Wire and storage shapes for the artworks catalog.
//!
//! Field names follow the JSON the portfolio frontend already consumes
//! (`imageUrl`, `type`, `order`). No business logic lives here beyond
//! field-level validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned artwork identifier (`SERIAL` primary key).
pub type ArtworkId = i32;

pub const TITLE_MAX_CHARS: usize = 255;
pub const KIND_MAX_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// Artwork
// ---------------------------------------------------------------------------

/// Display metadata. Opaque to the order reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkFields {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Produced by the upload collaborator; never interpreted here.
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl ArtworkFields {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            image_url: None,
            project: None,
            year: None,
            kind: None,
        }
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        if self.title.trim().is_empty() {
            return Err(FieldError::Required("title"));
        }
        if self.title.chars().count() > TITLE_MAX_CHARS {
            return Err(FieldError::TooLong {
                field: "title",
                max: TITLE_MAX_CHARS,
            });
        }
        if let Some(kind) = &self.kind {
            if kind.chars().count() > KIND_MAX_CHARS {
                return Err(FieldError::TooLong {
                    field: "type",
                    max: KIND_MAX_CHARS,
                });
            }
        }
        Ok(())
    }
}

/// A stored artwork as returned by every read endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    pub id: ArtworkId,
    #[serde(flatten)]
    pub fields: ArtworkFields,
    /// 1-based display position.
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for create (POST) and replace (PUT).
///
/// `order` absent means "append at end" on create and "keep position" on
/// replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkInput {
    #[serde(flatten)]
    pub fields: ArtworkFields,
    #[serde(default)]
    pub order: Option<i32>,
}

// ---------------------------------------------------------------------------
// Reorder
// ---------------------------------------------------------------------------

/// One explicit `(id, order)` assignment of a reorder request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMove {
    pub id: ArtworkId,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub items: Vec<OrderMove>,
}

// ---------------------------------------------------------------------------
// FieldError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Required(&'static str),
    TooLong { field: &'static str, max: usize },
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldError::Required(field) => write!(f, "field '{field}' is required"),
            FieldError::TooLong { field, max } => {
                write!(f, "field '{field}' exceeds {max} characters")
            }
        }
    }
}

impl std::error::Error for FieldError {}
