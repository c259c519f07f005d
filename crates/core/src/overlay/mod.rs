//! Overlay metadata documents.
//!
//! Overlays are free-form JSON documents describing what a player draws on
//! top of a stream. Only a handful of keys are required; anything else the
//! client sends is stored and returned untouched.

mod sqlite;

pub use sqlite::SqliteOverlayStore;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Keys every new overlay must carry.
pub const REQUIRED_FIELDS: [&str; 5] = ["name", "content", "position", "size", "type"];

/// Error type for overlay operations.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// The document is missing fields or has malformed ones.
    #[error("{0}")]
    Validation(String),

    /// The id is not a valid overlay id.
    #[error("Invalid overlay id: {0}")]
    InvalidId(String),

    /// No overlay with this id.
    #[error("Overlay not found: {0}")]
    NotFound(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// A stored overlay: its id plus the client's document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Checks that `doc` has every required key and object-shaped geometry.
pub fn validate_new_overlay(doc: &Map<String, Value>) -> Result<(), OverlayError> {
    if !REQUIRED_FIELDS.iter().all(|key| doc.contains_key(*key)) {
        return Err(OverlayError::Validation("Missing required fields".to_string()));
    }
    if !doc["position"].is_object() || !doc["size"].is_object() {
        return Err(OverlayError::Validation(
            "Invalid position or size format".to_string(),
        ));
    }
    Ok(())
}

/// Parses and normalizes an overlay id.
pub fn parse_overlay_id(id: &str) -> Result<String, OverlayError> {
    uuid::Uuid::parse_str(id)
        .map(|uuid| uuid.to_string())
        .map_err(|_| OverlayError::InvalidId(id.to_string()))
}

/// Trait for overlay storage backends.
pub trait OverlayStore: Send + Sync {
    /// Stores a new overlay and returns its id.
    fn create(&self, doc: Map<String, Value>) -> Result<String, OverlayError>;

    /// All overlays in creation order.
    fn list(&self) -> Result<Vec<Overlay>, OverlayError>;

    /// Merges `patch` into the overlay's top-level keys. `_id` is ignored.
    fn update(&self, id: &str, patch: Map<String, Value>) -> Result<(), OverlayError>;

    /// Deletes an overlay.
    fn delete(&self, id: &str) -> Result<(), OverlayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_validate_accepts_complete_overlay() {
        let overlay = doc(json!({
            "name": "Logo",
            "content": "https://example.com/logo.png",
            "position": {"x": 10, "y": 20},
            "size": {"width": 100, "height": 50},
            "type": "image"
        }));
        assert!(validate_new_overlay(&overlay).is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let overlay = doc(json!({"name": "Logo", "content": "x"}));
        let err = validate_new_overlay(&overlay).unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields");
    }

    #[test]
    fn test_validate_rejects_non_object_geometry() {
        let overlay = doc(json!({
            "name": "Logo",
            "content": "x",
            "position": [10, 20],
            "size": {"width": 1, "height": 1},
            "type": "text"
        }));
        let err = validate_new_overlay(&overlay).unwrap_err();
        assert_eq!(err.to_string(), "Invalid position or size format");
    }

    #[test]
    fn test_parse_overlay_id() {
        assert!(parse_overlay_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(matches!(
            parse_overlay_id("not-an-id"),
            Err(OverlayError::InvalidId(_))
        ));
    }

    #[test]
    fn test_overlay_serializes_id_as_underscore_id() {
        let overlay = Overlay {
            id: "abc".to_string(),
            fields: doc(json!({"name": "Clock"})),
        };
        let value = serde_json::to_value(&overlay).unwrap();
        assert_eq!(value, json!({"_id": "abc", "name": "Clock"}));
    }
}
