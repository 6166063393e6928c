//! Image records served by the HTTP API.
//!
//! The image-info widget is the one piece of the admin surface that is
//! request/response rather than channel-driven: a single
//! `GET /api/v1/image/{id}` whose JSON body wraps the record in a `result`
//! envelope.

use serde::{Deserialize, Serialize};

/// Base path of the versioned image endpoint.
pub const IMAGE_ENDPOINT: &str = "/api/v1/image";

/// Full request path for one image.
pub fn image_endpoint(id: &str) -> String {
    format!("{IMAGE_ENDPOINT}/{id}")
}

/// Extract the image id from a page location path.
///
/// The id is the trailing non-empty path segment, so both
/// `/images/42` and `/images/42/` yield `42`.
pub fn image_id_from_path(path: &str) -> Option<&str> {
    path.split('/').rev().find(|segment| !segment.is_empty())
}

/// One indexed image as the backend stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: u64,
    /// Direct URL of the stored image.
    pub url: String,
    /// Page on the source board the image was indexed from.
    #[serde(default)]
    pub page_url: Option<String>,
    /// Board this image came from.
    #[serde(default)]
    pub imboard_name: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Response envelope of the image endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEnvelope {
    pub result: ImageRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_path() {
        assert_eq!(image_endpoint("42"), "/api/v1/image/42");
    }

    #[test]
    fn test_id_from_path() {
        assert_eq!(image_id_from_path("/images/42"), Some("42"));
        assert_eq!(image_id_from_path("/images/42/"), Some("42"));
        assert_eq!(image_id_from_path("/"), None);
        assert_eq!(image_id_from_path(""), None);
    }

    #[test]
    fn test_envelope_unwrap() {
        let json = r#"{
            "result": {
                "id": 42,
                "url": "https://img.example/full/42.png",
                "imboard_name": "wallhaven",
                "tags": ["landscape", "night"]
            }
        }"#;
        let envelope: ImageEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.result.id, 42);
        assert_eq!(envelope.result.imboard_name.as_deref(), Some("wallhaven"));
        assert_eq!(envelope.result.tags.len(), 2);
        assert_eq!(envelope.result.width, None);
    }
}
