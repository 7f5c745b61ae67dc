//! Post lifecycle event payloads.
//!
//! Field names match the JSON already on the wire between the post,
//! audit and search services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::enums::{OfficialTag, PostStatus};

/// One reason a post was rejected by moderation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionDetail {
    pub label: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suggestion: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub score: f64,

    #[serde(
        rename = "matchedContent",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub matched_content: Vec<String>,
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

/// Full post snapshot carried by audit and approval events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostData {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_avatar: String,
    pub author_username: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    pub status: PostStatus,
    pub view_count: i64,
    pub official_tag: OfficialTag,
    pub price_per_unit: f64,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub contact_qr_code: String,

    /// Unix seconds.
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostPendingAuditEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub post: PostData,
}

impl PostPendingAuditEvent {
    pub fn new(post: PostData) -> Self {
        Self {
            event_id: new_event_id(),
            timestamp: Utc::now(),
            post,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostApprovedEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub post: PostData,
}

impl PostApprovedEvent {
    pub fn new(post: PostData) -> Self {
        Self {
            event_id: new_event_id(),
            timestamp: Utc::now(),
            post,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRejectedEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub post_id: u64,
    pub suggestion: String,
    pub details: Vec<RejectionDetail>,
}

impl PostRejectedEvent {
    pub fn new(post_id: u64, suggestion: impl Into<String>, details: Vec<RejectionDetail>) -> Self {
        Self {
            event_id: new_event_id(),
            timestamp: Utc::now(),
            post_id,
            suggestion: suggestion.into(),
            details,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDeletedEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub post_id: u64,
}

impl PostDeletedEvent {
    pub fn new(post_id: u64) -> Self {
        Self {
            event_id: new_event_id(),
            timestamp: Utc::now(),
            post_id,
        }
    }
}

fn new_event_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post() -> PostData {
        PostData {
            id: 42,
            title: "Bike for sale".into(),
            content: "Barely used".into(),
            author_id: "u-1".into(),
            author_avatar: "https://cdn.example/a.png".into(),
            author_username: "lee".into(),
            tags: Vec::new(),
            status: PostStatus::Pending,
            view_count: 0,
            official_tag: OfficialTag::Certified,
            price_per_unit: 120.5,
            contact_qr_code: String::new(),
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_post_data_wire_format() {
        let value = serde_json::to_value(post()).unwrap();
        assert_eq!(value["status"], json!(0));
        assert_eq!(value["official_tag"], json!(1));
        assert!(value.get("tags").is_none());
        assert!(value.get("contact_qr_code").is_none());
    }

    #[test]
    fn test_rejection_detail_field_names() {
        let detail = RejectionDetail {
            label: "spam".into(),
            suggestion: String::new(),
            score: 0.93,
            matched_content: vec!["buy now".into()],
        };
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(
            value,
            json!({"label": "spam", "score": 0.93, "matchedContent": ["buy now"]})
        );
    }

    #[test]
    fn test_events_get_unique_ids() {
        let a = PostDeletedEvent::new(1);
        let b = PostDeletedEvent::new(1);
        assert_ne!(a.event_id, b.event_id);
        assert!(Uuid::parse_str(&a.event_id).is_ok());
    }

    #[test]
    fn test_rejected_event_parses_minimal_details() {
        let event: PostRejectedEvent = serde_json::from_value(json!({
            "event_id": "e-1",
            "timestamp": "2024-05-01T08:00:00Z",
            "post_id": 9,
            "suggestion": "block",
            "details": [{"label": "ad"}]
        }))
        .unwrap();
        assert_eq!(event.details[0].label, "ad");
        assert_eq!(event.details[0].score, 0.0);
    }

    #[test]
    fn test_approved_event_carries_post() {
        let event = PostApprovedEvent::new(post());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["post"]["id"], json!(42));
        assert!(value["timestamp"].is_string());
    }
}
