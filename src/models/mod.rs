use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};

/// Which document this page edits. Fixed for the lifetime of the page.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DocumentIdentity {
    pub id: String,
    pub domain: String,

    /// Write credential for the domain, when the visitor has one.
    #[serde(default)]
    pub domain_key: Option<String>,
}

/// Outbound save request. Always carries the whole buffer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EditPayload {
    pub id: String,
    pub slug: String,
    pub data: String,
    pub domain: String,

    // The server reads this as a plain string; absent key is "".
    pub domain_key: String,
}

impl EditPayload {
    pub fn new(identity: &DocumentIdentity, slug: String, data: String) -> Self {
        Self {
            id: identity.id.clone(),
            slug,
            data,
            domain: identity.domain.clone(),
            domain_key: identity.domain_key.clone().unwrap_or_default(),
        }
    }

    pub fn to_json(&self) -> SyncResult<String> {
        serde_json::to_string(self).map_err(SyncError::malformed)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AckMessage {
    #[serde(rename = "unique_slug")]
    UniqueSlug,
    #[serde(rename = "not saving")]
    NotSaving,

    /// Anything this client does not understand yet.
    #[default]
    #[serde(other)]
    Other,
}

/// Server answer to a save. The server echoes its payload struct, so extra
/// fields (`data`, `domain`, ...) may be present and are ignored.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct SaveAck {
    #[serde(default)]
    pub message: AckMessage,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub id: String,
}

impl SaveAck {
    pub fn from_json(raw: &str) -> SyncResult<Self> {
        serde_json::from_str(raw).map_err(SyncError::malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncErrorKind;

    fn identity(key: Option<&str>) -> DocumentIdentity {
        DocumentIdentity {
            id: "f0a1".to_string(),
            domain: "public".to_string(),
            domain_key: key.map(str::to_string),
        }
    }

    #[test]
    fn test_edit_payload_wire_keys() {
        let p = EditPayload::new(
            &identity(Some("k-123")),
            "my-note".to_string(),
            "My Note\nbody".to_string(),
        );
        let v: serde_json::Value =
            serde_json::from_str(&p.to_json().expect("should serialize")).expect("valid json");

        assert_eq!(v["id"], "f0a1");
        assert_eq!(v["slug"], "my-note");
        assert_eq!(v["data"], "My Note\nbody");
        assert_eq!(v["domain"], "public");
        assert_eq!(v["domain_key"], "k-123");
        assert_eq!(v.as_object().map(|o| o.len()), Some(5));
    }

    #[test]
    fn test_edit_payload_missing_key_is_empty_string() {
        let p = EditPayload::new(&identity(None), String::new(), String::new());
        let v = serde_json::to_value(&p).expect("should serialize");
        assert_eq!(v["domain_key"], "");
    }

    #[test]
    fn test_unique_slug_ack_contract_deserialize() {
        // Server echoes its full payload struct back.
        let json = r#"{
            "id": "f0a1",
            "slug": "my-note",
            "data": "",
            "domain": "",
            "domain_key": "",
            "message": "unique_slug",
            "success": true
        }"#;
        let ack = SaveAck::from_json(json).expect("ack should parse");
        assert_eq!(ack.message, AckMessage::UniqueSlug);
        assert!(ack.success);
        assert_eq!(ack.slug, "my-note");
        assert_eq!(ack.id, "f0a1");
    }

    #[test]
    fn test_not_saving_ack_contract_deserialize() {
        let ack = SaveAck::from_json(r#"{"message":"not saving"}"#).expect("ack should parse");
        assert_eq!(ack.message, AckMessage::NotSaving);
        assert!(!ack.success);
        assert!(ack.slug.is_empty());
    }

    #[test]
    fn test_unknown_message_is_other() {
        let ack = SaveAck::from_json(r#"{"message":"pong","success":true}"#)
            .expect("ack should parse");
        assert_eq!(ack.message, AckMessage::Other);

        let empty = SaveAck::from_json("{}").expect("empty object should parse");
        assert_eq!(empty.message, AckMessage::Other);
    }

    #[test]
    fn test_malformed_ack_is_error() {
        for raw in ["", "not json", "[1,2]", r#"{"message":"unique_slug","success":"yes"}"#] {
            let err = SaveAck::from_json(raw).expect_err("should not parse");
            assert_eq!(err.kind, SyncErrorKind::MalformedMessage, "input {raw:?}");
        }
    }
}
