//! Update payload model: the raw [`Update`] document, the closed [`UpdateType`] set and the typed
//! views (message, chat, user, entity) that routing needs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Result, RouteError};

/// One of the nine update kinds the platform delivers. Exactly these strings are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateType {
    Message,
    EditedMessage,
    ChannelPost,
    EditedChannelPost,
    InlineQuery,
    ChosenInlineResult,
    CallbackQuery,
    ShippingQuery,
    PreCheckoutQuery,
}

impl UpdateType {
    pub const ALL: [UpdateType; 9] = [
        UpdateType::Message,
        UpdateType::EditedMessage,
        UpdateType::ChannelPost,
        UpdateType::EditedChannelPost,
        UpdateType::InlineQuery,
        UpdateType::ChosenInlineResult,
        UpdateType::CallbackQuery,
        UpdateType::ShippingQuery,
        UpdateType::PreCheckoutQuery,
    ];

    /// Field name of this update type in the payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateType::Message => "message",
            UpdateType::EditedMessage => "edited_message",
            UpdateType::ChannelPost => "channel_post",
            UpdateType::EditedChannelPost => "edited_channel_post",
            UpdateType::InlineQuery => "inline_query",
            UpdateType::ChosenInlineResult => "chosen_inline_result",
            UpdateType::CallbackQuery => "callback_query",
            UpdateType::ShippingQuery => "shipping_query",
            UpdateType::PreCheckoutQuery => "pre_checkout_query",
        }
    }
}

impl FromStr for UpdateType {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self> {
        UpdateType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RouteError::InvalidUpdateType(s.to_string()))
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sender of a message or query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Chat (private, group, supergroup or channel) a message belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: Option<String>,
    pub title: Option<String>,
    pub username: Option<String>,
}

/// Tagged span of a message's text, e.g. a `bot_command` or a `mention`.
///
/// `offset` and `length` count UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub offset: usize,
    pub length: usize,
}

impl MessageEntity {
    pub fn new(kind: impl Into<String>, offset: usize, length: usize) -> Self {
        Self {
            kind: kind.into(),
            offset,
            length,
        }
    }

    /// Returns the substring of `text` covered by this entity, or `None` when the span is out of
    /// range or cuts through a surrogate pair.
    pub fn slice(&self, text: &str) -> Option<String> {
        let units: Vec<u16> = text.encode_utf16().collect();
        let end = self.offset.checked_add(self.length)?;
        let span = units.get(self.offset..end)?;
        String::from_utf16(span).ok()
    }
}

/// The parts of a message routing looks at. Every other field of the payload is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub text: String,
    pub chat: Option<Chat>,
    pub from: Option<User>,
    #[serde(default, deserialize_with = "lenient_entities")]
    pub entities: Vec<MessageEntity>,
}

impl Message {
    /// First entity of `kind` that starts the text. Entities elsewhere in the text never route.
    pub fn leading_entity(&self, kind: &str) -> Option<&MessageEntity> {
        self.entities
            .iter()
            .find(|e| e.kind == kind && e.offset == 0)
    }
}

/// Keeps the well-formed entries of `entities` and drops anything else.
fn lenient_entities<'de, D>(deserializer: D) -> std::result::Result<Vec<MessageEntity>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// A decoded webhook delivery. Holds the raw document; unknown fields are kept but never
/// interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Update(Value);

impl Update {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Decodes a JSON body.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(Self(serde_json::from_slice(body)?))
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// Top-level field by name; `null` counts as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn field(&self, update_type: UpdateType) -> Option<&Value> {
        self.get(update_type.as_str())
    }

    pub fn has(&self, update_type: UpdateType) -> bool {
        self.field(update_type).is_some()
    }

    /// Typed view of the `message` field.
    pub fn message(&self) -> Result<Option<Message>> {
        typed_message(self.get("message"), "message")
    }

    /// Typed view of `callback_query.message`.
    pub fn callback_query_message(&self) -> Result<Option<Message>> {
        let message = self
            .get("callback_query")
            .and_then(|q| q.get("message"))
            .filter(|v| !v.is_null());
        typed_message(message, "callback_query.message")
    }
}

fn typed_message(value: Option<&Value>, path: &str) -> Result<Option<Message>> {
    match value {
        None => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| RouteError::MalformedUpdate(format!("{}: {}", path, e))),
    }
}

impl From<Value> for Update {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_type_round_trips_all_names() {
        for t in UpdateType::ALL {
            assert_eq!(t.as_str().parse::<UpdateType>().unwrap(), t);
        }
    }

    #[test]
    fn test_update_type_rejects_unknown_name() {
        let err = "poll".parse::<UpdateType>().unwrap_err();
        assert!(matches!(err, RouteError::InvalidUpdateType(ref s) if s == "poll"));
    }

    #[test]
    fn test_update_has_ignores_null_fields() {
        let update = Update::new(json!({ "message": null, "inline_query": { "id": "1" } }));
        assert!(!update.has(UpdateType::Message));
        assert!(update.has(UpdateType::InlineQuery));
    }

    #[test]
    fn test_entity_slice_counts_utf16_units() {
        // "😀" is two UTF-16 units.
        let text = "😀 /go now";
        let entity = MessageEntity::new("bot_command", 3, 3);
        assert_eq!(entity.slice(text).as_deref(), Some("/go"));
    }

    #[test]
    fn test_entity_slice_out_of_range() {
        let entity = MessageEntity::new("bot_command", 0, 20);
        assert!(entity.slice("/hi").is_none());
    }

    #[test]
    fn test_message_tolerates_malformed_entities() {
        let update = Update::new(json!({
            "message": {
                "text": "/hello world",
                "entities": { "type": "bot_command", "offset": 0, "length": 6 },
                "extra": [1, 2, 3]
            }
        }));
        let message = update.message().unwrap().unwrap();
        assert!(message.entities.is_empty());
        assert_eq!(message.text, "/hello world");
    }

    #[test]
    fn test_leading_entity_requires_offset_zero() {
        let message = Message {
            text: "hi @bot".to_string(),
            chat: None,
            from: None,
            entities: vec![MessageEntity::new("mention", 3, 4)],
        };
        assert!(message.leading_entity("mention").is_none());
    }

    #[test]
    fn test_callback_query_message_view() {
        let update = Update::new(json!({
            "callback_query": {
                "id": "q1",
                "message": { "text": "pick", "chat": { "id": 7 }, "from": { "id": 9 } }
            }
        }));
        let message = update.callback_query_message().unwrap().unwrap();
        assert_eq!(message.chat.unwrap().id, 7);
        assert_eq!(message.from.unwrap().id, 9);
    }

    #[test]
    fn test_from_slice_rejects_invalid_json() {
        let err = Update::from_slice(b"{not json").unwrap_err();
        assert!(matches!(err, RouteError::MalformedUpdate(_)));
    }
}
