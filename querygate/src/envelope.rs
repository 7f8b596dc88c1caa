//! # Response Envelope
//!
//! Every remote operation answers with the same `{status, messages, data}`
//! wrapper. The HTTP status code is secondary: a `200 OK` can carry a
//! `Failure` envelope with field-keyed validation messages, and clients are
//! expected to branch on `status`.
//!
//! ```json
//! {
//!   "status": "Failure",
//!   "messages": { "numContribuinte": ["already exists"] }
//! }
//! ```
//!
//! Messages that do not belong to a single field are stored under
//! [`ENTITY_KEY`] (`"$"`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Key used for messages about the entity as a whole.
pub const ENTITY_KEY: &str = "$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ResultStatus {
    Success,
    PartialSuccess,
    Failure,
}

/// Field path to messages, e.g. `{"nome": ["required"], "$": ["..."]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Messages(BTreeMap<String, Vec<String>>);

impl Messages {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages containing a single entity-level entry.
    pub fn entity(message: impl Into<String>) -> Self {
        let mut messages = Self::new();
        messages.add(ENTITY_KEY, message);
        messages
    }

    /// Messages containing a single entry for `field`.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut messages = Self::new();
        messages.add(field, message);
        messages
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn extend(&mut self, other: Self) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    #[must_use]
    pub fn entity_messages(&self) -> &[String] {
        self.get(ENTITY_KEY).unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl<K, V> FromIterator<(K, V)> for Messages
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut messages = Self::new();
        for (field, message) in iter {
            messages.add(field, message);
        }
        messages
    }
}

/// The `{status, messages, data}` wrapper returned by every operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    pub status: ResultStatus,
    #[serde(default)]
    pub messages: Messages,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ResponseEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: ResultStatus::Success,
            messages: Messages::new(),
            data: Some(data),
        }
    }

    /// A failure without payload.
    pub fn failure(messages: Messages) -> Self {
        Self {
            status: ResultStatus::Failure,
            messages,
            data: None,
        }
    }

    /// A failure with a single entity-level message.
    pub fn failure_message(message: impl Into<String>) -> Self {
        Self::failure(Messages::entity(message))
    }

    /// A partially completed operation.
    ///
    /// `PartialSuccess` always carries at least one message, so an empty
    /// `messages` downgrades the result to `Success`.
    pub fn partial_success(data: T, messages: Messages) -> Self {
        let status = if messages.is_empty() {
            ResultStatus::Success
        } else {
            ResultStatus::PartialSuccess
        };
        Self {
            status,
            messages,
            data: Some(data),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status == ResultStatus::Failure
    }

    /// Messages attached to `field`, empty when there are none.
    #[must_use]
    pub fn field_errors(&self, field: &str) -> &[String] {
        self.messages.get(field).unwrap_or_default()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResponseEnvelope<U> {
        ResponseEnvelope {
            status: self.status,
            messages: self.messages,
            data: self.data.map(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_without_payload_serializes_without_data() {
        let envelope: ResponseEnvelope<u32> = ResponseEnvelope::failure(Messages::field(
            "numContribuinte",
            "already exists",
        ));
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(
            value,
            json!({
                "status": "Failure",
                "messages": {"numContribuinte": ["already exists"]}
            })
        );
    }

    #[test]
    fn test_failure_without_payload_deserializes() {
        let envelope: ResponseEnvelope<Vec<u32>> =
            serde_json::from_value(json!({"status": "Failure"})).unwrap();
        assert!(envelope.is_failure());
        assert!(envelope.data.is_none());
        assert!(envelope.messages.is_empty());
    }

    #[test]
    fn test_partial_success_requires_a_message() {
        let envelope = ResponseEnvelope::partial_success(vec![1], Messages::new());
        assert_eq!(envelope.status, ResultStatus::Success);

        let envelope = ResponseEnvelope::partial_success(vec![1], Messages::field("42", "not found"));
        assert_eq!(envelope.status, ResultStatus::PartialSuccess);
        assert_eq!(envelope.field_errors("42"), ["not found".to_string()]);
    }

    #[test]
    fn test_entity_messages_use_dollar_key() {
        let envelope: ResponseEnvelope<()> = ResponseEnvelope::failure_message("Supplier not found");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["messages"]["$"][0], "Supplier not found");
        assert_eq!(envelope.messages.entity_messages(), ["Supplier not found".to_string()]);
    }

    #[test]
    fn test_messages_merge_per_field() {
        let mut messages = Messages::field("nome", "required");
        messages.extend(Messages::from_iter([("nome", "too short"), ("code", "invalid")]));

        assert_eq!(messages.get("nome").unwrap().len(), 2);
        assert_eq!(messages.get("code").unwrap(), ["invalid".to_string()]);
        assert_eq!(messages.iter().count(), 2);
    }
}
