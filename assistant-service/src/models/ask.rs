//! Request and response bodies for `POST /ask`.

use serde::{de::Error as _, Deserialize, Serialize};
use serde_json::Value;

/// Incoming question. A missing or `null` `text` reads as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub text: Option<String>,
}

impl AskRequest {
    /// Read a request from a decoded body. Only a JSON object is accepted.
    pub fn from_json(body: Value) -> Result<Self, serde_json::Error> {
        if body.is_object() {
            return serde_json::from_value(body);
        }

        let found = match body {
            Value::Object(_) => "an object",
            Value::Array(_) => "an array",
            Value::String(_) => "a string",
            Value::Number(_) => "a number",
            Value::Bool(_) => "a boolean",
            Value::Null => "null",
        };
        Err(serde_json::Error::custom(format!(
            "expected a JSON object, found {}",
            found
        )))
    }

    /// The question with surrounding whitespace removed.
    pub fn question(&self) -> &str {
        self.text.as_deref().unwrap_or("").trim()
    }
}

/// Reply body. `answer` is always present, including on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,

    /// Failure details, only attached in development mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<AskDebug>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskDebug {
    pub kind: String,
    pub detail: String,
}

impl AskResponse {
    pub fn answer(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            debug: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_and_null_text_read_as_empty() {
        let missing: AskRequest = serde_json::from_str("{}").unwrap();
        let null: AskRequest = serde_json::from_str(r#"{"text": null}"#).unwrap();
        assert_eq!(missing.question(), "");
        assert_eq!(null.question(), "");
    }

    #[test]
    fn question_is_trimmed() {
        let request: AskRequest = serde_json::from_str(r#"{"text": "  What is TCP?\n"}"#).unwrap();
        assert_eq!(request.question(), "What is TCP?");
    }

    #[test]
    fn non_string_text_is_rejected() {
        assert!(serde_json::from_str::<AskRequest>(r#"{"text": 42}"#).is_err());
    }

    #[test]
    fn only_objects_are_requests() {
        assert!(AskRequest::from_json(json!(["What is a deadlock?"])).is_err());
        assert!(AskRequest::from_json(json!([])).is_err());
        assert!(AskRequest::from_json(json!("What is a deadlock?")).is_err());

        let err = AskRequest::from_json(Value::Null).unwrap_err();
        assert!(err.to_string().contains("expected a JSON object, found null"));

        let request = AskRequest::from_json(json!({"text": "What is TCP?"})).unwrap();
        assert_eq!(request.question(), "What is TCP?");
    }

    #[test]
    fn debug_is_omitted_when_absent() {
        let body = serde_json::to_string(&AskResponse::answer("hi")).unwrap();
        assert_eq!(body, r#"{"answer":"hi"}"#);
    }
}
