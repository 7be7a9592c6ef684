use serde_json::Value;

use super::intent::StatusIntent;
use super::merge::{MergeReport, merge};
use super::row::HEADER_LINE;

/// A save body as it travels to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavePayload {
    /// CSV text sent as-is.
    Raw(String),
    /// CSV text serialized as a JSON string literal.
    JsonWrapped(String),
}

impl SavePayload {
    /// A body that parses as a JSON string is wrapped; anything else,
    /// including other JSON values, is raw CSV.
    pub fn detect(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::String(inner)) => SavePayload::JsonWrapped(inner),
            _ => SavePayload::Raw(body.to_string()),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            SavePayload::Raw(s) | SavePayload::JsonWrapped(s) => s,
        }
    }

    pub fn is_schedule(&self) -> bool {
        self.text().contains(HEADER_LINE)
    }

    /// Same wrapping, new text.
    pub fn with_text(&self, text: String) -> Self {
        match self {
            SavePayload::Raw(_) => SavePayload::Raw(text),
            SavePayload::JsonWrapped(_) => SavePayload::JsonWrapped(text),
        }
    }

    pub fn into_body(self) -> String {
        match self {
            SavePayload::Raw(s) => s,
            SavePayload::JsonWrapped(s) => Value::String(s).to_string(),
        }
    }
}

/// Merge intents into a save body, keeping its wrapping.
///
/// The intents are only computed when the body carries a schedule; a body
/// without the header literal comes back byte-for-byte.
pub fn rewrite_body<F>(body: &str, intents: F) -> (String, Option<MergeReport>)
where
    F: FnOnce() -> Vec<StatusIntent>,
{
    let payload = SavePayload::detect(body);
    if !payload.is_schedule() {
        return (body.to_string(), None);
    }

    let report = merge(payload.text(), &intents());
    let out = payload.with_text(report.text.clone()).into_body();
    (out, Some(report))
}
