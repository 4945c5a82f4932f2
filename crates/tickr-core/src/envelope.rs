use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Success body wrapper used by the backend: `{ "data": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
}

impl<T> ApiEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Error body used by the backend and the stub server: `{ "message": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}

impl ApiErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new("Not Found")
    }
}

/// Decodes `{ "data": T }`.
pub fn decode_data<T: DeserializeOwned>(body: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str::<ApiEnvelope<T>>(body).map(|envelope| envelope.data)
}

/// Extracts the server message from an error body, if it has one.
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .map(|error| error.message)
        .filter(|message| !message.trim().is_empty())
}
