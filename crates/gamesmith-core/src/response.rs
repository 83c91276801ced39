//! Chat-completion response decoding.
//!
//! Success bodies look like `{choices:[{message:{content}}]}`; failure bodies
//! look like `{error:{code, message}}`.  Both are decoded leniently: unknown
//! fields are ignored and every field on the error path is optional.

use serde::Deserialize;

use crate::error::{GenerationError, Result};
use crate::transport::RawResponse;

/// Error code the endpoint uses when the model does not exist.
pub const MODEL_NOT_FOUND: &str = "model_not_found";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CompletionBody {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a settled response into the generated text, or the error the
/// server reported.
pub fn decode_response(response: &RawResponse) -> Result<String> {
    if !response.is_success() {
        return Err(decode_error(response));
    }

    let body: CompletionBody = serde_json::from_str(&response.body)?;
    let choice = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::Unexpected {
            reason: "missing `choices[0]` in response".into(),
        })?;

    choice
        .message
        .content
        .ok_or_else(|| GenerationError::Unexpected {
            reason: "missing `choices[0].message.content` in response".into(),
        })
}

/// Map a non-success response onto the error taxonomy.
///
/// A body that is not the documented error shape falls back to the status
/// text.
fn decode_error(response: &RawResponse) -> GenerationError {
    let detail = serde_json::from_str::<ErrorBody>(&response.body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_default();

    let message = detail
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| response.status_text.clone());

    if detail.code.as_deref() == Some(MODEL_NOT_FOUND) {
        return GenerationError::ModelUnavailable { message };
    }

    GenerationError::Generation { message }
}
