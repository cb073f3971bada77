use serde::{Deserialize, Serialize};

/// Form posted by the page.
#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    /// Topic typed into the input box
    #[serde(default)]
    pub topic: String,
}

/// Request payload for the JSON generation endpoint
#[derive(Debug, Deserialize, Serialize)]
pub struct GenerateRequest {
    /// Topic to generate code for
    pub topic: String,
}

/// Error payload returned by the JSON endpoints
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
