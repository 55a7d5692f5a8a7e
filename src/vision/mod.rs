//! Vision analysis client: sends meal photos to the Gemini endpoint and
//! parses the structured nutrition estimate out of the model's free-form
//! reply.

mod wire;

use base64::Engine as _;
use bytes::Bytes;
use tracing::debug;

use crate::error::ApiError;
use crate::meals::model::{MealType, NutritionEstimate};
use crate::net::{HttpRequest, RequestExecutor};

use wire::{
    Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    Part,
};

const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-lite:generateContent";

/// Largest photo payload worth sending for analysis. The client itself does
/// not reject oversized images; callers downscale before invoking `analyze`.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

pub struct VisionClient {
    executor: RequestExecutor,
    api_key: String,
    endpoint: String,
}

impl VisionClient {
    pub fn new(executor: RequestExecutor, api_key: impl Into<String>) -> Self {
        Self { executor, api_key: api_key.into(), endpoint: DEFAULT_ENDPOINT.to_string() }
    }

    #[cfg(test)]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Analyze meal photos and return the estimated nutrition.
    ///
    /// Returned numbers are whatever the model produced; no plausibility
    /// clamping happens here.
    pub async fn analyze(
        &self,
        images: &[Bytes],
        description: &str,
        meal_type: MealType,
    ) -> Result<NutritionEstimate, ApiError> {
        let mut parts = vec![Part::text(build_prompt(description, meal_type))];
        for image in images {
            let encoded = base64::engine::general_purpose::STANDARD.encode(image);
            parts.push(Part::inline_image("image/jpeg", encoded));
        }

        let payload = GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig { temperature: 0.3, max_output_tokens: 500 },
        };

        let request = HttpRequest::post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)?;

        debug!(images = images.len(), meal_type = meal_type.as_str(), "requesting analysis");

        let response = match self.executor.execute(&request).await {
            Ok(response) => response,
            Err(ApiError::Http { status: 429, .. }) => return Err(ApiError::RateLimited),
            Err(ApiError::Http { status, .. }) if (500..=599).contains(&status) => {
                return Err(ApiError::ServerError(status))
            }
            Err(ApiError::Http { status, body }) => {
                let message = parse_error_message(body.as_bytes()).unwrap_or(body);
                return Err(ApiError::Http { status, body: message });
            }
            Err(other) => return Err(other),
        };

        let envelope: GenerateContentResponse =
            serde_json::from_slice(&response.body).map_err(|_| {
                let message = parse_error_message(&response.body)
                    .unwrap_or_else(|| "unexpected response format".to_string());
                ApiError::Decoding(format!("unexpected analysis response: {message}"))
            })?;

        let text = envelope.first_text().ok_or_else(|| {
            let message = parse_error_message(&response.body)
                .unwrap_or_else(|| "unexpected response format".to_string());
            ApiError::Decoding(format!("unexpected analysis response: {message}"))
        })?;

        parse_estimate(text)
    }
}

fn build_prompt(description: &str, meal_type: MealType) -> String {
    let description = if description.is_empty() { "No description provided" } else { description };
    format!(
        r#"Analyze these meal photos and estimate nutritional content.
User description: {description}
Meal type: {meal_type}

Return ONLY valid JSON with these exact keys:
- mealName: A descriptive name for this meal (string, 2-5 words)
- calories: Estimated total calories (integer)
- protein: Grams of protein (number, one decimal place)
- carbs: Grams of carbohydrates (number, one decimal place)
- fat: Grams of fat (number, one decimal place)
- keyNutrients: Notable vitamins/minerals present, comma-separated (string)

Be realistic with portions shown in photos. If multiple items visible, sum the totals.
If you cannot identify the food, make your best estimate based on what you see.

Example response:
{{"mealName": "Grilled Chicken Salad", "calories": 450, "protein": 35.0, "carbs": 20.5, "fat": 25.0, "keyNutrients": "Vitamin A, Vitamin C, Iron, Fiber"}}"#,
        meal_type = meal_type.as_str(),
    )
}

/// Strip Markdown code fences the model sometimes wraps its JSON in, then
/// decode the estimate. The error snippet is capped so a rambling reply does
/// not flood the UI.
fn parse_estimate(text: &str) -> Result<NutritionEstimate, ApiError> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    serde_json::from_str(cleaned).map_err(|_| {
        let snippet: String = cleaned.chars().take(200).collect();
        ApiError::Decoding(format!("failed to parse nutrition analysis: {snippet}"))
    })
}

fn parse_error_message(body: &[u8]) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_slice(body).ok()?;
    envelope.describe()
}
