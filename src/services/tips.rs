// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tip advisor: heuristic suggestions with an optional LLM-generated tip.
//!
//! The heuristic path is pure and always available. The LLM path is a
//! single bounded-timeout attempt; any failure falls back to the heuristic
//! tip and never surfaces to the caller.

use serde::{Deserialize, Serialize};

use crate::services::emissions::EmissionBreakdown;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 200;
/// The tip call must never hold up a request for long.
const TIP_TIMEOUT_SECS: u64 = 5;

/// Fixed number of suggestions returned to the frontend.
const SUGGESTION_COUNT: usize = 5;

// Per-category thresholds (kg CO2) above which a targeted suggestion fires.
const TRANSPORTATION_THRESHOLD: f64 = 50.0;
const FOOD_THRESHOLD: f64 = 100.0;
const ELECTRICITY_THRESHOLD: f64 = 30.0;
const WASTE_THRESHOLD: f64 = 10.0;

/// Qualitative label for a total emission figure.
pub fn emission_level(total: f64) -> &'static str {
    if total < 100.0 {
        "excellent"
    } else if total < 150.0 {
        "good"
    } else if total < 200.0 {
        "moderate"
    } else {
        "high"
    }
}

/// Category-targeted suggestions padded with generic ones to a fixed count.
pub fn suggestions(breakdown: &EmissionBreakdown) -> Vec<String> {
    let mut out: Vec<&'static str> = Vec::with_capacity(SUGGESTION_COUNT);

    if breakdown.transportation > TRANSPORTATION_THRESHOLD {
        out.push("Try cycling, walking, or public transport for short trips instead of driving.");
    }
    if breakdown.food > FOOD_THRESHOLD {
        out.push("Swap a few meat-based meals each week for vegetarian options.");
    }
    if breakdown.electricity > ELECTRICITY_THRESHOLD {
        out.push("Unplug idle electronics and switch your remaining bulbs to LEDs.");
    }
    if breakdown.waste > WASTE_THRESHOLD {
        out.push("Compost food scraps and pick products with less packaging.");
    }

    const GENERIC: [&str; 5] = [
        "Buy local, seasonal produce to cut down on food miles.",
        "Repair and reuse items before replacing them.",
        "Air-dry laundry instead of using a tumble dryer.",
        "Carry a reusable bottle and shopping bag.",
        "Set your thermostat a degree lower in winter and higher in summer.",
    ];
    for generic in GENERIC {
        if out.len() >= SUGGESTION_COUNT {
            break;
        }
        out.push(generic);
    }

    out.into_iter().map(String::from).collect()
}

/// The category contributing the largest share of the total. Ties go to the
/// earlier category in reporting order.
pub fn dominant_category(breakdown: &EmissionBreakdown) -> &'static str {
    let categories = [
        ("transportation", breakdown.transportation),
        ("food", breakdown.food),
        ("electricity", breakdown.electricity),
        ("waste", breakdown.waste),
    ];

    let mut best = categories[0];
    for candidate in &categories[1..] {
        if candidate.1 > best.1 {
            best = *candidate;
        }
    }
    best.0
}

/// Deterministic tip keyed by the dominant category. Used whenever the LLM
/// path is unavailable or fails.
pub fn fallback_tip(breakdown: &EmissionBreakdown) -> String {
    let tip = match dominant_category(breakdown) {
        "transportation" => {
            "Transportation is your largest source: replacing one weekly car trip with transit or cycling makes a real difference."
        }
        "food" => {
            "Food is your largest source: shifting a few meals a week towards plants cuts it fastest."
        }
        "electricity" => {
            "Electricity is your largest source: LEDs, smart standby, and off-peak usage all chip away at it."
        }
        _ => {
            "Waste is your largest source: composting and buying less packaging shrink it quickly."
        }
    };
    tip.to_string()
}

// ─── LLM tip client ──────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum TipError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned empty content")]
    EmptyContent,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

const SYSTEM_PROMPT: &str =
    "You are a sustainability coach. Reply with exactly one short, specific, encouraging sentence.";

/// Messages-API client for generating one free-form tip. One attempt, no
/// retries: the surrounding request falls back rather than waits.
#[derive(Clone)]
struct LlmTipClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl LlmTipClient {
    fn new(api_key: String, model: String) -> Result<Self, TipError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(TIP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<String, TipError> {
        let request_body = AnthropicRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: SYSTEM_PROMPT,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(TipError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: AnthropicResponse = response.json().await?;
        let text = parsed
            .content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
            .ok_or(TipError::EmptyContent)?;

        Ok(text.trim().to_string())
    }
}

fn build_prompt(breakdown: &EmissionBreakdown) -> String {
    format!(
        "My monthly carbon footprint is {:.2} kg CO2: transportation {:.2}, food {:.2}, \
         electricity {:.2}, waste {:.2}. Give me one tip targeting my largest category.",
        breakdown.total,
        breakdown.transportation,
        breakdown.food,
        breakdown.electricity,
        breakdown.waste,
    )
}

/// Tip generation facade. Holds the optional LLM client; without one (or on
/// any failure) the deterministic fallback is used.
#[derive(Clone)]
pub struct TipService {
    llm: Option<LlmTipClient>,
}

impl TipService {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        let llm = api_key.and_then(|key| match LlmTipClient::new(key, model) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build tip client; using fallback tips");
                None
            }
        });

        if llm.is_none() {
            tracing::info!("Tip generation running without LLM; heuristic tips only");
        }

        Self { llm }
    }

    /// One tip for this breakdown. Never fails.
    pub async fn tip_for(&self, breakdown: &EmissionBreakdown) -> String {
        if let Some(client) = &self.llm {
            match client.generate(&build_prompt(breakdown)).await {
                Ok(tip) if !tip.is_empty() => return tip,
                Ok(_) => {
                    tracing::warn!("Tip model returned empty text; using fallback");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Tip generation failed; using fallback");
                }
            }
        }
        fallback_tip(breakdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(transportation: f64, food: f64, electricity: f64, waste: f64) -> EmissionBreakdown {
        EmissionBreakdown {
            transportation,
            food,
            electricity,
            waste,
            total: transportation + food + electricity + waste,
        }
    }

    #[test]
    fn test_emission_level_bands() {
        assert_eq!(emission_level(0.0), "excellent");
        assert_eq!(emission_level(99.99), "excellent");
        assert_eq!(emission_level(100.0), "good");
        assert_eq!(emission_level(149.99), "good");
        assert_eq!(emission_level(150.0), "moderate");
        assert_eq!(emission_level(199.99), "moderate");
        assert_eq!(emission_level(200.0), "high");
        assert_eq!(emission_level(500.0), "high");
    }

    #[test]
    fn test_suggestions_always_five() {
        assert_eq!(suggestions(&breakdown(0.0, 0.0, 0.0, 0.0)).len(), 5);
        assert_eq!(suggestions(&breakdown(60.0, 120.0, 40.0, 15.0)).len(), 5);
        assert_eq!(suggestions(&breakdown(1000.0, 0.0, 0.0, 0.0)).len(), 5);
    }

    #[test]
    fn test_targeted_suggestions_fire_above_thresholds() {
        let tips = suggestions(&breakdown(60.0, 120.0, 40.0, 15.0));
        assert!(tips[0].contains("cycling"));
        assert!(tips[1].contains("meat"));
        assert!(tips[2].contains("LED"));
        assert!(tips[3].contains("Compost"));
    }

    #[test]
    fn test_low_footprint_gets_generic_suggestions() {
        let tips = suggestions(&breakdown(10.0, 20.0, 5.0, 2.0));
        assert!(tips[0].contains("local"));
    }

    #[test]
    fn test_threshold_is_strictly_greater() {
        // Exactly at the threshold does not fire the targeted suggestion.
        let tips = suggestions(&breakdown(50.0, 0.0, 0.0, 0.0));
        assert!(!tips[0].contains("cycling"));
    }

    #[test]
    fn test_dominant_category() {
        assert_eq!(dominant_category(&breakdown(10.0, 5.0, 1.0, 0.0)), "transportation");
        assert_eq!(dominant_category(&breakdown(10.0, 50.0, 1.0, 0.0)), "food");
        assert_eq!(dominant_category(&breakdown(1.0, 2.0, 30.0, 0.0)), "electricity");
        assert_eq!(dominant_category(&breakdown(1.0, 2.0, 3.0, 40.0)), "waste");
        // Tie goes to the earlier category in reporting order.
        assert_eq!(dominant_category(&breakdown(5.0, 5.0, 5.0, 5.0)), "transportation");
    }

    #[test]
    fn test_fallback_tip_tracks_dominant_category() {
        assert!(fallback_tip(&breakdown(100.0, 1.0, 1.0, 1.0)).contains("Transportation"));
        assert!(fallback_tip(&breakdown(1.0, 100.0, 1.0, 1.0)).contains("Food"));
        assert!(fallback_tip(&breakdown(1.0, 1.0, 100.0, 1.0)).contains("Electricity"));
        assert!(fallback_tip(&breakdown(1.0, 1.0, 1.0, 100.0)).contains("Waste"));
    }

    #[tokio::test]
    async fn test_tip_service_without_llm_uses_fallback() {
        let service = TipService::new(None, "claude-3-5-haiku-latest".to_string());
        let tip = service.tip_for(&breakdown(100.0, 1.0, 1.0, 1.0)).await;
        assert_eq!(tip, fallback_tip(&breakdown(100.0, 1.0, 1.0, 1.0)));
    }
}
