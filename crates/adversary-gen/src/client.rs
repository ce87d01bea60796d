//! HTTP client for the hosted generation service.
//!
//! Speaks the OpenAI-compatible chat-completion shape: one POST per
//! generation or continuation call, bearer-authenticated, JSON in and out.
//! No retry policy — a failed attempt surfaces immediately.

use std::time::Duration;

use async_trait::async_trait;

use adversary_core::types::{
    AttackStep, ScenarioInput, SimulationScenario, SimulationStart,
};
use adversary_core::AdversaryConfig;

use crate::error::{GenerationError, Result};
use crate::{decode, prompt, require_environment, ContinuationRequest, ScenarioGenerator};

/// Connection settings for the generation service.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub api_endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub request_timeout: Duration,
}

impl From<&AdversaryConfig> for GeneratorConfig {
    fn from(config: &AdversaryConfig) -> Self {
        Self {
            api_endpoint: config.api_endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// Reply shape requested from the service.
///
/// Strict OpenAI-compatible endpoints reject `json_object` mode when the
/// messages never mention JSON, so plain-prose calls must not send it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReplyFormat {
    /// Constrain the reply to a single JSON object.
    Json,
    /// Plain prose; no format constraint is sent.
    Text,
}

fn request_body(
    model: &str,
    system: &str,
    user: &str,
    format: ReplyFormat,
) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": model,
        "messages": [
            {"role": "system", "content": system},
            {"role": "user", "content": user}
        ],
    });
    if format == ReplyFormat::Json {
        body["response_format"] = serde_json::json!({"type": "json_object"});
    }
    body
}

/// Reqwest-backed generation client.
pub struct LlmClient {
    config: GeneratorConfig,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(GenerationError::Http)?;

        Ok(Self { config, http })
    }

    /// Send one chat-completion request and return the raw reply text.
    pub(crate) async fn complete(
        &self,
        system: &str,
        user: &str,
        format: ReplyFormat,
    ) -> Result<String> {
        let endpoint = self
            .config
            .api_endpoint
            .as_deref()
            .ok_or_else(|| GenerationError::Config("api_endpoint is not set".to_string()))?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::Config("api_key is not set".to_string()))?;

        let body = request_body(&self.config.model, system, user, format);

        tracing::debug!(model = %self.config.model, "Sending generation request");

        let response = self
            .http
            .post(endpoint)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message: truncate(&message, 500),
            });
        }

        let reply: serde_json::Value = response.json().await?;
        let content = reply["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();

        if content.trim().is_empty() {
            return Err(GenerationError::EmptyReply);
        }

        Ok(content)
    }
}

#[async_trait]
impl ScenarioGenerator for LlmClient {
    async fn generate_scenario(&self, input: &ScenarioInput) -> Result<SimulationScenario> {
        require_environment(input)?;

        let raw = self
            .complete(
                prompt::SYSTEM_PROMPT,
                &prompt::scenario_prompt(input),
                ReplyFormat::Json,
            )
            .await?;
        let scenario = decode::decode_scenario(&raw)?;

        tracing::info!(
            title = %scenario.title,
            steps = scenario.steps.len(),
            nodes = scenario.network_topology.nodes.len(),
            "Scenario generated"
        );

        Ok(scenario)
    }

    async fn start_simulation(&self, input: &ScenarioInput) -> Result<SimulationStart> {
        require_environment(input)?;

        let raw = self
            .complete(
                prompt::SYSTEM_PROMPT,
                &prompt::opening_prompt(input),
                ReplyFormat::Json,
            )
            .await?;
        let start = decode::decode_start(&raw)?;

        tracing::info!(title = %start.title, "Turn-based simulation opened");

        Ok(start)
    }

    async fn continue_simulation(&self, request: &ContinuationRequest) -> Result<AttackStep> {
        require_environment(&request.input)?;

        let raw = self
            .complete(
                prompt::SYSTEM_PROMPT,
                &prompt::continuation_prompt(request),
                ReplyFormat::Json,
            )
            .await?;
        let step = decode::decode_step(&raw, &request.topology, request.history.last())?;

        tracing::info!(
            step = step.step,
            target = %step.target_host_id,
            "Continuation step generated"
        );

        Ok(step)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconfigured_client() -> LlmClient {
        LlmClient::new(GeneratorConfig {
            api_endpoint: None,
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn missing_endpoint_is_config_error() {
        let client = unconfigured_client();
        let input = ScenarioInput::new("domain: corp.local", "Kerberoasting", "");

        let err = client.generate_scenario(&input).await.unwrap_err();
        assert!(matches!(err, GenerationError::Config(_)));
    }

    #[tokio::test]
    async fn empty_environment_fails_before_any_network_io() {
        // The client has no endpoint either, but the local input check must
        // win: no network-layer error shape is acceptable here.
        let client = unconfigured_client();
        let input = ScenarioInput::new("", "Kerberoasting", "");

        let err = client.generate_scenario(&input).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyEnvironment));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "héllo wörld";
        let t = truncate(s, 3);
        assert!(t.starts_with("h"));
    }

    #[test]
    fn json_requests_carry_response_format() {
        let body = request_body("gemini-2.5-flash", "system", "Reply with JSON.", ReplyFormat::Json);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn text_requests_omit_response_format() {
        // A plain-prose request whose messages never mention JSON must not
        // ask for json_object mode; strict endpoints reject that pairing.
        let body = request_body(
            "gemini-2.5-flash",
            "You are a cybersecurity educator.",
            "Explain the MITRE ATT&CK technique \"T1558.003\" in one sentence.",
            ReplyFormat::Text,
        );
        assert!(body.get("response_format").is_none());
        assert!(!body["messages"].to_string().to_lowercase().contains("json"));
    }
}
