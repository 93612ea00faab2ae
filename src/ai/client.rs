//! `ApiFlowClient` — runs the flows against an OpenAI-compatible
//! `/chat/completions` endpoint.
//!
//! Works with Gemini's OpenAI-compatible endpoint (the default), OpenAI and
//! any other provider that accepts multimodal chat messages. All connection
//! details come from [`AiConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::ai::flows::{
    AiFlows, ObjectDetectionOutput, RemoteError, SpeechTextOutput, SummaryOutput,
};
use crate::ai::prompt::Flow;
use crate::config::AiConfig;
use crate::file::DataUri;

/// Calls an OpenAI-compatible chat-completions endpoint, one request per flow.
pub struct ApiFlowClient {
    client: reqwest::Client,
    config: AiConfig,
    api_key: Option<String>,
}

impl ApiFlowClient {
    /// Build an `ApiFlowClient` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`. The API key is resolved once, here.
    pub fn from_config(config: &AiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let api_key = config.resolved_api_key();
        if api_key.is_none() {
            log::warn!(
                "no API key configured (set ai.api_key or ${}); requests are sent unauthenticated",
                config.api_key_env
            );
        }

        Self {
            client,
            config: config.clone(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Send one flow request and parse the reply into `T`.
    async fn run<T: DeserializeOwned>(&self, flow: Flow, media: &DataUri) -> Result<T, RemoteError> {
        let body = request_body(&self.config, flow, media);

        let mut req = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        log::info!("flow {}: sending {} payload", flow.name(), media.mime());
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: truncate(&body, 300),
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(RemoteError::EmptyResponse)?;

        let output = parse_output(content)?;
        log::info!("flow {}: completed", flow.name());
        Ok(output)
    }
}

#[async_trait]
impl AiFlows for ApiFlowClient {
    async fn summarize(&self, document: &DataUri) -> Result<SummaryOutput, RemoteError> {
        let out: SummaryOutput = self.run(Flow::Summary, document).await?;
        if out.summary.trim().is_empty() {
            return Err(RemoteError::EmptyResponse);
        }
        Ok(out)
    }

    async fn extract_for_speech(
        &self,
        document: &DataUri,
    ) -> Result<SpeechTextOutput, RemoteError> {
        let out: SpeechTextOutput = self.run(Flow::SpeechText, document).await?;
        if out.speech_text.trim().is_empty() {
            return Err(RemoteError::EmptyResponse);
        }
        Ok(out)
    }

    async fn detect_objects(&self, photo: &DataUri) -> Result<ObjectDetectionOutput, RemoteError> {
        let mut out: ObjectDetectionOutput = self.run(Flow::ObjectDetection, photo).await?;
        out.objects.retain(|o| !o.trim().is_empty());
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Wire helpers
// ---------------------------------------------------------------------------

/// Build the chat-completions request body for `flow`.
///
/// Images travel as an `image_url` part; anything else (PDFs) as a `file`
/// part carrying the data URI.
fn request_body(config: &AiConfig, flow: Flow, media: &DataUri) -> serde_json::Value {
    let media_part = if media.mime().starts_with("image/") {
        serde_json::json!({
            "type": "image_url",
            "image_url": { "url": media.as_str() }
        })
    } else {
        serde_json::json!({
            "type": "file",
            "file": { "filename": "document.pdf", "file_data": media.as_str() }
        })
    };

    serde_json::json!({
        "model": config.model,
        "messages": [
            { "role": "system", "content": flow.system_instruction() },
            { "role": "user", "content": [
                { "type": "text", "text": flow.user_text() },
                media_part
            ]}
        ],
        "response_format": { "type": "json_object" },
        "temperature": config.temperature,
        "stream": false
    })
}

/// Parse the message content as the flow's JSON output.
///
/// Models sometimes wrap JSON in a markdown code fence even when asked not
/// to; the fence is stripped first.
fn parse_output<T: DeserializeOwned>(content: &str) -> Result<T, RemoteError> {
    let json = strip_code_fence(content);
    if json.is_empty() {
        return Err(RemoteError::EmptyResponse);
    }
    serde_json::from_str(json).map_err(|e| RemoteError::Parse(e.to_string()))
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening line.
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => strip_info_word(rest),
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// A fence on one line: ```` ```json {...}``` ````. Only a `json` tag is
/// dropped; anything else is taken as the start of the body.
fn strip_info_word(line: &str) -> &str {
    let tag = "json";
    match line.get(..tag.len()) {
        Some(head) if head.eq_ignore_ascii_case(tag) => &line[tag.len()..],
        _ => line,
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf() -> DataUri {
        DataUri::encode("application/pdf", b"%PDF-1.7")
    }

    #[test]
    fn from_config_builds_without_panic() {
        let mut config = AiConfig::default();
        config.api_key = Some("sk-test".into());
        let client = ApiFlowClient::from_config(&config);
        assert_eq!(client.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let mut config = AiConfig::default();
        config.base_url = "https://api.openai.com/v1/".into();
        let client = ApiFlowClient::from_config(&config);
        assert_eq!(client.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn client_is_object_safe() {
        let client: Box<dyn AiFlows> = Box::new(ApiFlowClient::from_config(&AiConfig::default()));
        drop(client);
    }

    #[test]
    fn pdf_is_sent_as_file_part() {
        let body = request_body(&AiConfig::default(), Flow::Summary, &pdf());
        let parts = &body["messages"][1]["content"];
        assert_eq!(parts[1]["type"], "file");
        assert_eq!(parts[1]["file"]["file_data"], pdf().as_str());
        assert_eq!(body["model"], "gemini-2.0-flash");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["content"], Flow::Summary.system_instruction());
    }

    #[test]
    fn image_is_sent_as_image_url_part() {
        let photo = DataUri::encode("image/png", &[1, 2, 3]);
        let body = request_body(&AiConfig::default(), Flow::ObjectDetection, &photo);
        let part = &body["messages"][1]["content"][1];
        assert_eq!(part["type"], "image_url");
        assert_eq!(part["image_url"]["url"], photo.as_str());
    }

    #[test]
    fn parses_plain_json() {
        let out: SummaryOutput = parse_output(r#"{"summary":"short"}"#).unwrap();
        assert_eq!(out.summary, "short");
    }

    #[test]
    fn parses_fenced_json() {
        let content = "```json\n{\"objects\": [\"cat\", \"sofa\"]}\n```\n";
        let out: ObjectDetectionOutput = parse_output(content).unwrap();
        assert_eq!(out.objects, vec!["cat", "sofa"]);
    }

    #[test]
    fn parses_single_line_fenced_json() {
        let out: SummaryOutput = parse_output("```{\"summary\":\"short\"}```").unwrap();
        assert_eq!(out.summary, "short");

        let out: SummaryOutput = parse_output("```JSON {\"summary\":\"short\"}```").unwrap();
        assert_eq!(out.summary, "short");
    }

    #[test]
    fn blank_content_is_empty_response() {
        let err = parse_output::<SummaryOutput>("   ").unwrap_err();
        assert!(matches!(err, RemoteError::EmptyResponse));
    }

    #[test]
    fn missing_field_is_parse_error() {
        let err = parse_output::<SpeechTextOutput>(r#"{"text":"wrong key"}"#).unwrap_err();
        assert!(matches!(err, RemoteError::Parse(_)));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé…");
        assert_eq!(truncate("ok", 10), "ok");
    }
}
