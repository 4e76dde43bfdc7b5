use anyhow::{Context, Result};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/start_voice_agent`. Exactly one of `voice_name` and
/// `mode` is set, depending on the page's conversational mode.
#[derive(Debug, Clone, Serialize)]
pub struct StartVoiceAgentRequest {
    pub username: String,
    pub full_name: String,
    pub user_id: Option<String>,
    pub room_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartVoiceAgentResponse {
    #[serde(default)]
    pub success: bool,
    pub room_name: Option<String>,
    #[serde(default)]
    pub dispatched: bool,
    #[serde(default)]
    pub dispatch_error: Option<String>,
}

/// Body of `POST /api/livekit/token`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionTokenRequest {
    pub username: String,
    pub room_name: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionTokenResponse {
    pub token: String,
    pub url: String,
}

/// Body of `POST /api/feedback`, sent once per session end.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRecord {
    pub rating: u8,
    pub comment: String,
    pub user_email: String,
    pub user_name: String,
    pub session_date: String,
    pub room: String,
}

/// Backend operations the session controllers depend on. Controllers hold
/// this as a trait bound so tests drive them with `mockall` instead of a
/// live backend.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait BackendApi {
    /// Asks the backend to place the conversational agent into a room,
    /// creating the room if needed. The response carries the authoritative
    /// room name.
    async fn start_voice_agent(
        &self,
        request: StartVoiceAgentRequest,
    ) -> Result<StartVoiceAgentResponse>;

    /// Requests an admission token for the named room.
    async fn session_token(&self, request: SessionTokenRequest) -> Result<SessionTokenResponse>;

    /// Submits an end-of-session feedback record, authorized with the
    /// session's bearer token.
    async fn submit_feedback(&self, record: FeedbackRecord, bearer_token: String) -> Result<()>;
}

/// `BackendApi` over HTTP JSON, the way every page talks to the backend.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn start_voice_agent(
        &self,
        request: StartVoiceAgentRequest,
    ) -> Result<StartVoiceAgentResponse> {
        let response = self
            .client
            .post(self.endpoint("/api/start_voice_agent"))
            .json(&request)
            .send()
            .await
            .context("voice agent request failed")?
            .error_for_status()
            .context("voice agent request rejected")?
            .json::<StartVoiceAgentResponse>()
            .await
            .context("voice agent response was not valid JSON")?;
        Ok(response)
    }

    async fn session_token(&self, request: SessionTokenRequest) -> Result<SessionTokenResponse> {
        let response = self
            .client
            .post(self.endpoint("/api/livekit/token"))
            .json(&request)
            .send()
            .await
            .context("token request failed")?
            .error_for_status()
            .context("token request rejected")?
            .json::<SessionTokenResponse>()
            .await
            .context("token response was not valid JSON")?;
        Ok(response)
    }

    async fn submit_feedback(&self, record: FeedbackRecord, bearer_token: String) -> Result<()> {
        self.client
            .post(self.endpoint("/api/feedback"))
            .bearer_auth(bearer_token)
            .json(&record)
            .send()
            .await
            .context("feedback request failed")?
            .error_for_status()
            .context("feedback request rejected")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_body_carries_exactly_one_mode_field() {
        let request = StartVoiceAgentRequest {
            username: "sam".into(),
            full_name: "Sam".into(),
            user_id: None,
            room_name: None,
            voice_name: Some("Aoede".into()),
            mode: None,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["voice_name"], "Aoede");
        assert!(body.get("mode").is_none());
        // Identity fields serialize even when null; the backend expects them.
        assert!(body["user_id"].is_null());
        assert!(body["room_name"].is_null());
    }

    #[test]
    fn dispatch_response_tolerates_missing_fields() {
        let response: StartVoiceAgentResponse =
            serde_json::from_str(r#"{"room_name": "abedin_sam_1700000000"}"#).unwrap();
        assert_eq!(response.room_name.as_deref(), Some("abedin_sam_1700000000"));
        assert!(!response.dispatched);
        assert!(response.dispatch_error.is_none());
    }
}
