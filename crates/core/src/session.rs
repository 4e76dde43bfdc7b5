use crate::api::{BackendApi, SessionTokenRequest, StartVoiceAgentRequest};
use crate::credentials::Identity;
use crate::mode::AgentMode;
use std::time::Duration;

/// Delays in the session flow. Tuned empirically in the deployed system;
/// kept as configuration rather than hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    /// Pause before the single dispatch retry.
    pub dispatch_retry_delay: Duration,
    /// Pause between session teardown and revealing the feedback card.
    pub feedback_reveal_delay: Duration,
    /// Pause between room connect and the scripted welcome message.
    pub welcome_delay: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            dispatch_retry_delay: Duration::from_millis(1000),
            feedback_reveal_delay: Duration::from_millis(1500),
            welcome_delay: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("not signed in")]
    NotSignedIn,
    #[error("no room is available: dispatch produced no room name and none was requested")]
    RoomUnavailable,
    #[error("admission token request failed")]
    Token(#[source] anyhow::Error),
}

/// Admission data for a negotiated session.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinTicket {
    pub room_name: String,
    pub token: String,
    pub url: String,
    /// Whether agent dispatch was confirmed. An undispatched session still
    /// proceeds; the room may be usable without the agent.
    pub dispatched: bool,
}

/// Dispatches the agent and requests an admission token.
///
/// Dispatch follows the degradation policy: one attempt, and on failure
/// (transport error or `dispatched: false`) exactly one retry after
/// `timing.dispatch_retry_delay`. A second failure is logged and the flow
/// still proceeds to the token request with whatever room name is available:
/// the dispatcher's answer if it gave one, else the client-requested name.
/// Only when no name exists at all does negotiation fail.
pub async fn negotiate_session<A: BackendApi + ?Sized>(
    api: &A,
    identity: &Identity,
    mode: &AgentMode,
    timing: &SessionTiming,
) -> Result<JoinTicket, SessionError> {
    let requested_room = mode.requested_room(identity.user_id.as_deref());
    let request = StartVoiceAgentRequest {
        username: identity.display_name.clone(),
        full_name: identity.display_name.clone(),
        user_id: identity.user_id.clone(),
        room_name: requested_room.clone(),
        voice_name: mode.voice_name(),
        mode: mode.mode_field(),
    };

    let mut room_name = requested_room;
    let mut dispatched = false;

    match api.start_voice_agent(request.clone()).await {
        Ok(response) => {
            room_name = response.room_name.or(room_name);
            if response.dispatched {
                dispatched = true;
            } else {
                tracing::warn!(
                    "agent dispatch not confirmed: {}; retrying once",
                    response.dispatch_error.as_deref().unwrap_or("unknown")
                );
            }
        }
        Err(e) => {
            tracing::warn!("agent dispatch request failed: {:#}; retrying once", e);
        }
    }

    if !dispatched {
        tokio::time::sleep(timing.dispatch_retry_delay).await;
        let retry = StartVoiceAgentRequest {
            room_name: room_name.clone(),
            ..request
        };
        match api.start_voice_agent(retry).await {
            Ok(response) => {
                room_name = response.room_name.or(room_name);
                if response.dispatched {
                    tracing::info!("dispatch retry succeeded");
                    dispatched = true;
                } else {
                    // Degrade: the session continues without a confirmed agent.
                    tracing::warn!(
                        "dispatch retry failed: {}",
                        response.dispatch_error.as_deref().unwrap_or("unknown")
                    );
                }
            }
            Err(e) => {
                tracing::warn!("dispatch retry failed: {:#}", e);
            }
        }
    }

    let room_name = room_name.ok_or(SessionError::RoomUnavailable)?;

    let token = api
        .session_token(SessionTokenRequest {
            username: identity.display_name.clone(),
            room_name: room_name.clone(),
            user_id: identity.user_id.clone(),
        })
        .await
        .map_err(SessionError::Token)?;

    Ok(JoinTicket {
        room_name,
        token: token.token,
        url: token.url,
        dispatched,
    })
}

/// Maps a room connection failure to the user-facing message. The transport
/// exposes no structured codes, so this matches on the failure text it is
/// known to produce.
pub fn connect_error_message(error: &anyhow::Error) -> &'static str {
    let text = format!("{error:#}");
    if text.contains("pc connection") {
        "Connection to the server failed. Please try again."
    } else if text.contains("leave request") {
        "The server ended the session."
    } else {
        "Connection error."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockBackendApi, SessionTokenResponse, StartVoiceAgentResponse};
    use mockall::Sequence;
    use tokio::time::Instant;

    fn identity() -> Identity {
        Identity {
            access_token: "tok-1".to_string(),
            email: Some("sam@example.com".to_string()),
            display_name: "Sam".to_string(),
            user_id: Some("u-7".to_string()),
        }
    }

    fn undispatched(room: &str, error: &str) -> StartVoiceAgentResponse {
        StartVoiceAgentResponse {
            success: true,
            room_name: Some(room.to_string()),
            dispatched: false,
            dispatch_error: Some(error.to_string()),
        }
    }

    fn dispatched(room: &str) -> StartVoiceAgentResponse {
        StartVoiceAgentResponse {
            success: true,
            room_name: Some(room.to_string()),
            dispatched: true,
            dispatch_error: None,
        }
    }

    fn token_ok() -> SessionTokenResponse {
        SessionTokenResponse {
            token: "jwt".to_string(),
            url: "wss://rtc.example.com".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn successful_dispatch_is_not_retried() {
        let mut api = MockBackendApi::new();
        api.expect_start_voice_agent()
            .times(1)
            .returning(|_| Box::pin(async { Ok(dispatched("abedin_sam_1")) }));
        api.expect_session_token()
            .times(1)
            .withf(|request| request.room_name == "abedin_sam_1")
            .returning(|_| Box::pin(async { Ok(token_ok()) }));

        let ticket = negotiate_session(
            &api,
            &identity(),
            &AgentMode::assistant_with_default_voice(),
            &SessionTiming::default(),
        )
        .await
        .unwrap();

        assert!(ticket.dispatched);
        assert_eq!(ticket.room_name, "abedin_sam_1");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_dispatch_retries_once_then_proceeds_to_token() {
        let mut api = MockBackendApi::new();
        let mut seq = Sequence::new();
        api.expect_start_voice_agent()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Box::pin(async { Ok(undispatched("abedin_sam_1", "timeout")) }));
        api.expect_start_voice_agent()
            .times(1)
            .in_sequence(&mut seq)
            // The retry reuses the room the first answer assigned.
            .withf(|request| request.room_name.as_deref() == Some("abedin_sam_1"))
            .returning(|_| Box::pin(async { Ok(undispatched("abedin_sam_1", "timeout")) }));
        api.expect_session_token()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Box::pin(async { Ok(token_ok()) }));

        let started = Instant::now();
        let ticket = negotiate_session(
            &api,
            &identity(),
            &AgentMode::assistant_with_default_voice(),
            &SessionTiming::default(),
        )
        .await
        .unwrap();

        // The retry waited the configured fixed delay.
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
        assert!(!ticket.dispatched, "dispatch degraded, session continues");
        assert_eq!(ticket.token, "jwt");
    }

    #[tokio::test(start_paused = true)]
    async fn successful_retry_stops_after_two_attempts() {
        let mut api = MockBackendApi::new();
        let mut seq = Sequence::new();
        api.expect_start_voice_agent()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Box::pin(async { Ok(undispatched("abedin_sam_1", "timeout")) }));
        api.expect_start_voice_agent()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Box::pin(async { Ok(dispatched("abedin_sam_1")) }));
        api.expect_session_token()
            .times(1)
            .returning(|_| Box::pin(async { Ok(token_ok()) }));

        let ticket = negotiate_session(
            &api,
            &identity(),
            &AgentMode::assistant_with_default_voice(),
            &SessionTiming::default(),
        )
        .await
        .unwrap();
        assert!(ticket.dispatched);
    }

    #[tokio::test(start_paused = true)]
    async fn no_room_from_any_source_fails_without_a_token_request() {
        let mut api = MockBackendApi::new();
        api.expect_start_voice_agent()
            .times(2)
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("backend unreachable")) }));
        api.expect_session_token().times(0);

        let result = negotiate_session(
            &api,
            &identity(),
            &AgentMode::assistant_with_default_voice(),
            &SessionTiming::default(),
        )
        .await;

        assert!(matches!(result, Err(SessionError::RoomUnavailable)));
    }

    #[tokio::test(start_paused = true)]
    async fn client_requested_room_survives_total_dispatch_failure() {
        let mut api = MockBackendApi::new();
        api.expect_start_voice_agent()
            .times(2)
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("backend unreachable")) }));
        api.expect_session_token()
            .times(1)
            .withf(|request| request.room_name.starts_with("sentences-u-7-"))
            .returning(|_| Box::pin(async { Ok(token_ok()) }));

        let ticket = negotiate_session(
            &api,
            &identity(),
            &AgentMode::SentencesLearning,
            &SessionTiming::default(),
        )
        .await
        .unwrap();

        assert!(!ticket.dispatched);
        assert!(ticket.room_name.starts_with("sentences-u-7-"));
    }
}
