use crate::Command;
use crate::api::BackendApi;
use crate::credentials::{self, Bootstrap, CredentialStore, Identity};
use crate::feedback::{FeedbackCollector, FeedbackError, FeedbackTiming};
use crate::mode::{AgentMode, Page};
use crate::session::{self, JoinTicket, SessionError, SessionTiming};
use crate::transcript::{
    ConversationTurn, Speaker, TranscriptMachine, TranscriptTiming,
};
use sci_room_types::{ServerEvent, TrackKind};
use tokio::time::Instant;

/// All tunable delays for one page controller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerConfig {
    pub transcript: TranscriptTiming,
    pub session: SessionTiming,
    pub feedback: FeedbackTiming,
}

/// One page's session controller.
///
/// Owns its dependencies — backend client, credential store, command channel
/// to the runtime — instead of reaching for ambient globals, so a test can
/// construct one against mocks and drive it without any environment.
pub struct PageController<A, S> {
    api: A,
    store: S,
    mode: AgentMode,
    config: ControllerConfig,
    commands: tokio::sync::mpsc::Sender<Command>,
    transcript: TranscriptMachine,
    feedback: FeedbackCollector,
    identity: Option<Identity>,
    room_name: Option<String>,
    connected: bool,
}

impl<A: BackendApi, S: CredentialStore> PageController<A, S> {
    pub fn new(
        api: A,
        store: S,
        mode: AgentMode,
        config: ControllerConfig,
        commands: tokio::sync::mpsc::Sender<Command>,
    ) -> Self {
        Self {
            api,
            store,
            mode,
            config,
            commands,
            transcript: TranscriptMachine::new(config.transcript),
            feedback: FeedbackCollector::new(config.feedback),
            identity: None,
            room_name: None,
            connected: false,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn room_name(&self) -> Option<&str> {
        self.room_name.as_deref()
    }

    pub fn mode(&self) -> &AgentMode {
        &self.mode
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Page-load initialization: load credentials, or redirect to login and
    /// stop. Returns whether the controller is ready to start a session.
    pub async fn bootstrap(&mut self, name_override: Option<String>) -> bool {
        match credentials::bootstrap(&self.store) {
            Bootstrap::RedirectToLogin => {
                self.send(Command::Navigate(Page::Login)).await;
                false
            }
            Bootstrap::Ready(mut identity) => {
                if let Some(name) = name_override.filter(|name| !name.trim().is_empty()) {
                    identity.display_name = name;
                }
                self.send(Command::Status(format!("Welcome, {}", identity.display_name)))
                    .await;
                self.send(Command::SetControls {
                    can_start: true,
                    can_leave: false,
                })
                .await;
                self.identity = Some(identity);
                true
            }
        }
    }

    /// Starts a session: agent dispatch (with its single retry), then the
    /// admission token. On failure the start control is re-enabled so the
    /// user can try again; nothing here is fatal to the page.
    pub async fn join(&mut self) -> Result<JoinTicket, SessionError> {
        let Some(identity) = self.identity.clone() else {
            self.send(Command::Navigate(Page::Login)).await;
            return Err(SessionError::NotSignedIn);
        };

        self.send(Command::SetControls {
            can_start: false,
            can_leave: true,
        })
        .await;
        self.send(Command::Status("Preparing the voice agent...".to_string()))
            .await;

        match session::negotiate_session(&self.api, &identity, &self.mode, &self.config.session)
            .await
        {
            Ok(ticket) => {
                self.room_name = Some(ticket.room_name.clone());
                let status = if ticket.dispatched {
                    format!("Room ready: {}", ticket.room_name)
                } else {
                    format!("Room ready: {} (agent pending)", ticket.room_name)
                };
                self.send(Command::Status(status)).await;
                Ok(ticket)
            }
            Err(e) => {
                tracing::error!("session negotiation failed: {}", e);
                self.send(Command::Status("Connection error.".to_string()))
                    .await;
                self.send(Command::SetControls {
                    can_start: true,
                    can_leave: false,
                })
                .await;
                Err(e)
            }
        }
    }

    /// The room connection itself failed (taxonomy class 2): report, clean
    /// up, re-enable the start control.
    pub async fn on_connect_failure(&mut self, error: &anyhow::Error) {
        tracing::error!("room connection failed: {:#}", error);
        self.connected = false;
        self.transcript.clear();
        self.send(Command::Status(
            session::connect_error_message(error).to_string(),
        ))
        .await;
        self.send(Command::ClearPartial).await;
        self.send(Command::SetControls {
            can_start: true,
            can_leave: false,
        })
        .await;
    }

    /// Routes one server event from the room session.
    pub async fn on_room_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::RoomConnected(connected) => {
                tracing::info!("connected to room: {}", connected.room().name());
                self.connected = true;
                self.send(Command::Status("Connected. Listening...".to_string()))
                    .await;
                self.schedule_welcome_message();
            }
            ServerEvent::RoomDisconnected(disconnected) => {
                tracing::warn!("server ended the session: {:?}", disconnected.reason());
                self.teardown("Disconnected by the server.").await;
            }
            ServerEvent::Close { reason } => {
                tracing::info!("room connection closed: {:?}", reason);
                self.teardown("Disconnected.").await;
            }
            ServerEvent::Error(error) => {
                // Transport-reported errors (a refused microphone, most
                // commonly) do not end the session.
                tracing::error!("room error: {}", error.message());
                self.send(Command::Status(format!("Session issue: {}", error.message())))
                    .await;
            }
            ServerEvent::ParticipantConnected(joined) => {
                let participant = joined.participant();
                tracing::info!("participant joined: {}", participant.identity());
                if Speaker::for_participant(participant.identity()) == Speaker::Assistant {
                    self.send(Command::Status("Friday is ready to talk.".to_string()))
                        .await;
                }
            }
            ServerEvent::ParticipantDisconnected(left) => {
                let participant = left.participant();
                tracing::info!("participant left: {}", participant.identity());
                if Speaker::for_participant(participant.identity()) == Speaker::Assistant {
                    self.send(Command::AssistantSpeaking(false)).await;
                    self.send(Command::Status("The agent left the room.".to_string()))
                        .await;
                }
            }
            ServerEvent::TrackPublished(published) => {
                if published.kind() == TrackKind::Audio
                    && Speaker::for_participant(published.participant().identity())
                        == Speaker::Assistant
                {
                    self.send(Command::AssistantSpeaking(true)).await;
                }
            }
            ServerEvent::TrackUnpublished(unpublished) => {
                if unpublished.kind() == TrackKind::Audio
                    && Speaker::for_participant(unpublished.participant().identity())
                        == Speaker::Assistant
                {
                    self.send(Command::AssistantSpeaking(false)).await;
                }
            }
            ServerEvent::LocalTrackPublished(local) => {
                tracing::info!("local {:?} track published", local.kind());
            }
            ServerEvent::ActiveSpeakersChanged(speakers) => {
                if !speakers.identities().is_empty() {
                    tracing::debug!("active speakers: {}", speakers.identities().join(", "));
                }
            }
            ServerEvent::TranscriptionDelta(delta) => {
                let speaker = Speaker::for_participant(delta.participant());
                self.transcript
                    .on_partial(speaker, delta.text(), &self.commands)
                    .await;
            }
            ServerEvent::TranscriptionDone(done) => {
                let speaker = Speaker::for_participant(done.participant());
                self.transcript
                    .on_final(speaker, done.text(), &self.commands)
                    .await;
            }
        }
    }

    /// The lane's armed finalize deadline, for the runtime's select loop.
    pub fn transcript_deadline(&self, speaker: Speaker) -> Option<Instant> {
        self.transcript.deadline(speaker)
    }

    /// Called when a lane's finalize deadline elapses.
    pub async fn on_transcript_deadline(&mut self, speaker: Speaker) {
        self.transcript.on_deadline(speaker, &self.commands).await;
    }

    /// User-initiated leave. The runtime disconnects the transport; the
    /// feedback card (where the mode has one) is revealed by the runtime
    /// after `config.session.feedback_reveal_delay`.
    pub async fn leave(&mut self) {
        self.teardown("Disconnected.").await;
        if let Some(text) = self.mode.farewell_message() {
            self.append_scripted_turn(text).await;
        }
    }

    /// Reveals the feedback card, where the mode offers one.
    pub async fn show_feedback(&mut self) {
        if self.mode.collects_feedback() {
            self.send(Command::ShowFeedback).await;
        }
    }

    pub fn set_feedback_rating(&mut self, stars: u8) {
        self.feedback.set_rating(stars);
    }

    pub fn set_feedback_comment(&mut self, text: impl Into<String>) {
        self.feedback.set_comment(text);
    }

    /// Submits the feedback card. `RatingRequired` is the only error the
    /// user ever sees; transport failures are masked inside the collector.
    pub async fn submit_feedback(&mut self) -> Result<(), FeedbackError> {
        let Some(identity) = self.identity.clone() else {
            tracing::warn!("feedback submitted with no signed-in identity; dropping");
            self.feedback.reset();
            self.send(Command::DismissFeedback).await;
            return Ok(());
        };
        let room_name = self
            .room_name
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        self.feedback
            .submit(&self.api, &identity, &room_name, &self.commands)
            .await
    }

    /// Dismisses the feedback card without sending anything.
    pub async fn skip_feedback(&mut self) {
        self.feedback.reset();
        self.send(Command::DismissFeedback).await;
    }

    /// Clears stored credentials and navigates to the login page.
    pub async fn sign_out(&mut self) {
        if let Err(e) = credentials::sign_out(&self.store) {
            tracing::error!("failed to clear stored credentials: {:#}", e);
        }
        self.identity = None;
        self.send(Command::Navigate(Page::Login)).await;
    }

    async fn teardown(&mut self, status: &str) {
        self.connected = false;
        self.transcript.clear();
        self.send(Command::ClearPartial).await;
        self.send(Command::AssistantSpeaking(false)).await;
        self.send(Command::Status(status.to_string())).await;
        self.send(Command::SetControls {
            can_start: true,
            can_leave: false,
        })
        .await;
    }

    fn schedule_welcome_message(&self) {
        let Some(text) = self.mode.welcome_message() else {
            return;
        };
        let commands = self.commands.clone();
        let delay = self.config.session.welcome_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let turn = ConversationTurn {
                speaker: Speaker::Assistant,
                text: text.to_string(),
                at: chrono::Utc::now(),
            };
            if let Err(e) = commands.send(Command::AppendTurn(turn)).await {
                tracing::warn!("failed to append welcome message: {}", e);
            }
        });
    }

    async fn append_scripted_turn(&self, text: &str) {
        let turn = ConversationTurn {
            speaker: Speaker::Assistant,
            text: text.to_string(),
            at: chrono::Utc::now(),
        };
        self.send(Command::AppendTurn(turn)).await;
    }

    async fn send(&self, command: Command) {
        if let Err(e) = self.commands.send(command).await {
            tracing::warn!("runtime stopped consuming commands: {}", e);
        }
    }
}
