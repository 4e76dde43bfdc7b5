use crate::resources::{ParticipantResource, RoomResource, TrackKind};

/// `error` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorEvent {
    message: String,
}

impl ErrorEvent {
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// `room.connected` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RoomConnectedEvent {
    room: RoomResource,
}

impl RoomConnectedEvent {
    pub fn room(&self) -> &RoomResource {
        &self.room
    }
}

/// `room.disconnected` event, sent when the server ends the session.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RoomDisconnectedEvent {
    reason: Option<String>,
}

impl RoomDisconnectedEvent {
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

/// `participant.connected` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ParticipantConnectedEvent {
    participant: ParticipantResource,
}

impl ParticipantConnectedEvent {
    pub fn participant(&self) -> &ParticipantResource {
        &self.participant
    }
}

/// `participant.disconnected` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ParticipantDisconnectedEvent {
    participant: ParticipantResource,
}

impl ParticipantDisconnectedEvent {
    pub fn participant(&self) -> &ParticipantResource {
        &self.participant
    }
}

/// `track.published` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TrackPublishedEvent {
    kind: TrackKind,
    participant: ParticipantResource,
}

impl TrackPublishedEvent {
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn participant(&self) -> &ParticipantResource {
        &self.participant
    }
}

/// `track.unpublished` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TrackUnpublishedEvent {
    kind: TrackKind,
    participant: ParticipantResource,
}

impl TrackUnpublishedEvent {
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn participant(&self) -> &ParticipantResource {
        &self.participant
    }
}

/// `local_track.published` event, acknowledging our own microphone publish.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LocalTrackPublishedEvent {
    kind: TrackKind,
}

impl LocalTrackPublishedEvent {
    pub fn kind(&self) -> TrackKind {
        self.kind
    }
}

/// `active_speakers.changed` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ActiveSpeakersChangedEvent {
    identities: Vec<String>,
}

impl ActiveSpeakersChangedEvent {
    pub fn identities(&self) -> &[String] {
        &self.identities
    }
}

/// `transcription.delta` event: an in-progress partial transcript for one
/// participant's current utterance.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TranscriptionDeltaEvent {
    participant: String,
    text: String,
    /// Identifier of the transcribed media track, when the transcription
    /// source attributes one.
    track_id: Option<String>,
}

impl TranscriptionDeltaEvent {
    pub fn participant(&self) -> &str {
        &self.participant
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn track_id(&self) -> Option<&str> {
        self.track_id.as_deref()
    }
}

/// `transcription.done` event: a transcript marked complete by the source.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TranscriptionDoneEvent {
    participant: String,
    text: String,
}

impl TranscriptionDoneEvent {
    pub fn participant(&self) -> &str {
        &self.participant
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
