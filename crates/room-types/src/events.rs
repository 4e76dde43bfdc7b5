pub mod client;
pub mod server;

use client::*;
use server::*;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "microphone.publish")]
    MicrophonePublish(MicrophonePublishEvent),
    #[serde(rename = "microphone.unmute")]
    MicrophoneUnmute(MicrophoneUnmuteEvent),
    #[serde(rename = "room.leave")]
    Leave(LeaveEvent),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "close")]
    Close { reason: Option<String> },
    #[serde(rename = "error")]
    Error(ErrorEvent),
    #[serde(rename = "room.connected")]
    RoomConnected(RoomConnectedEvent),
    #[serde(rename = "room.disconnected")]
    RoomDisconnected(RoomDisconnectedEvent),
    #[serde(rename = "participant.connected")]
    ParticipantConnected(ParticipantConnectedEvent),
    #[serde(rename = "participant.disconnected")]
    ParticipantDisconnected(ParticipantDisconnectedEvent),
    #[serde(rename = "track.published")]
    TrackPublished(TrackPublishedEvent),
    #[serde(rename = "track.unpublished")]
    TrackUnpublished(TrackUnpublishedEvent),
    #[serde(rename = "local_track.published")]
    LocalTrackPublished(LocalTrackPublishedEvent),
    #[serde(rename = "active_speakers.changed")]
    ActiveSpeakersChanged(ActiveSpeakersChangedEvent),
    #[serde(rename = "transcription.delta")]
    TranscriptionDelta(TranscriptionDeltaEvent),
    #[serde(rename = "transcription.done")]
    TranscriptionDone(TranscriptionDoneEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcription_delta_deserializes() {
        let json = r#"{
            "type": "transcription.delta",
            "participant": "sci-agent",
            "text": "hello there",
            "track_id": "TR_abc123"
        }"#;
        let event: ServerEvent = serde_json::from_str(json).expect("valid event");
        match event {
            ServerEvent::TranscriptionDelta(delta) => {
                assert_eq!(delta.participant(), "sci-agent");
                assert_eq!(delta.text(), "hello there");
                assert_eq!(delta.track_id(), Some("TR_abc123"));
            }
            other => panic!("expected transcription.delta, got {other:?}"),
        }
    }

    #[test]
    fn microphone_publish_carries_type_tag() {
        let event = ClientEvent::MicrophonePublish(MicrophonePublishEvent::new(
            crate::MicrophoneOptions::default(),
        ));
        let json = serde_json::to_value(&event).expect("serializes");
        assert_eq!(json["type"], "microphone.publish");
        assert_eq!(json["options"]["echo_cancellation"], true);
    }
}
