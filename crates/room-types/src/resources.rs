/// A room as reported by the room service.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RoomResource {
    name: String,
    /// Server-side metadata attached at dispatch time, if any.
    metadata: Option<String>,
}

impl RoomResource {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }
}

/// A remote participant in the room.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ParticipantResource {
    identity: String,
    name: Option<String>,
}

impl ParticipantResource {
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// Capture options requested when publishing the microphone track.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MicrophoneOptions {
    echo_cancellation: bool,
    noise_suppression: bool,
    auto_gain_control: bool,
}

impl Default for MicrophoneOptions {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}
