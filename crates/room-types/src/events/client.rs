use crate::resources::MicrophoneOptions;

/// `microphone.publish` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MicrophonePublishEvent {
    options: MicrophoneOptions,
}

impl MicrophonePublishEvent {
    pub fn new(options: MicrophoneOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MicrophoneOptions {
        &self.options
    }
}

/// `microphone.unmute` event
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct MicrophoneUnmuteEvent {}

impl MicrophoneUnmuteEvent {
    pub fn new() -> Self {
        Self {}
    }
}

/// `room.leave` event
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct LeaveEvent {}

impl LeaveEvent {
    pub fn new() -> Self {
        Self {}
    }
}
