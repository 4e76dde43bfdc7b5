pub mod events;
mod resources;

pub use events::{ClientEvent, ServerEvent};
pub use resources::{MicrophoneOptions, ParticipantResource, RoomResource, TrackKind};
