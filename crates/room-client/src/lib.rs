mod client;

pub use sci_room_types as types;

pub use client::{Client, ServerRx, connect, connect_with_config};
pub use client::config::Config;
