pub const ROOM_URL_VAR: &str = "ROOM_WS_URL";
pub const ROOM_TOKEN_VAR: &str = "ROOM_TOKEN";

pub const AUTHORIZATION_HEADER: &str = "Authorization";

pub const DEFAULT_CAPACITY: usize = 1024;
