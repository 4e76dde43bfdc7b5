use secrecy::SecretString;

/// Connection settings for a room session: the websocket URL and admission
/// token handed out by the backend's token endpoint.
pub struct Config {
    url: String,
    token: SecretString,
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.config.url = url.to_string();
        self
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.config.token = SecretString::from(token.to_string());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            url: std::env::var(super::consts::ROOM_URL_VAR)
                .unwrap_or_else(|_| "".to_string()),
            token: std::env::var(super::consts::ROOM_TOKEN_VAR)
                .unwrap_or_else(|_| "".to_string())
                .into(),
        }
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
