use rand::Rng;
use rand::distr::Alphanumeric;

/// Participant identity of the dispatched conversational agent.
pub const AGENT_IDENTITY: &str = "sci-agent";

/// Agent voice used when the user has not picked one.
pub const DEFAULT_VOICE: &str = "Aoede";

/// Pages the controllers navigate between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Login,
    Sentences,
    Podcast,
}

impl Page {
    /// URL path of the page as the backend serves it.
    pub fn route(self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::Login => "/login",
            Page::Sentences => "/3000-sentences.html",
            Page::Podcast => "/podcast.html",
        }
    }
}

/// The conversational mode a controller requests from the dispatcher, one
/// per page.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentMode {
    /// General-purpose assistant chat with a selectable agent voice.
    Assistant { voice_name: String },
    /// Simulated English-conversation practice.
    EnglishConversation,
    /// Scripted ten-sentence learning drill.
    SentencesLearning,
}

impl AgentMode {
    pub fn assistant_with_default_voice() -> Self {
        AgentMode::Assistant {
            voice_name: DEFAULT_VOICE.to_string(),
        }
    }

    /// The `voice_name` dispatch field, for modes that select a voice.
    pub fn voice_name(&self) -> Option<String> {
        match self {
            AgentMode::Assistant { voice_name } => Some(voice_name.clone()),
            _ => None,
        }
    }

    /// The `mode` dispatch field, for modes keyed by a mode string.
    pub fn mode_field(&self) -> Option<String> {
        match self {
            AgentMode::Assistant { .. } => None,
            AgentMode::EnglishConversation => Some("english_conversation".to_string()),
            AgentMode::SentencesLearning => Some("sentences_learning".to_string()),
        }
    }

    /// Room naming policy. Assistant chat always lets the dispatcher assign
    /// a fresh room (reconnecting to an old one is unreliable); the learning
    /// modes pre-generate a client-side name so their sessions never collide.
    pub fn requested_room(&self, user_id: Option<&str>) -> Option<String> {
        match self {
            AgentMode::Assistant { .. } => None,
            AgentMode::EnglishConversation => Some(format!(
                "english-conversation-{}",
                rand::rng().random_range(0..10_000)
            )),
            AgentMode::SentencesLearning => {
                let tag = user_id
                    .map(str::to_owned)
                    .unwrap_or_else(|| random_tag(7));
                Some(format!("sentences-{}-{}", tag, chrono::Utc::now().timestamp()))
            }
        }
    }

    /// Whether the feedback card is offered when the session ends.
    pub fn collects_feedback(&self) -> bool {
        matches!(self, AgentMode::Assistant { .. })
    }

    /// Scripted assistant message appended shortly after the room connects.
    pub fn welcome_message(&self) -> Option<&'static str> {
        match self {
            AgentMode::Assistant { .. } => None,
            AgentMode::EnglishConversation => Some(
                "Connected! I'm Friday, ready to practice English with you. Let's start!",
            ),
            AgentMode::SentencesLearning => Some(
                "Welcome to the sentence-learning session! We'll learn ten simple \
                 English sentences together. Talk to me and I'll help you with \
                 pronunciation and understanding.",
            ),
        }
    }

    /// Scripted assistant message appended when the user leaves the session.
    pub fn farewell_message(&self) -> Option<&'static str> {
        match self {
            AgentMode::SentencesLearning => {
                Some("The sentence-learning session has ended. Thank you!")
            }
            _ => None,
        }
    }
}

fn random_tag(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}
