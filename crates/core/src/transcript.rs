use crate::Command;
use crate::mode::AGENT_IDENTITY;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Classifies a room participant: transcription attributed to the
    /// dispatched agent renders as assistant speech, everything else as the
    /// user's own speech.
    pub fn for_participant(identity: &str) -> Self {
        if identity == AGENT_IDENTITY {
            Speaker::Assistant
        } else {
            Speaker::User
        }
    }
}

/// A finished chat turn, appended to the conversation panel in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
    pub at: chrono::DateTime<chrono::Utc>,
}

/// Finalize delays for buffered partial transcripts. The defaults were tuned
/// empirically in production; assistant utterances arrive in more complete
/// chunks, so they settle faster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscriptTiming {
    pub user_finalize: Duration,
    pub assistant_finalize: Duration,
}

impl Default for TranscriptTiming {
    fn default() -> Self {
        Self {
            user_finalize: Duration::from_millis(2000),
            assistant_finalize: Duration::from_millis(1500),
        }
    }
}

#[derive(Debug, Default)]
struct Lane {
    partial: Option<String>,
    deadline: Option<Instant>,
}

/// Per-speaker transcription state machine.
///
/// Each speaker lane is either idle or streaming a single partial utterance.
/// A partial stores the latest text and arms the lane's finalize deadline; a
/// later partial replaces both. The deadline elapsing, or an explicit final
/// transcript from the transport, commits the utterance as a chat turn and
/// returns the lane to idle. Invariant: one deadline slot per lane, so a
/// stale timer can never race a fresh partial into a duplicate commit.
///
/// The machine holds no timers of its own. The runtime's select loop reads
/// [`TranscriptMachine::deadline`] and calls
/// [`TranscriptMachine::on_deadline`] when the clock passes it, which lets
/// tests drive time deterministically.
pub struct TranscriptMachine {
    timing: TranscriptTiming,
    user: Lane,
    assistant: Lane,
}

impl TranscriptMachine {
    pub fn new(timing: TranscriptTiming) -> Self {
        Self {
            timing,
            user: Lane::default(),
            assistant: Lane::default(),
        }
    }

    fn lane_mut(&mut self, speaker: Speaker) -> &mut Lane {
        match speaker {
            Speaker::User => &mut self.user,
            Speaker::Assistant => &mut self.assistant,
        }
    }

    fn finalize_delay(&self, speaker: Speaker) -> Duration {
        match speaker {
            Speaker::User => self.timing.user_finalize,
            Speaker::Assistant => self.timing.assistant_finalize,
        }
    }

    /// The lane's armed finalize deadline, if it is streaming.
    pub fn deadline(&self, speaker: Speaker) -> Option<Instant> {
        match speaker {
            Speaker::User => self.user.deadline,
            Speaker::Assistant => self.assistant.deadline,
        }
    }

    /// Whether any lane currently holds buffered partial text.
    pub fn is_streaming(&self) -> bool {
        self.user.partial.is_some() || self.assistant.partial.is_some()
    }

    /// Handles an in-progress partial transcript for `speaker`.
    pub async fn on_partial(
        &mut self,
        speaker: Speaker,
        text: impl Into<String>,
        commands: &tokio::sync::mpsc::Sender<Command>,
    ) {
        let text = text.into();
        let delay = self.finalize_delay(speaker);
        let lane = self.lane_mut(speaker);
        lane.partial = Some(text.clone());
        // Overwrites the lane's only deadline slot: re-arming is cancelling.
        lane.deadline = Some(Instant::now() + delay);
        if let Err(e) = commands.send(Command::ShowPartial { speaker, text }).await {
            tracing::warn!("failed to send partial update: {}", e);
        }
    }

    /// Handles a transcript the transport marked final: commits immediately
    /// and disarms any pending deadline for the lane.
    pub async fn on_final(
        &mut self,
        speaker: Speaker,
        text: impl Into<String>,
        commands: &tokio::sync::mpsc::Sender<Command>,
    ) {
        let lane = self.lane_mut(speaker);
        lane.deadline = None;
        lane.partial = None;
        self.commit(speaker, text.into(), commands).await;
    }

    /// Called by the runtime when the armed deadline for `speaker` elapses
    /// with no further partial update: commits the last-seen partial text.
    pub async fn on_deadline(
        &mut self,
        speaker: Speaker,
        commands: &tokio::sync::mpsc::Sender<Command>,
    ) {
        let lane = self.lane_mut(speaker);
        lane.deadline = None;
        let buffered = lane.partial.take();
        if let Some(text) = buffered {
            self.commit(speaker, text, commands).await;
        }
    }

    /// Drops any buffered partial text and disarms both lanes, without
    /// committing. Used on session teardown.
    pub fn clear(&mut self) {
        self.user = Lane::default();
        self.assistant = Lane::default();
    }

    async fn commit(
        &self,
        speaker: Speaker,
        text: String,
        commands: &tokio::sync::mpsc::Sender<Command>,
    ) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        tracing::debug!("committing {:?} turn: {:.50}", speaker, text);
        let turn = ConversationTurn {
            speaker,
            text: text.to_string(),
            at: chrono::Utc::now(),
        };
        if let Err(e) = commands.send(Command::AppendTurn(turn)).await {
            tracing::warn!("failed to append turn: {}", e);
        }
        if let Err(e) = commands.send(Command::ClearPartial).await {
            tracing::warn!("failed to clear live region: {}", e);
        }
        if speaker == Speaker::Assistant {
            if let Err(e) = commands.send(Command::AssistantSpeaking(false)).await {
                tracing::warn!("failed to clear speaking indicator: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn machine() -> TranscriptMachine {
        TranscriptMachine::new(TranscriptTiming::default())
    }

    fn committed_turns(rx: &mut mpsc::Receiver<Command>) -> Vec<ConversationTurn> {
        let mut turns = vec![];
        while let Ok(command) = rx.try_recv() {
            if let Command::AppendTurn(turn) = command {
                turns.push(turn);
            }
        }
        turns
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_elapse_commits_last_partial_once() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut m = machine();

        m.on_partial(Speaker::User, "hello", &tx).await;
        let deadline = m.deadline(Speaker::User).expect("deadline armed");

        tokio::time::sleep_until(deadline).await;
        m.on_deadline(Speaker::User, &tx).await;

        let turns = committed_turns(&mut rx);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].text, "hello");
        assert_eq!(turns[0].speaker, Speaker::User);

        // The lane is idle again: nothing left to commit.
        assert_eq!(m.deadline(Speaker::User), None);
        m.on_deadline(Speaker::User, &tx).await;
        assert!(committed_turns(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_the_pending_deadline() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut m = machine();

        m.on_partial(Speaker::User, "hel", &tx).await;
        let first = m.deadline(Speaker::User).unwrap();

        tokio::time::advance(Duration::from_millis(500)).await;
        m.on_partial(Speaker::User, "hello", &tx).await;
        let second = m.deadline(Speaker::User).unwrap();

        assert!(second > first, "new partial must push the deadline out");
        assert_eq!(second - first, Duration::from_millis(500));

        // At the moment the first deadline would have fired, the lane holds
        // only the second one, so the runtime sees nothing to do yet.
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert!(Instant::now() >= first);
        assert!(m.deadline(Speaker::User).unwrap() > Instant::now());

        tokio::time::advance(Duration::from_millis(500)).await;
        m.on_deadline(Speaker::User, &tx).await;

        let turns = committed_turns(&mut rx);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].text, "hello");
    }

    #[tokio::test(start_paused = true)]
    async fn final_event_commits_once_and_disarms_the_timer() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut m = machine();

        m.on_partial(Speaker::User, "hel", &tx).await;
        tokio::time::advance(Duration::from_millis(500)).await;
        m.on_partial(Speaker::User, "hello", &tx).await;
        m.on_final(Speaker::User, "hello world", &tx).await;

        assert_eq!(m.deadline(Speaker::User), None, "final disarms the timer");

        let turns = committed_turns(&mut rx);
        assert_eq!(turns.len(), 1, "exactly one commit per utterance");
        assert_eq!(turns[0].text, "hello world");

        // Even if a stale wakeup still reached us, the lane is empty.
        m.on_deadline(Speaker::User, &tx).await;
        assert!(committed_turns(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn lanes_are_independent_and_asymmetric() {
        let timing = TranscriptTiming::default();
        let (tx, mut rx) = mpsc::channel(32);
        let mut m = TranscriptMachine::new(timing);

        m.on_partial(Speaker::User, "how do I", &tx).await;
        m.on_partial(Speaker::Assistant, "You can", &tx).await;

        let user = m.deadline(Speaker::User).unwrap();
        let assistant = m.deadline(Speaker::Assistant).unwrap();
        assert_eq!(
            user - assistant,
            timing.user_finalize - timing.assistant_finalize
        );

        // Committing the assistant lane leaves the user lane streaming.
        m.on_deadline(Speaker::Assistant, &tx).await;
        let turns = committed_turns(&mut rx);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].speaker, Speaker::Assistant);
        assert!(m.deadline(Speaker::User).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn assistant_commit_clears_the_speaking_indicator() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut m = machine();

        m.on_final(Speaker::Assistant, "All done.", &tx).await;

        let mut saw_indicator_off = false;
        while let Ok(command) = rx.try_recv() {
            if command == Command::AssistantSpeaking(false) {
                saw_indicator_off = true;
            }
        }
        assert!(saw_indicator_off);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_final_text_is_not_committed() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut m = machine();

        m.on_final(Speaker::User, "   ", &tx).await;
        assert!(committed_turns(&mut rx).is_empty());
    }
}
