pub mod api;
pub mod controller;
pub mod credentials;
pub mod feedback;
pub mod mode;
pub mod sanitize;
pub mod session;
pub mod transcript;

/// Commands the controller logic issues to the runtime.
///
/// This enum is the primary API for decoupling session decision-making from
/// the runtime's execution of side effects (rendering, navigation). The
/// controllers never touch a display or a page directly; they describe what
/// should happen and the runtime carries it out.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Append a finished conversation turn to the chat panel.
    AppendTurn(transcript::ConversationTurn),
    /// Show in-progress partial text for a speaker in the live region.
    ShowPartial {
        speaker: transcript::Speaker,
        text: String,
    },
    /// Clear the live region back to its listening hint.
    ClearPartial,
    /// Toggle the assistant "is speaking" indicator.
    AssistantSpeaking(bool),
    /// Replace the status line.
    Status(String),
    /// Enable or disable the session controls.
    SetControls { can_start: bool, can_leave: bool },
    /// Navigate to another page. `Page::Login` is terminal: nothing runs
    /// after it.
    Navigate(mode::Page),
    /// Reveal the feedback card.
    ShowFeedback,
    /// Show the feedback thank-you state.
    FeedbackThanks,
    /// Dismiss the feedback card and reset its inputs.
    DismissFeedback,
}
