use chrono::Local;
use sci_core::Command;
use sci_core::transcript::Speaker;

/// Terminal rendering of controller commands: the chat panel, live
/// transcription line, status line and feedback card of the web pages,
/// reduced to line output.
pub struct Renderer {
    assistant_speaking: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            assistant_speaking: false,
        }
    }

    fn speaker_label(speaker: Speaker) -> &'static str {
        match speaker {
            Speaker::User => "🎤 You",
            Speaker::Assistant => "🤖 Friday",
        }
    }

    /// Executes one command.
    pub fn handle(&mut self, command: Command) {
        match command {
            Command::AppendTurn(turn) => {
                let time = turn.at.with_timezone(&Local).format("%H:%M");
                println!("[{}] {}: {}", time, Self::speaker_label(turn.speaker), turn.text);
            }
            Command::ShowPartial { speaker, text } => {
                println!("  … {}: {}", Self::speaker_label(speaker), text);
            }
            Command::ClearPartial => {
                // The next committed turn replaces the live line; nothing to
                // erase in line output.
            }
            Command::AssistantSpeaking(speaking) => {
                if speaking && !self.assistant_speaking {
                    println!("  (Friday is speaking...)");
                }
                self.assistant_speaking = speaking;
            }
            Command::Status(status) => {
                println!("-- {}", status);
            }
            Command::SetControls {
                can_start,
                can_leave,
            } => {
                tracing::debug!("controls: start={} leave={}", can_start, can_leave);
            }
            Command::Navigate(page) => {
                println!("-- navigating to {}", page.route());
            }
            Command::ShowFeedback => {
                println!();
                println!("How was your session? Rate it 1-5 stars.");
            }
            Command::FeedbackThanks => {
                println!("Thank you for your feedback! 🌟");
            }
            Command::DismissFeedback => {
                tracing::debug!("feedback card dismissed");
            }
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
