use crate::Command;
use crate::api::{BackendApi, FeedbackRecord};
use crate::credentials::Identity;
use std::time::Duration;

/// How long the thank-you state stays up before the card dismisses itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackTiming {
    pub dismiss_after_success: Duration,
    pub dismiss_after_failure: Duration,
}

impl Default for FeedbackTiming {
    fn default() -> Self {
        Self {
            dismiss_after_success: Duration::from_millis(3000),
            dismiss_after_failure: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FeedbackError {
    #[error("a star rating is required before submitting")]
    RatingRequired,
}

/// Star-rating and comment collector for the end-of-session feedback card.
///
/// A missing rating is the only client-side rejection. Transport failure is
/// masked: both outcomes resolve to the thank-you state, then the card
/// dismisses and the collector resets, whichever path it took.
pub struct FeedbackCollector {
    rating: u8,
    comment: String,
    timing: FeedbackTiming,
}

impl FeedbackCollector {
    pub fn new(timing: FeedbackTiming) -> Self {
        Self {
            rating: 0,
            comment: String::new(),
            timing,
        }
    }

    /// Records the selected star, clamped to the five-star scale.
    pub fn set_rating(&mut self, stars: u8) {
        self.rating = stars.min(5);
    }

    pub fn set_comment(&mut self, text: impl Into<String>) {
        self.comment = text.into();
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    /// Sends the collected feedback once. Never retried; never surfaced as a
    /// failure to the user.
    pub async fn submit<A: BackendApi + ?Sized>(
        &mut self,
        api: &A,
        identity: &Identity,
        room_name: &str,
        commands: &tokio::sync::mpsc::Sender<Command>,
    ) -> Result<(), FeedbackError> {
        if self.rating == 0 {
            return Err(FeedbackError::RatingRequired);
        }

        let record = FeedbackRecord {
            rating: self.rating,
            comment: self.comment.clone(),
            user_email: identity
                .email
                .clone()
                .unwrap_or_else(|| "anonymous".to_string()),
            user_name: identity.display_name.clone(),
            session_date: chrono::Utc::now().to_rfc3339(),
            room: room_name.to_string(),
        };
        tracing::info!("submitting feedback: {} stars", record.rating);

        let dismiss_after = match api
            .submit_feedback(record, identity.access_token.clone())
            .await
        {
            Ok(()) => self.timing.dismiss_after_success,
            Err(e) => {
                // Masked: the card still reports success.
                tracing::error!("feedback submission failed: {:#}", e);
                self.timing.dismiss_after_failure
            }
        };

        if let Err(e) = commands.send(Command::FeedbackThanks).await {
            tracing::warn!("failed to show feedback thanks: {}", e);
        }
        tokio::time::sleep(dismiss_after).await;
        if let Err(e) = commands.send(Command::DismissFeedback).await {
            tracing::warn!("failed to dismiss feedback card: {}", e);
        }
        self.reset();
        Ok(())
    }

    /// Clears rating and comment. Safe on any entry path, including skip.
    pub fn reset(&mut self) {
        self.rating = 0;
        self.comment.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockBackendApi;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    fn identity() -> Identity {
        Identity {
            access_token: "tok-1".to_string(),
            email: Some("sam@example.com".to_string()),
            display_name: "Sam".to_string(),
            user_id: None,
        }
    }

    #[tokio::test]
    async fn missing_rating_is_rejected_without_a_network_call() {
        let mut api = MockBackendApi::new();
        api.expect_submit_feedback().times(0);
        let (tx, mut rx) = mpsc::channel(8);

        let mut collector = FeedbackCollector::new(FeedbackTiming::default());
        let result = collector.submit(&api, &identity(), "room-1", &tx).await;

        assert_eq!(result, Err(FeedbackError::RatingRequired));
        assert!(rx.try_recv().is_err(), "no commands for a rejected submit");
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_still_resolves_to_thanks_within_two_seconds() {
        let mut api = MockBackendApi::new();
        api.expect_submit_feedback()
            .times(1)
            .returning(|_, _| Box::pin(async { Err(anyhow::anyhow!("feedback pipeline down")) }));
        let (tx, mut rx) = mpsc::channel(8);

        let mut collector = FeedbackCollector::new(FeedbackTiming::default());
        collector.set_rating(4);
        collector.set_comment("good session");

        let started = Instant::now();
        collector
            .submit(&api, &identity(), "room-1", &tx)
            .await
            .unwrap();

        assert_eq!(rx.recv().await, Some(Command::FeedbackThanks));
        assert_eq!(rx.recv().await, Some(Command::DismissFeedback));
        assert_eq!(started.elapsed(), Duration::from_millis(2000));
        assert_eq!(collector.rating(), 0, "collector reset after dismissal");
    }

    #[tokio::test(start_paused = true)]
    async fn success_path_holds_the_thanks_state_longer() {
        let mut api = MockBackendApi::new();
        api.expect_submit_feedback()
            .times(1)
            .withf(|record, bearer| {
                record.rating == 5
                    && record.user_email == "sam@example.com"
                    && record.room == "room-9"
                    && bearer == "tok-1"
            })
            .returning(|_, _| Box::pin(async { Ok(()) }));
        let (tx, mut rx) = mpsc::channel(8);

        let mut collector = FeedbackCollector::new(FeedbackTiming::default());
        collector.set_rating(5);

        let started = Instant::now();
        collector
            .submit(&api, &identity(), "room-9", &tx)
            .await
            .unwrap();

        assert_eq!(rx.recv().await, Some(Command::FeedbackThanks));
        assert_eq!(rx.recv().await, Some(Command::DismissFeedback));
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
    }

    #[test]
    fn ratings_clamp_to_the_five_star_scale() {
        let mut collector = FeedbackCollector::new(FeedbackTiming::default());
        collector.set_rating(9);
        assert_eq!(collector.rating(), 5);
    }
}
