use sprint_core::model::RewardEvent;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Fan-out channel for reward events (subskill completed, quiz completed, ...).
///
/// Publishing never fails: with no subscribers the event is dropped.
#[derive(Clone)]
pub struct RewardBus {
    tx: broadcast::Sender<RewardEvent>,
}

impl Default for RewardBus {
    fn default() -> Self {
        Self::new()
    }
}

impl RewardBus {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, event: RewardEvent) {
        tracing::debug!(skill_id = %event.skill_id(), xp = event.reward().xp_earned, "reward event");
        let _ = self.tx.send(event);
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RewardEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprint_core::model::{Reward, SkillId};

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = RewardBus::new();
        let mut rx = bus.subscribe();
        bus.publish(RewardEvent::QuizCompleted {
            skill_id: SkillId::new(1),
            reward: Reward::xp(30),
        });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.reward().xp_earned, 30);
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        RewardBus::new().publish(RewardEvent::LearningStarted {
            skill_id: SkillId::new(1),
            reward: Reward::xp(50),
        });
    }
}
