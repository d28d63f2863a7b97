use super::*;

/// Reads the ledger's current challenge and detects rotation against a
/// previously observed value.
#[derive(Clone)]
pub struct ChallengeTracker {
    ledger: Arc<dyn Ledger>,
}

impl ChallengeTracker {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    pub async fn current(&self) -> Result<Challenge, LedgerError> {
        self.ledger.current_challenge().await
    }

    pub async fn has_rotated(&self, observed: &Challenge) -> Result<bool, LedgerError> {
        Ok(self.current().await? != *observed)
    }

    /// Returns the new challenge if it differs from `observed`.
    pub async fn rotation(&self, observed: &Challenge) -> Result<Option<Challenge>, LedgerError> {
        let current = self.current().await?;

        if current == *observed {
            Ok(None)
        } else {
            debug!("Challenge rotated from {observed} to {current}");
            Ok(Some(current))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Arc<SimulatedLedger>, ChallengeTracker) {
        let ledger = Arc::new(SimulatedLedger::new(Challenge::new([1; 32]), Target::DEFAULT));
        let tracker = ChallengeTracker::new(ledger.clone());
        (ledger, tracker)
    }

    #[tokio::test]
    async fn current_delegates_to_ledger() {
        let (_ledger, tracker) = setup();
        assert_eq!(tracker.current().await.unwrap(), Challenge::new([1; 32]));
    }

    #[tokio::test]
    async fn detects_rotation() {
        let (ledger, tracker) = setup();
        let observed = tracker.current().await.unwrap();

        assert!(!tracker.has_rotated(&observed).await.unwrap());
        assert_eq!(tracker.rotation(&observed).await.unwrap(), None);

        ledger.rotate_to(Challenge::new([2; 32]));

        assert!(tracker.has_rotated(&observed).await.unwrap());
        assert_eq!(
            tracker.rotation(&observed).await.unwrap(),
            Some(Challenge::new([2; 32]))
        );
    }

    #[tokio::test]
    async fn surfaces_unavailable() {
        let (ledger, tracker) = setup();
        ledger.set_unavailable(true);

        assert!(matches!(
            tracker.has_rotated(&Challenge::new([1; 32])).await,
            Err(LedgerError::Unavailable { .. })
        ));
    }
}
