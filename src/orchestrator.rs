use super::*;

/// Supervises rounds of workers: read the challenge, partition the nonce
/// space, run one worker per range until all of them exit, wait, repeat.
pub struct Orchestrator {
    ledger: Arc<dyn Ledger>,
    config: Arc<MinerConfig>,
    metrics: Arc<Metrics>,
}

impl Orchestrator {
    pub fn new(ledger: Arc<dyn Ledger>, config: Arc<MinerConfig>) -> Self {
        Self {
            ledger,
            config,
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    /// Runs rounds until `cancel` fires. Ledger failures never end the loop.
    pub async fn run(&self, cancel: CancellationToken) -> Result {
        self.config.validate()?;

        let ranges = partition(self.config.workers, self.config.range_size)?;
        let tracker = ChallengeTracker::new(self.ledger.clone());

        info!(
            "Mining as {} with {} workers over {} nonces each",
            self.config.identity, self.config.workers, self.config.range_size
        );
        info!(
            "Target {} (~{:.0} hashes per solution)",
            self.config.target,
            self.config.target.expected_hashes()
        );

        let mut tasks = JoinSet::new();
        let reporter_cancel = cancel.child_token();

        self.metrics.spawn_reporter(
            self.config.status_interval,
            reporter_cancel.clone(),
            &mut tasks,
        );

        while !cancel.is_cancelled() {
            match tracker.current().await {
                Ok(challenge) => {
                    let faults = self.run_round(challenge, &ranges, &cancel).await;

                    if faults > 0 {
                        warn!("Round ended with {faults} failed workers");
                    }
                }
                Err(err) => error!("Failed to fetch current challenge: {err}"),
            }

            if cancel.is_cancelled() {
                break;
            }

            info!(
                "All mining workers finished. Restarting in {}s",
                self.config.round_delay.as_secs_f64()
            );

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.config.round_delay) => {}
            }
        }

        reporter_cancel.cancel();

        while tasks.join_next().await.is_some() {}

        info!("Miner stopped: {}", self.metrics.status_line());

        Ok(())
    }

    /// Runs one worker per range bound to `challenge` and waits for all of them
    /// to exit. Returns the number of workers that failed.
    pub async fn run_round(
        &self,
        challenge: Challenge,
        ranges: &[SearchRange],
        cancel: &CancellationToken,
    ) -> usize {
        info!("Starting round on challenge {challenge}");

        let handle = Handle::current();
        let mut workers = JoinSet::new();
        let mut drains = JoinSet::new();
        let mut senders = Vec::with_capacity(ranges.len());

        for range in ranges {
            let (status, mut updates) = status::channel(STATUS_CHANNEL_CAPACITY);

            let worker = Worker::new(
                *range,
                challenge,
                self.ledger.clone(),
                self.config.clone(),
                handle.clone(),
            )
            .with_metrics(self.metrics.clone())
            .with_cancel(cancel.clone())
            .with_status(status.clone());

            senders.push(status);

            let index = worker.index();

            drains.spawn(async move {
                while let Some(update) = updates.recv().await {
                    update.log(index);
                }
            });

            workers.spawn_blocking(move || worker.run());
        }

        let mut faults = 0;

        while let Some(result) = workers.join_next().await {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(fault)) => {
                    error!("{fault}");
                    faults += 1;
                }
                Err(err) => {
                    error!("Worker task failed: {err}");
                    faults += 1;
                }
            }
        }

        let dropped = senders.iter().map(|sender| sender.dropped()).sum::<u64>();

        if dropped > 0 {
            warn!("Dropped {dropped} worker status updates");
        }

        drop(senders);

        while drains.join_next().await.is_some() {}

        self.metrics.add_round();

        faults
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(workers: usize, target: Target) -> Arc<MinerConfig> {
        Arc::new(MinerConfig {
            identity: MinerIdentity::new([0x42; 20]),
            workers,
            range_size: 5_000,
            rotation_check_interval: 50,
            round_delay: Duration::from_millis(10),
            target,
            error_backoff: Duration::from_millis(10),
            status_interval: Duration::from_millis(50),
            ..Default::default()
        })
    }

    fn easy_target() -> Target {
        Target::new(U256::MAX / U256::from(200u64))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn mines_until_cancelled() {
        let ledger = Arc::new(SimulatedLedger::new(Challenge::new([3; 32]), easy_target()));
        let orchestrator = Orchestrator::new(ledger.clone(), config(2, easy_target()));
        let metrics = orchestrator.metrics();

        let cancel = CancellationToken::new();
        let run = tokio::spawn({
            let cancel = cancel.clone();
            async move { orchestrator.run(cancel).await }
        });

        sleep(Duration::from_millis(750)).await;
        cancel.cancel();
        run.await.unwrap().unwrap();

        let accepted = ledger.accepted_mints();
        assert!(!accepted.is_empty(), "no solution confirmed");
        assert_eq!(metrics.confirmed(), accepted.len() as u64);

        for mint in &accepted {
            assert!(easy_target().is_met_by(&evaluate(
                &mint.challenge,
                &mint.miner,
                mint.nonce
            )));
        }

        let mut challenges = accepted.iter().map(|mint| mint.challenge).collect::<Vec<_>>();
        challenges.dedup();
        assert_eq!(challenges.len(), accepted.len(), "challenge solved twice");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn survives_ledger_outage() {
        let ledger = Arc::new(SimulatedLedger::new(Challenge::new([3; 32]), Target::ZERO));
        ledger.set_unavailable(true);

        let orchestrator = Orchestrator::new(ledger.clone(), config(2, Target::ZERO));
        let metrics = orchestrator.metrics();

        let cancel = CancellationToken::new();
        let run = tokio::spawn({
            let cancel = cancel.clone();
            async move { orchestrator.run(cancel).await }
        });

        sleep(Duration::from_millis(100)).await;
        assert_eq!(metrics.rounds(), 0);

        ledger.set_unavailable(false);
        sleep(Duration::from_millis(100)).await;

        cancel.cancel();
        run.await.unwrap().unwrap();

        assert!(metrics.total_hashes() > 0);
    }

    /// Answers the first challenge read, then returns garbage.
    struct DegradingLedger {
        inner: SimulatedLedger,
        reads: AtomicU64,
    }

    #[async_trait]
    impl Ledger for DegradingLedger {
        async fn current_challenge(&self) -> Result<Challenge, LedgerError> {
            if self.reads.fetch_add(1, Ordering::Relaxed) == 0 {
                self.inner.current_challenge().await
            } else {
                ledger::MalformedSnafu {
                    message: "truncated response",
                }
                .fail()
            }
        }

        async fn debug_solution(
            &self,
            nonce: u64,
            miner: MinerIdentity,
        ) -> Result<DebugSolution, LedgerError> {
            self.inner.debug_solution(nonce, miner).await
        }

        async fn mint(
            &self,
            nonce: u64,
            miner: MinerIdentity,
            options: MintOptions,
        ) -> Result<TxHandle, LedgerError> {
            self.inner.mint(nonce, miner, options).await
        }

        async fn wait_for_receipt(&self, tx: &TxHandle) -> Result<Receipt, LedgerError> {
            self.inner.wait_for_receipt(tx).await
        }

        async fn gas_price(&self) -> Result<Amount, LedgerError> {
            self.inner.gas_price().await
        }

        async fn native_balance(&self, miner: MinerIdentity) -> Result<Amount, LedgerError> {
            self.inner.native_balance(miner).await
        }

        async fn token_balance(&self, miner: MinerIdentity) -> Result<Amount, LedgerError> {
            self.inner.token_balance(miner).await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn round_ends_when_every_worker_faults() {
        let ledger = Arc::new(DegradingLedger {
            inner: SimulatedLedger::new(Challenge::new([3; 32]), Target::ZERO),
            reads: AtomicU64::new(0),
        });

        let orchestrator = Orchestrator::new(ledger, config(3, Target::ZERO));
        let ranges = partition(3, 5_000).unwrap();

        let faults = orchestrator
            .run_round(Challenge::new([3; 32]), &ranges, &CancellationToken::new())
            .await;

        assert_eq!(faults, 3);
        assert_eq!(orchestrator.metrics().rounds(), 1);
    }

    #[tokio::test]
    async fn invalid_config_is_an_error() {
        let ledger = Arc::new(SimulatedLedger::new(Challenge::new([3; 32]), Target::ZERO));
        let orchestrator = Orchestrator::new(ledger, config(0, Target::ZERO));

        assert!(orchestrator.run(CancellationToken::new()).await.is_err());
    }
}
