use {super::*, status::StatusSender};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum WorkerFault {
    #[snafu(display("Worker {worker} cannot continue: {source}"))]
    Ledger { worker: u64, source: LedgerError },
}

/// Search position of one worker. The cursor stays inside `range` and only
/// jumps back to `range.start` on wrap or reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerState {
    range: SearchRange,
    cursor: u64,
    bound_challenge: Challenge,
}

impl WorkerState {
    pub fn new(range: SearchRange, challenge: Challenge) -> Self {
        Self {
            range,
            cursor: range.start,
            bound_challenge: challenge,
        }
    }

    pub fn range(&self) -> SearchRange {
        self.range
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn bound_challenge(&self) -> Challenge {
        self.bound_challenge
    }

    /// Moves to the next nonce, wrapping to the start of the range.
    pub fn advance(&mut self) {
        self.cursor += 1;

        if self.cursor >= self.range.end() {
            self.cursor = self.range.start;
        }
    }

    pub fn restart(&mut self) {
        self.cursor = self.range.start;
    }

    pub fn rebind(&mut self, challenge: Challenge) {
        self.bound_challenge = challenge;
        self.restart();
    }
}

enum Resume {
    Next,
    Restart,
    Retry,
}

/// Searches one nonce range on a blocking thread. Ledger calls are driven on
/// the runtime through `handle`; the hash loop itself never suspends.
pub struct Worker {
    state: WorkerState,
    evaluator: Evaluator,
    tracker: ChallengeTracker,
    coordinator: SubmissionCoordinator,
    config: Arc<MinerConfig>,
    metrics: Arc<Metrics>,
    status: Option<StatusSender>,
    cancel: CancellationToken,
    handle: Handle,
}

impl Worker {
    pub fn new(
        range: SearchRange,
        challenge: Challenge,
        ledger: Arc<dyn Ledger>,
        config: Arc<MinerConfig>,
        handle: Handle,
    ) -> Self {
        Self {
            state: WorkerState::new(range, challenge),
            evaluator: Evaluator::new(challenge, config.identity),
            tracker: ChallengeTracker::new(ledger.clone()),
            coordinator: SubmissionCoordinator::new(ledger, config.clone()),
            config,
            metrics: Arc::new(Metrics::new()),
            status: None,
            cancel: CancellationToken::new(),
            handle,
        }
    }

    pub fn with_metrics(self, metrics: Arc<Metrics>) -> Self {
        Self { metrics, ..self }
    }

    pub fn with_cancel(self, cancel: CancellationToken) -> Self {
        Self { cancel, ..self }
    }

    pub(crate) fn with_status(self, status: StatusSender) -> Self {
        Self {
            coordinator: self.coordinator.with_status(status.clone()),
            status: Some(status),
            ..self
        }
    }

    pub fn index(&self) -> u64 {
        self.state.range.index()
    }

    pub fn state(&self) -> &WorkerState {
        &self.state
    }

    /// Mines until cancelled or until the ledger answers with something the
    /// worker cannot interpret. A fault is reported and backed off before it is
    /// returned.
    pub fn run(mut self) -> Result<(), WorkerFault> {
        self.report(WorkerStatus::Started {
            range: self.state.range,
            challenge: self.state.bound_challenge,
        });

        let result = self.mine();

        if let Err(fault) = &result {
            self.report(WorkerStatus::Exited {
                reason: fault.to_string(),
            });
            self.backoff();
        }

        result
    }

    fn mine(&mut self) -> Result<(), WorkerFault> {
        while !self.cancel.is_cancelled() {
            self.check_rotation()?;

            if self.cancel.is_cancelled() {
                break;
            }

            self.search(self.config.rotation_check_interval)?;
        }

        debug!("Worker {} stopping at nonce {}", self.index(), self.state.cursor);

        Ok(())
    }

    /// Rebinds to the ledger's current challenge if it moved. Returns whether a
    /// rotation happened.
    pub fn check_rotation(&mut self) -> Result<bool, WorkerFault> {
        let observed = self.state.bound_challenge;

        let rotation = match self.handle.block_on(self.tracker.rotation(&observed)) {
            Ok(rotation) => rotation,
            Err(err) => {
                self.ledger_error(err)?;
                return Ok(false);
            }
        };

        let Some(challenge) = rotation else {
            return Ok(false);
        };

        self.state.rebind(challenge);
        self.evaluator.rebind(challenge);
        self.metrics.add_rotation();

        self.report(WorkerStatus::Rotated {
            from: observed,
            to: challenge,
        });

        Ok(true)
    }

    /// Hashes up to `iterations` nonces from the cursor, submitting every
    /// candidate found. Stops early after a confirmed mint so the caller can
    /// re-check the challenge, and after a candidate could not be sent, leaving
    /// the cursor on it so it is submitted again.
    pub fn search(&mut self, iterations: u64) -> Result<(), WorkerFault> {
        let mut hashed = 0;

        let result = loop {
            if hashed == iterations {
                break Ok(());
            }

            let nonce = self.state.cursor;
            let hash = self.evaluator.hash(nonce);
            hashed += 1;

            if !self.config.target.is_met_by(&hash) {
                self.state.advance();
                continue;
            }

            let candidate = Candidate {
                nonce,
                hash,
                challenge: self.state.bound_challenge,
            };

            match self.submit(candidate) {
                Ok(Resume::Next) => self.state.advance(),
                Ok(Resume::Restart) => {
                    self.state.restart();
                    break Ok(());
                }
                Ok(Resume::Retry) => break Ok(()),
                Err(fault) => break Err(fault),
            }
        };

        self.metrics.add_hashes(hashed);

        result
    }

    fn submit(&mut self, candidate: Candidate) -> Result<Resume, WorkerFault> {
        self.metrics.add_candidate();
        self.report(WorkerStatus::CandidateFound(candidate));

        match self.handle.block_on(self.coordinator.submit(candidate)) {
            Ok(SubmissionResult::Confirmed { tx, balances }) => {
                self.metrics.add_confirmed();
                self.report(WorkerStatus::Confirmed {
                    nonce: candidate.nonce,
                    tx,
                    balances,
                });
                Ok(Resume::Restart)
            }
            Ok(SubmissionResult::Rejected(rejection)) => {
                self.metrics.add_rejected();
                self.report(WorkerStatus::Rejected {
                    nonce: candidate.nonce,
                    rejection,
                });
                Ok(Resume::Next)
            }
            Err(err) => {
                let resume = if err.was_sent() {
                    Resume::Next
                } else {
                    Resume::Retry
                };

                self.ledger_error(err.into_ledger_error())?;

                Ok(resume)
            }
        }
    }

    fn ledger_error(&self, err: LedgerError) -> Result<(), WorkerFault> {
        if err.is_unrecoverable() {
            return Err(WorkerFault::Ledger {
                worker: self.index(),
                source: err,
            });
        }

        self.metrics.add_ledger_error();
        self.report(WorkerStatus::LedgerError {
            message: err.to_string(),
        });
        self.backoff();

        Ok(())
    }

    fn backoff(&self) {
        let delay = self.config.error_backoff;

        if delay.is_zero() {
            return;
        }

        let cancel = self.cancel.clone();

        self.handle.block_on(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = sleep(delay) => {}
            }
        });
    }

    fn report(&self, status: WorkerStatus) {
        if let Some(sender) = &self.status {
            sender.send(status);
        }
    }
}
