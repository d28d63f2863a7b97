use {super::*, status::StatusSender};

/// A nonce believed to satisfy the target for `challenge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub nonce: u64,
    pub hash: Digest,
    pub challenge: Challenge,
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Rejection {
    #[display("ledger did not confirm the solution")]
    InvalidSolution,
    #[display("challenge rotated before submission")]
    StaleChallenge,
    #[display("transaction rejected: {_0}")]
    TransactionRejected(String),
    #[display("transaction reverted")]
    Reverted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[display(
    "native balance {} ether, token balance {}",
    native.format_units(18),
    token.format_units(18)
)]
pub struct Balances {
    pub native: Amount,
    pub token: Amount,
}

/// A ledger failure during submission, split on whether the mint transaction
/// was already sent.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SubmissionError {
    #[snafu(display("Nonce {nonce} was not submitted: {source}"))]
    Unsent { nonce: u64, source: LedgerError },

    #[snafu(display("Mint {tx} for nonce {nonce} was not confirmed: {source}"))]
    Unconfirmed {
        nonce: u64,
        tx: TxHandle,
        source: LedgerError,
    },
}

impl SubmissionError {
    /// Whether a mint transaction for the candidate reached the ledger. A sent
    /// candidate must never be submitted again.
    pub fn was_sent(&self) -> bool {
        matches!(self, Self::Unconfirmed { .. })
    }

    pub fn ledger_error(&self) -> &LedgerError {
        match self {
            Self::Unsent { source, .. } | Self::Unconfirmed { source, .. } => source,
        }
    }

    pub fn into_ledger_error(self) -> LedgerError {
        match self {
            Self::Unsent { source, .. } | Self::Unconfirmed { source, .. } => source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    Confirmed {
        tx: TxHandle,
        balances: Option<Balances>,
    },
    Rejected(Rejection),
}

/// Validates a candidate against the ledger, prices and submits the mint, and
/// waits for the receipt. Only transport and protocol failures are returned as
/// errors, tagged with whether the mint was sent; everything the ledger refuses
/// comes back as a rejection.
#[derive(Clone)]
pub struct SubmissionCoordinator {
    ledger: Arc<dyn Ledger>,
    config: Arc<MinerConfig>,
    status: Option<StatusSender>,
}

impl SubmissionCoordinator {
    pub fn new(ledger: Arc<dyn Ledger>, config: Arc<MinerConfig>) -> Self {
        Self {
            ledger,
            config,
            status: None,
        }
    }

    pub(crate) fn with_status(self, status: StatusSender) -> Self {
        Self {
            status: Some(status),
            ..self
        }
    }

    pub async fn submit(&self, candidate: Candidate) -> Result<SubmissionResult, SubmissionError> {
        let nonce = candidate.nonce;

        let tx = match self.send(candidate).await {
            Ok(Ok(tx)) => tx,
            Ok(Err(rejection)) => return Ok(SubmissionResult::Rejected(rejection)),
            Err(source) => return Err(SubmissionError::Unsent { nonce, source }),
        };

        let receipt = self
            .wait_for_receipt(&tx)
            .await
            .map_err(|source| SubmissionError::Unconfirmed { nonce, tx, source })?;

        if !receipt.success {
            return Ok(SubmissionResult::Rejected(Rejection::Reverted));
        }

        Ok(SubmissionResult::Confirmed {
            tx,
            balances: self.balances().await,
        })
    }

    /// Everything up to and including the mint call.
    async fn send(&self, candidate: Candidate) -> Result<Result<TxHandle, Rejection>, LedgerError> {
        let miner = self.config.identity;

        let solution = self.ledger.debug_solution(candidate.nonce, miner).await?;

        if solution.hash != candidate.hash || !solution.is_valid() {
            debug!(
                "Dry validation of nonce {} failed: ledger reported `{}` with hash {}",
                candidate.nonce, solution.message, solution.hash
            );
            return Ok(Err(Rejection::InvalidSolution));
        }

        if self.ledger.current_challenge().await? != candidate.challenge {
            return Ok(Err(Rejection::StaleChallenge));
        }

        let gas_price = self.config.gas.price(self.ledger.gas_price().await?);

        let tx = match self
            .ledger
            .mint(candidate.nonce, miner, self.config.mint_options(gas_price))
            .await
        {
            Ok(tx) => tx,
            Err(LedgerError::TransactionRejected { reason }) => {
                return Ok(Err(Rejection::TransactionRejected(reason)));
            }
            Err(err) => return Err(err),
        };

        if let Some(status) = &self.status {
            status.send(WorkerStatus::Submitted {
                nonce: candidate.nonce,
                tx,
                gas_price,
            });
        }

        Ok(Ok(tx))
    }

    async fn wait_for_receipt(&self, tx: &TxHandle) -> Result<Receipt, LedgerError> {
        match self.config.confirmation_timeout {
            Some(duration) => tokio::time::timeout(duration, self.ledger.wait_for_receipt(tx))
                .await
                .map_err(|_| LedgerError::Unavailable {
                    message: format!("no receipt for {tx} after {}s", duration.as_secs()),
                })?,
            None => self.ledger.wait_for_receipt(tx).await,
        }
    }

    async fn balances(&self) -> Option<Balances> {
        let miner = self.config.identity;

        let balances = async {
            Ok::<_, LedgerError>(Balances {
                native: self.ledger.native_balance(miner).await?,
                token: self.ledger.token_balance(miner).await?,
            })
        };

        match balances.await {
            Ok(balances) => Some(balances),
            Err(err) => {
                warn!("Failed to fetch balances after mint: {err}");
                None
            }
        }
    }
}
