use {
    super::*,
    sha3::Digest as _,
    std::collections::{HashMap, VecDeque},
};

/// Mints (and their unread receipts) kept before the oldest are forgotten.
pub const MINT_HISTORY: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MintRecord {
    pub nonce: u64,
    pub miner: MinerIdentity,
    pub options: MintOptions,
    pub challenge: Challenge,
    pub tx: TxHandle,
    pub accepted: bool,
}

#[derive(Debug)]
struct State {
    challenge: Challenge,
    solved: bool,
    unavailable: bool,
    debug_mismatch: bool,
    native: HashMap<MinerIdentity, Amount>,
    tokens: HashMap<MinerIdentity, Amount>,
    receipts: HashMap<TxHandle, Receipt>,
    mints: VecDeque<MintRecord>,
    debug_calls: u64,
    tx_counter: u64,
}

/// In-process stand-in for the challenge contract. Verifies solutions with the
/// same evaluator the miner uses and accepts at most one mint per challenge.
#[derive(Debug)]
pub struct SimulatedLedger {
    target: Target,
    gas_price: Amount,
    reward: Amount,
    required_value: Amount,
    rotate_on_mint: bool,
    latency: Duration,
    state: Mutex<State>,
}

impl SimulatedLedger {
    pub fn new(challenge: Challenge, target: Target) -> Self {
        Self {
            target,
            gas_price: Amount::from_gwei(30),
            reward: Amount::from_wei(U256::exp10(18)),
            required_value: Amount::ZERO,
            rotate_on_mint: true,
            latency: Duration::ZERO,
            state: Mutex::new(State {
                challenge,
                solved: false,
                unavailable: false,
                debug_mismatch: false,
                native: HashMap::new(),
                tokens: HashMap::new(),
                receipts: HashMap::new(),
                mints: VecDeque::new(),
                debug_calls: 0,
                tx_counter: 0,
            }),
        }
    }

    pub fn with_gas_price(self, gas_price: Amount) -> Self {
        Self { gas_price, ..self }
    }

    pub fn with_reward(self, reward: Amount) -> Self {
        Self { reward, ..self }
    }

    pub fn with_required_value(self, required_value: Amount) -> Self {
        Self {
            required_value,
            ..self
        }
    }

    pub fn with_rotate_on_mint(self, rotate_on_mint: bool) -> Self {
        Self {
            rotate_on_mint,
            ..self
        }
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        Self { latency, ..self }
    }

    pub fn with_balance(self, miner: MinerIdentity, balance: Amount) -> Self {
        self.state.lock().native.insert(miner, balance);
        self
    }

    pub fn challenge(&self) -> Challenge {
        self.state.lock().challenge
    }

    /// Replaces the current challenge, as if the contract rolled it over.
    pub fn rotate_to(&self, challenge: Challenge) {
        let mut state = self.state.lock();
        state.challenge = challenge;
        state.solved = false;
    }

    pub fn rotate(&self) -> Challenge {
        let next = self.challenge().next();
        self.rotate_to(next);
        next
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Makes `debug_solution` report a hash that disagrees with the miner's.
    pub fn force_debug_mismatch(&self, mismatch: bool) {
        self.state.lock().debug_mismatch = mismatch;
    }

    /// The most recent mints, oldest first, at most `MINT_HISTORY` of them.
    pub fn mints(&self) -> Vec<MintRecord> {
        self.state.lock().mints.iter().copied().collect()
    }

    pub fn accepted_mints(&self) -> Vec<MintRecord> {
        self.mints()
            .into_iter()
            .filter(|mint| mint.accepted)
            .collect()
    }

    pub fn debug_calls(&self) -> u64 {
        self.state.lock().debug_calls
    }

    async fn call(&self) -> Result<(), LedgerError> {
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }

        if self.state.lock().unavailable {
            return UnavailableSnafu {
                message: "simulated outage",
            }
            .fail();
        }

        Ok(())
    }
}

#[async_trait]
impl Ledger for SimulatedLedger {
    async fn current_challenge(&self) -> Result<Challenge, LedgerError> {
        self.call().await?;
        Ok(self.state.lock().challenge)
    }

    async fn debug_solution(
        &self,
        nonce: u64,
        miner: MinerIdentity,
    ) -> Result<DebugSolution, LedgerError> {
        self.call().await?;

        let mut state = self.state.lock();
        state.debug_calls += 1;

        let hash = evaluate(&state.challenge, &miner, nonce);

        let message = if self.target.is_met_by(&hash) {
            VALID_SOLUTION_MESSAGE
        } else {
            "Solution is invalid"
        };

        let hash = if state.debug_mismatch {
            Digest::new(Keccak256::digest(hash.as_bytes()).into())
        } else {
            hash
        };

        Ok(DebugSolution {
            message: message.into(),
            hash,
        })
    }

    async fn mint(
        &self,
        nonce: u64,
        miner: MinerIdentity,
        options: MintOptions,
    ) -> Result<TxHandle, LedgerError> {
        self.call().await?;

        if options.value < self.required_value {
            return TransactionRejectedSnafu {
                reason: format!(
                    "payment {} below required {}",
                    options.value, self.required_value
                ),
            }
            .fail();
        }

        let mut state = self.state.lock();

        state.tx_counter += 1;
        let tx = TxHandle {
            hash: Digest::new(Keccak256::digest(state.tx_counter.to_be_bytes()).into()),
        };

        let challenge = state.challenge;
        let accepted =
            !state.solved && self.target.is_met_by(&evaluate(&challenge, &miner, nonce));

        let gas = options.gas_price.saturating_mul(options.gas_limit);
        let native = state.native.entry(miner).or_default();
        *native = native.saturating_sub(gas);

        if accepted {
            *native = native.saturating_sub(options.value);

            let tokens = state.tokens.entry(miner).or_default();
            *tokens = tokens.saturating_add(self.reward);

            state.solved = true;

            if self.rotate_on_mint {
                state.challenge = challenge.next();
                state.solved = false;
            }
        }

        state.receipts.insert(
            tx,
            Receipt {
                tx,
                success: accepted,
            },
        );

        state.mints.push_back(MintRecord {
            nonce,
            miner,
            options,
            challenge,
            tx,
            accepted,
        });

        if state.mints.len() > MINT_HISTORY
            && let Some(oldest) = state.mints.pop_front()
        {
            state.receipts.remove(&oldest.tx);
        }

        Ok(tx)
    }

    async fn wait_for_receipt(&self, tx: &TxHandle) -> Result<Receipt, LedgerError> {
        self.call().await?;

        self.state
            .lock()
            .receipts
            .remove(tx)
            .ok_or_else(|| LedgerError::Malformed {
                message: format!("unknown transaction {tx}"),
            })
    }

    async fn gas_price(&self) -> Result<Amount, LedgerError> {
        self.call().await?;
        Ok(self.gas_price)
    }

    async fn native_balance(&self, miner: MinerIdentity) -> Result<Amount, LedgerError> {
        self.call().await?;
        Ok(self
            .state
            .lock()
            .native
            .get(&miner)
            .copied()
            .unwrap_or_default())
    }

    async fn token_balance(&self, miner: MinerIdentity) -> Result<Amount, LedgerError> {
        self.call().await?;
        Ok(self
            .state
            .lock()
            .tokens
            .get(&miner)
            .copied()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn miner() -> MinerIdentity {
        MinerIdentity::new([0x11; 20])
    }

    fn options() -> MintOptions {
        MintOptions {
            gas_limit: 2_000_000,
            gas_price: Amount::from_gwei(25),
            value: "0.06 ether".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn accepts_one_mint_per_challenge() {
        let ledger = SimulatedLedger::new(Challenge::new([1; 32]), Target::MAX)
            .with_rotate_on_mint(false);

        let first = ledger.mint(0, miner(), options()).await.unwrap();
        let second = ledger.mint(1, miner(), options()).await.unwrap();

        assert!(ledger.wait_for_receipt(&first).await.unwrap().success);
        assert!(!ledger.wait_for_receipt(&second).await.unwrap().success);
        assert_eq!(ledger.accepted_mints().len(), 1);
        assert_eq!(ledger.mints().len(), 2);
    }

    #[tokio::test]
    async fn history_is_bounded() {
        let ledger = SimulatedLedger::new(Challenge::new([1; 32]), Target::ZERO);

        let mut sent = Vec::new();
        for nonce in 0..(MINT_HISTORY as u64 + 5) {
            sent.push(ledger.mint(nonce, miner(), options()).await.unwrap());
        }

        let mints = ledger.mints();
        assert_eq!(mints.len(), MINT_HISTORY);
        assert_eq!(mints[0].nonce, 5);

        assert!(matches!(
            ledger.wait_for_receipt(&sent[0]).await,
            Err(LedgerError::Malformed { .. })
        ));

        let last = sent.last().unwrap();
        assert!(!ledger.wait_for_receipt(last).await.unwrap().success);
        assert!(ledger.wait_for_receipt(last).await.is_err());
    }

    #[tokio::test]
    async fn rotates_after_accepted_mint() {
        let challenge = Challenge::new([1; 32]);
        let ledger = SimulatedLedger::new(challenge, Target::MAX);

        ledger.mint(0, miner(), options()).await.unwrap();

        assert_eq!(ledger.current_challenge().await.unwrap(), challenge.next());
    }

    #[tokio::test]
    async fn rejects_invalid_solution() {
        let ledger = SimulatedLedger::new(Challenge::new([1; 32]), Target::ZERO);

        let tx = ledger.mint(0, miner(), options()).await.unwrap();

        assert!(!ledger.wait_for_receipt(&tx).await.unwrap().success);
        assert_eq!(ledger.challenge(), Challenge::new([1; 32]));
    }

    #[tokio::test]
    async fn debug_solution_reports_contract_hash() {
        let challenge = Challenge::new([4; 32]);
        let ledger = SimulatedLedger::new(challenge, Target::MAX);

        let solution = ledger.debug_solution(7, miner()).await.unwrap();
        assert!(solution.is_valid());
        assert_eq!(solution.hash, evaluate(&challenge, &miner(), 7));

        ledger.force_debug_mismatch(true);
        let solution = ledger.debug_solution(7, miner()).await.unwrap();
        assert_ne!(solution.hash, evaluate(&challenge, &miner(), 7));
        assert_eq!(ledger.debug_calls(), 2);
    }

    #[tokio::test]
    async fn outage_fails_every_call() {
        let ledger = SimulatedLedger::new(Challenge::new([1; 32]), Target::MAX);
        ledger.set_unavailable(true);

        assert!(matches!(
            ledger.current_challenge().await,
            Err(LedgerError::Unavailable { .. })
        ));
        assert!(ledger.gas_price().await.is_err());

        ledger.set_unavailable(false);
        assert!(ledger.current_challenge().await.is_ok());
    }

    #[tokio::test]
    async fn underpaid_mint_is_rejected() {
        let ledger = SimulatedLedger::new(Challenge::new([1; 32]), Target::MAX)
            .with_required_value("1 ether".parse().unwrap());

        assert!(matches!(
            ledger.mint(0, miner(), options()).await,
            Err(LedgerError::TransactionRejected { .. })
        ));
        assert!(ledger.mints().is_empty());
    }

    #[tokio::test]
    async fn balances_move_on_accepted_mint() {
        let ledger = SimulatedLedger::new(Challenge::new([1; 32]), Target::MAX)
            .with_balance(miner(), "1 ether".parse().unwrap())
            .with_reward(Amount::from_gwei(5));

        ledger.mint(0, miner(), options()).await.unwrap();

        let gas = Amount::from_gwei(25).saturating_mul(2_000_000);
        let expected = "1 ether"
            .parse::<Amount>()
            .unwrap()
            .saturating_sub(gas)
            .saturating_sub("0.06 ether".parse().unwrap());

        assert_eq!(ledger.native_balance(miner()).await.unwrap(), expected);
        assert_eq!(
            ledger.token_balance(miner()).await.unwrap(),
            Amount::from_gwei(5)
        );
    }
}
