use super::*;

pub mod simulated;

/// Message the challenge contract returns from `debugSolution` when the
/// submitted nonce solves the current challenge.
pub const VALID_SOLUTION_MESSAGE: &str = "Solution is valid";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LedgerError {
    #[snafu(display("Ledger unavailable: {message}"))]
    Unavailable { message: String },

    #[snafu(display("Transaction rejected: {reason}"))]
    TransactionRejected { reason: String },

    #[snafu(display("Malformed ledger response: {message}"))]
    Malformed { message: String },
}

impl LedgerError {
    /// The ledger answered with something the miner cannot interpret.
    /// Everything else is worth retrying after a back-off.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugSolution {
    pub message: String,
    pub hash: Digest,
}

impl DebugSolution {
    pub fn is_valid(&self) -> bool {
        self.message == VALID_SOLUTION_MESSAGE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintOptions {
    pub gas_limit: u64,
    pub gas_price: Amount,
    pub value: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{hash}")]
pub struct TxHandle {
    pub hash: Digest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx: TxHandle,
    pub success: bool,
}

/// The slice of the challenge contract (and its chain) the miner depends on.
/// Implementations own transport, signing, and encoding; the miner only sees
/// these calls. Must be safe to share across all workers.
#[async_trait]
pub trait Ledger: Send + Sync + 'static {
    async fn current_challenge(&self) -> Result<Challenge, LedgerError>;

    async fn debug_solution(
        &self,
        nonce: u64,
        miner: MinerIdentity,
    ) -> Result<DebugSolution, LedgerError>;

    async fn mint(
        &self,
        nonce: u64,
        miner: MinerIdentity,
        options: MintOptions,
    ) -> Result<TxHandle, LedgerError>;

    async fn wait_for_receipt(&self, tx: &TxHandle) -> Result<Receipt, LedgerError>;

    async fn gas_price(&self) -> Result<Amount, LedgerError>;

    async fn native_balance(&self, miner: MinerIdentity) -> Result<Amount, LedgerError>;

    async fn token_balance(&self, miner: MinerIdentity) -> Result<Amount, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_malformed_is_unrecoverable() {
        assert!(
            !LedgerError::Unavailable {
                message: "timeout".into()
            }
            .is_unrecoverable()
        );
        assert!(
            !LedgerError::TransactionRejected {
                reason: "nonce too low".into()
            }
            .is_unrecoverable()
        );
        assert!(
            LedgerError::Malformed {
                message: "bad hex".into()
            }
            .is_unrecoverable()
        );
    }

    #[test]
    fn debug_solution_validity_uses_contract_message() {
        let valid = DebugSolution {
            message: VALID_SOLUTION_MESSAGE.into(),
            hash: Digest::default(),
        };
        let invalid = DebugSolution {
            message: "Solution is invalid".into(),
            hash: Digest::default(),
        };
        assert!(valid.is_valid());
        assert!(!invalid.is_valid());
    }

    #[test]
    fn error_display() {
        assert_eq!(
            LedgerError::Unavailable {
                message: "connection refused".into()
            }
            .to_string(),
            "Ledger unavailable: connection refused"
        );
    }
}
