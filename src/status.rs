use super::*;

/// Progress events a worker reports to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerStatus {
    Started {
        range: SearchRange,
        challenge: Challenge,
    },
    Rotated {
        from: Challenge,
        to: Challenge,
    },
    CandidateFound(Candidate),
    Submitted {
        nonce: u64,
        tx: TxHandle,
        gas_price: Amount,
    },
    Confirmed {
        nonce: u64,
        tx: TxHandle,
        balances: Option<Balances>,
    },
    Rejected {
        nonce: u64,
        rejection: Rejection,
    },
    LedgerError {
        message: String,
    },
    Exited {
        reason: String,
    },
}

impl WorkerStatus {
    pub fn log(&self, worker: u64) {
        match self {
            Self::Started { range, challenge } => {
                info!("Worker {worker}: searching {range} for challenge {challenge}")
            }
            Self::Rotated { from, to } => {
                info!("Worker {worker}: challenge rotated {from} -> {to}, restarting range")
            }
            Self::CandidateFound(candidate) => info!(
                "Worker {worker}: found nonce {} with hash {}",
                candidate.nonce, candidate.hash
            ),
            Self::Submitted {
                nonce,
                tx,
                gas_price,
            } => info!(
                "Worker {worker}: submitted nonce {nonce} in {tx} at {} gwei",
                gas_price.format_units(9)
            ),
            Self::Confirmed {
                nonce,
                tx,
                balances,
            } => {
                info!("Worker {worker}: mint for nonce {nonce} confirmed in {tx}");

                if let Some(balances) = balances {
                    info!("Worker {worker}: {balances}");
                }
            }
            Self::Rejected { nonce, rejection } => {
                warn!("Worker {worker}: nonce {nonce} rejected: {rejection}")
            }
            Self::LedgerError { message } => warn!("Worker {worker}: ledger error: {message}"),
            Self::Exited { reason } => error!("Worker {worker}: exited: {reason}"),
        }
    }
}

/// Sending half of a worker's bounded status channel. Never blocks: when the
/// channel is full the event is dropped and counted.
#[derive(Debug, Clone)]
pub struct StatusSender {
    tx: mpsc::Sender<WorkerStatus>,
    dropped: Arc<AtomicU64>,
}

impl StatusSender {
    pub fn send(&self, status: WorkerStatus) {
        if self.tx.try_send(status).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

pub fn channel(capacity: usize) -> (StatusSender, mpsc::Receiver<WorkerStatus>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    (
        StatusSender {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        },
        rx,
    )
}
