use {
    anyhow::{Context, Error, anyhow, ensure},
    arguments::Arguments,
    async_trait::async_trait,
    clap::Parser,
    derive_more::Display,
    hashrate::HashRate,
    parking_lot::Mutex,
    primitive_types::U256,
    serde::{Deserialize, Serialize},
    serde_with::{DeserializeFromStr, SerializeDisplay},
    sha3::Keccak256,
    snafu::Snafu,
    std::{
        collections::BTreeMap,
        env,
        fmt::{self, Formatter},
        fs,
        io,
        path::PathBuf,
        process,
        str::FromStr,
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::{Duration, Instant},
    },
    tokio::{
        runtime::{Handle, Runtime},
        sync::mpsc,
        task::JoinSet,
        time::{MissedTickBehavior, interval, sleep},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
    tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt},
};

pub use {
    amount::Amount,
    challenge::Challenge,
    digest::Digest,
    evaluator::{Evaluator, evaluate, is_valid, miner_specific_challenge},
    gas::GasPolicy,
    identity::MinerIdentity,
    ledger::{
        DebugSolution, Ledger, LedgerError, MintOptions, Receipt, TxHandle, VALID_SOLUTION_MESSAGE,
        simulated::{MintRecord, SimulatedLedger},
    },
    metrics::{Metrics, MetricsSummary},
    miner_config::MinerConfig,
    orchestrator::Orchestrator,
    partition::{SearchRange, partition},
    status::WorkerStatus,
    submission::{
        Balances, Candidate, Rejection, SubmissionCoordinator, SubmissionError, SubmissionResult,
    },
    target::Target,
    tracker::ChallengeTracker,
    worker::{Worker, WorkerFault, WorkerState},
};

mod amount;
mod arguments;
mod challenge;
mod digest;
mod evaluator;
mod gas;
mod hashrate;
mod identity;
pub mod ledger;
mod logs;
mod metrics;
mod miner_config;
mod options;
mod orchestrator;
mod partition;
mod settings;
mod signal;
mod status;
mod submission;
mod subcommand;
mod target;
mod tracker;
mod worker;

pub const STATUS_CHANNEL_CAPACITY: usize = 64;

type Result<T = (), E = Error> = std::result::Result<T, E>;

/// Decodes a fixed-width hex value, with or without a `0x` prefix.
fn decode_hex<const N: usize>(s: &str) -> Result<[u8; N]> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);

    ensure!(
        digits.len() == N * 2,
        "expected {} hex digits, got {}",
        N * 2,
        digits.len()
    );

    let mut bytes = [0u8; N];
    hex::decode_to_slice(digits, &mut bytes).with_context(|| format!("invalid hex `{s}`"))?;

    Ok(bytes)
}

pub fn main() {
    let guard = logs::init();

    let args = Arguments::parse();

    let code = Runtime::new()
        .expect("Failed to create tokio runtime")
        .block_on(async {
            let cancel_token = signal::setup_signal_handler();

            match args.run(cancel_token).await {
                Err(err) => {
                    eprintln!("error: {err}");

                    for (i, cause) in err.chain().skip(1).enumerate() {
                        if i == 0 {
                            eprintln!();
                            eprintln!("because:");
                        }
                        eprintln!("- {cause}");
                    }

                    if env::var_os("RUST_BACKTRACE")
                        .map(|val| val == "1")
                        .unwrap_or_default()
                    {
                        eprintln!();
                        eprintln!("{}", err.backtrace());
                    }

                    1
                }
                Ok(_) => 0,
            }
        });

    drop(guard);

    process::exit(code);
}
