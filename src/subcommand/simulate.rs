use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Simulate {
    #[arg(long, help = "Start from <CHALLENGE>. [default: random]")]
    challenge: Option<Challenge>,
    #[arg(long, help = "Stop after <DURATION> seconds. [default: run until interrupted]")]
    duration: Option<f64>,
    #[arg(long, help = "Rotate the challenge every <ROTATE_EVERY> seconds.")]
    rotate_every: Option<f64>,
    #[arg(long, help = "Quote a base gas price of <GAS_PRICE>. [default: 30 gwei]")]
    gas_price: Option<Amount>,
    #[arg(long, help = "Fund the miner with <BALANCE>. [default: 1 ether]")]
    balance: Option<Amount>,
}

#[derive(Debug, Serialize)]
pub struct Output {
    pub identity: MinerIdentity,
    pub initial_challenge: Challenge,
    pub final_challenge: Challenge,
    pub mints: Vec<MintRecord>,
    pub native_balance: Amount,
    pub token_balance: Amount,
    pub metrics: MetricsSummary,
}

impl Simulate {
    pub(crate) async fn run(self, settings: Settings, cancel: CancellationToken) -> Result {
        let config = Arc::new(settings.miner_config()?);

        let seconds = |name: &str, value: f64| {
            Duration::try_from_secs_f64(value)
                .with_context(|| format!("{name} of {value} seconds is not a valid duration"))
        };

        let duration = self
            .duration
            .map(|value| seconds("duration", value))
            .transpose()?;

        let rotate_every = self
            .rotate_every
            .map(|value| seconds("rotation period", value))
            .transpose()?
            .filter(|period| !period.is_zero());

        let initial_challenge = self.challenge.unwrap_or_else(Challenge::random);

        let ledger = Arc::new(
            SimulatedLedger::new(initial_challenge, config.target)
                .with_gas_price(self.gas_price.unwrap_or(Amount::from_gwei(30)))
                .with_balance(
                    config.identity,
                    self.balance
                        .unwrap_or(Amount::from_wei(U256::exp10(18))),
                ),
        );

        info!("Simulating ledger with challenge {initial_challenge}");

        let mut tasks = JoinSet::new();

        if let Some(duration) = duration {
            let cancel = cancel.clone();
            tasks.spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = sleep(duration) => {
                        info!("Simulation time elapsed");
                        cancel.cancel();
                    }
                }
            });
        }

        if let Some(period) = rotate_every {
            let cancel = cancel.clone();
            let ledger = ledger.clone();
            tasks.spawn(async move {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker.tick().await;

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {
                            let challenge = ledger.rotate();
                            info!("Ledger rotated challenge to {challenge}");
                        }
                    }
                }
            });
        }

        let orchestrator = Orchestrator::new(ledger.clone(), config.clone());

        let result = orchestrator.run(cancel.clone()).await;

        cancel.cancel();

        while tasks.join_next().await.is_some() {}

        result?;

        let output = Output {
            identity: config.identity,
            initial_challenge,
            final_challenge: ledger.challenge(),
            mints: ledger.mints(),
            native_balance: ledger.native_balance(config.identity).await?,
            token_balance: ledger.token_balance(config.identity).await?,
            metrics: orchestrator.metrics().summary(),
        };

        println!("{}", serde_json::to_string_pretty(&output)?);

        Ok(())
    }
}
