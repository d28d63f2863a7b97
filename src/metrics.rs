use super::*;

/// Exponentially weighted hash rate over a time window, sampled from the
/// running hash counter.
#[derive(Debug)]
struct RateWindow {
    window: Duration,
    last_total: u64,
    last_sample: Instant,
    value: f64,
}

impl RateWindow {
    fn new(window: Duration, now: Instant) -> Self {
        Self {
            window,
            last_total: 0,
            last_sample: now,
            value: 0.0,
        }
    }

    fn sample(&mut self, total: u64, now: Instant) -> f64 {
        let elapsed = now.duration_since(self.last_sample).as_secs_f64();

        if elapsed <= 0.0 {
            return self.value;
        }

        let rate = total.saturating_sub(self.last_total) as f64 / elapsed;
        let weight = -(-(elapsed / self.window.as_secs_f64()).min(36.0)).exp_m1();

        self.value += (rate - self.value) * weight;
        self.last_total = total;
        self.last_sample = now;

        self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub hashes: u64,
    pub candidates: u64,
    pub confirmed: u64,
    pub rejected: u64,
    pub rotations: u64,
    pub ledger_errors: u64,
    pub rounds: u64,
    pub uptime_secs: u64,
    pub average_hash_rate: HashRate,
}

/// Counters shared by every worker in the process.
#[derive(Debug)]
pub struct Metrics {
    hashes: AtomicU64,
    candidates: AtomicU64,
    confirmed: AtomicU64,
    rejected: AtomicU64,
    rotations: AtomicU64,
    ledger_errors: AtomicU64,
    rounds: AtomicU64,
    started: Instant,
    rate: Mutex<RateWindow>,
}

impl Metrics {
    pub fn new() -> Self {
        let now = Instant::now();

        Self {
            hashes: AtomicU64::new(0),
            candidates: AtomicU64::new(0),
            confirmed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            rotations: AtomicU64::new(0),
            ledger_errors: AtomicU64::new(0),
            rounds: AtomicU64::new(0),
            started: now,
            rate: Mutex::new(RateWindow::new(Duration::from_secs(30), now)),
        }
    }

    pub fn add_hashes(&self, hashes: u64) {
        self.hashes.fetch_add(hashes, Ordering::Relaxed);
    }

    pub fn add_candidate(&self) {
        self.candidates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_confirmed(&self) {
        self.confirmed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_ledger_error(&self) {
        self.ledger_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_round(&self) {
        self.rounds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_hashes(&self) -> u64 {
        self.hashes.load(Ordering::Relaxed)
    }

    pub fn confirmed(&self) -> u64 {
        self.confirmed.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    pub fn rounds(&self) -> u64 {
        self.rounds.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn hash_rate(&self) -> HashRate {
        HashRate(self.rate.lock().sample(self.total_hashes(), Instant::now()))
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            hashes: self.total_hashes(),
            candidates: self.candidates.load(Ordering::Relaxed),
            confirmed: self.confirmed(),
            rejected: self.rejected(),
            rotations: self.rotations(),
            ledger_errors: self.ledger_errors.load(Ordering::Relaxed),
            rounds: self.rounds(),
            uptime_secs: self.uptime().as_secs(),
            average_hash_rate: HashRate::from_hashes(self.total_hashes(), self.uptime()),
        }
    }

    pub fn status_line(&self) -> String {
        format!(
            "hashrate={}  hashes={}  confirmed={}  rejected={}  rotations={}  uptime={}s",
            self.hash_rate(),
            self.total_hashes(),
            self.confirmed(),
            self.rejected(),
            self.rotations(),
            self.uptime().as_secs()
        )
    }

    /// Logs the status line every `every` until cancelled.
    pub(crate) fn spawn_reporter(
        self: &Arc<Self>,
        every: Duration,
        cancel: CancellationToken,
        tasks: &mut JoinSet<()>,
    ) {
        let metrics = self.clone();

        tasks.spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => info!("{}", metrics.status_line()),
                }
            }
        });
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
