use {super::*, options::Options, std::path::Path};

const CONFIG_FILE: &str = "powminer.toml";
const ENV_PREFIX: &str = "POWMINER_";

/// TOML config file structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub config: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub miner: Option<MinerSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MinerSection {
    pub identity: Option<MinerIdentity>,
    pub workers: Option<usize>,
    pub range_size: Option<u64>,
    pub rotation_check_interval: Option<u64>,
    pub round_delay: Option<f64>,
    pub gas_price_multiplier: Option<GasPolicy>,
    pub gas_price_floor: Option<Amount>,
    pub gas_limit: Option<u64>,
    pub mint_value: Option<Amount>,
    pub target: Option<Target>,
    pub error_backoff: Option<f64>,
    pub confirmation_timeout: Option<f64>,
    pub status_interval: Option<f64>,
}

/// Every configuration source merged, highest priority first: command line,
/// `POWMINER_*` environment, config file, defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Settings {
    pub config: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub identity: Option<MinerIdentity>,
    pub workers: Option<usize>,
    pub range_size: Option<u64>,
    pub rotation_check_interval: Option<u64>,
    pub round_delay: Option<f64>,
    pub gas_price_multiplier: Option<GasPolicy>,
    pub gas_price_floor: Option<Amount>,
    pub gas_limit: Option<u64>,
    pub mint_value: Option<Amount>,
    pub target: Option<Target>,
    pub error_backoff: Option<f64>,
    pub confirmation_timeout: Option<f64>,
    pub status_interval: Option<f64>,
}

impl Settings {
    pub fn load(options: Options) -> Result<Self> {
        let mut env = BTreeMap::<String, String>::new();

        for (var, value) in std::env::vars_os() {
            let Some(var) = var.to_str() else {
                continue;
            };

            let Some(key) = var.strip_prefix(ENV_PREFIX) else {
                continue;
            };

            env.insert(
                key.into(),
                value.into_string().map_err(|value| {
                    anyhow!(
                        "environment variable `{var}` not valid unicode: `{}`",
                        value.to_string_lossy()
                    )
                })?,
            );
        }

        Self::merge(options, env)
    }

    pub fn merge(options: Options, env: BTreeMap<String, String>) -> Result<Self> {
        let settings = Self::from_options(&options).or(Self::from_env(&env)?);

        let config = match Self::find_config_path(&settings) {
            Some(path) => Self::read_config(&path)?,
            None => Config::default(),
        };

        let settings = settings.or(Self::from_config(&config)).or_defaults();

        settings.validate()?;

        Ok(settings)
    }

    fn read_config(path: &Path) -> Result<Config> {
        toml::from_str(
            &fs::read_to_string(path)
                .with_context(|| format!("failed to open config file `{}`", path.display()))?,
        )
        .with_context(|| format!("failed to deserialize config file `{}`", path.display()))
    }

    fn find_config_path(settings: &Self) -> Option<PathBuf> {
        if let Some(path) = &settings.config {
            return Some(path.clone());
        }

        if let Some(dir) = &settings.config_dir {
            let path = dir.join(CONFIG_FILE);
            if path.exists() {
                return Some(path);
            }
        }

        dirs::config_dir()
            .map(|dir| dir.join("powminer").join(CONFIG_FILE))
            .filter(|path| path.exists())
    }

    pub fn from_options(options: &Options) -> Self {
        Self {
            config: options.config.clone(),
            config_dir: options.config_dir.clone(),
            identity: options.identity,
            workers: options.workers,
            range_size: options.range_size,
            rotation_check_interval: options.rotation_check_interval,
            round_delay: options.round_delay,
            gas_price_multiplier: options.gas_price_multiplier,
            gas_price_floor: options.gas_price_floor,
            gas_limit: options.gas_limit,
            mint_value: options.mint_value,
            target: options.target,
            error_backoff: options.error_backoff,
            confirmation_timeout: options.confirmation_timeout,
            status_interval: options.status_interval,
        }
    }

    pub fn from_env(env: &BTreeMap<String, String>) -> Result<Self> {
        fn get<T>(env: &BTreeMap<String, String>, key: &str) -> Result<Option<T>>
        where
            T: FromStr,
            T::Err: Into<Error>,
        {
            env.get(key)
                .map(|value| value.parse::<T>().map_err(Into::into))
                .transpose()
                .with_context(|| format!("failed to parse environment variable {ENV_PREFIX}{key}"))
        }

        let get_path = |key: &str| env.get(key).map(PathBuf::from);

        Ok(Self {
            config: get_path("CONFIG"),
            config_dir: get_path("CONFIG_DIR"),
            identity: get(env, "IDENTITY")?,
            workers: get(env, "WORKERS")?,
            range_size: get(env, "RANGE_SIZE")?,
            rotation_check_interval: get(env, "ROTATION_CHECK_INTERVAL")?,
            round_delay: get(env, "ROUND_DELAY")?,
            gas_price_multiplier: get(env, "GAS_PRICE_MULTIPLIER")?,
            gas_price_floor: get(env, "GAS_PRICE_FLOOR")?,
            gas_limit: get(env, "GAS_LIMIT")?,
            mint_value: get(env, "MINT_VALUE")?,
            target: get(env, "TARGET")?,
            error_backoff: get(env, "ERROR_BACKOFF")?,
            confirmation_timeout: get(env, "CONFIRMATION_TIMEOUT")?,
            status_interval: get(env, "STATUS_INTERVAL")?,
        })
    }

    pub fn from_config(config: &Config) -> Self {
        let miner = config.miner.clone().unwrap_or_default();

        Self {
            config: config.config.clone(),
            config_dir: config.config_dir.clone(),
            identity: miner.identity,
            workers: miner.workers,
            range_size: miner.range_size,
            rotation_check_interval: miner.rotation_check_interval,
            round_delay: miner.round_delay,
            gas_price_multiplier: miner.gas_price_multiplier,
            gas_price_floor: miner.gas_price_floor,
            gas_limit: miner.gas_limit,
            mint_value: miner.mint_value,
            target: miner.target,
            error_backoff: miner.error_backoff,
            confirmation_timeout: miner.confirmation_timeout,
            status_interval: miner.status_interval,
        }
    }

    /// Merge self with another Settings, self takes priority
    pub fn or(self, other: Self) -> Self {
        Self {
            config: self.config.or(other.config),
            config_dir: self.config_dir.or(other.config_dir),
            identity: self.identity.or(other.identity),
            workers: self.workers.or(other.workers),
            range_size: self.range_size.or(other.range_size),
            rotation_check_interval: self
                .rotation_check_interval
                .or(other.rotation_check_interval),
            round_delay: self.round_delay.or(other.round_delay),
            gas_price_multiplier: self.gas_price_multiplier.or(other.gas_price_multiplier),
            gas_price_floor: self.gas_price_floor.or(other.gas_price_floor),
            gas_limit: self.gas_limit.or(other.gas_limit),
            mint_value: self.mint_value.or(other.mint_value),
            target: self.target.or(other.target),
            error_backoff: self.error_backoff.or(other.error_backoff),
            confirmation_timeout: self.confirmation_timeout.or(other.confirmation_timeout),
            status_interval: self.status_interval.or(other.status_interval),
        }
    }

    fn or_defaults(self) -> Self {
        let defaults = MinerConfig::default();

        Self {
            config: self.config,
            config_dir: self.config_dir,
            identity: self.identity,
            workers: Some(self.workers.unwrap_or(defaults.workers)),
            range_size: Some(self.range_size.unwrap_or(defaults.range_size)),
            rotation_check_interval: Some(
                self.rotation_check_interval
                    .unwrap_or(defaults.rotation_check_interval),
            ),
            round_delay: Some(
                self.round_delay
                    .unwrap_or(defaults.round_delay.as_secs_f64()),
            ),
            gas_price_multiplier: Some(self.gas_price_multiplier.unwrap_or(defaults.gas)),
            gas_price_floor: Some(self.gas_price_floor.unwrap_or(defaults.gas.floor)),
            gas_limit: Some(self.gas_limit.unwrap_or(defaults.gas_limit)),
            mint_value: Some(self.mint_value.unwrap_or(defaults.mint_value)),
            target: Some(self.target.unwrap_or(defaults.target)),
            error_backoff: Some(
                self.error_backoff
                    .unwrap_or(defaults.error_backoff.as_secs_f64()),
            ),
            confirmation_timeout: self.confirmation_timeout,
            status_interval: Some(
                self.status_interval
                    .unwrap_or(defaults.status_interval.as_secs_f64()),
            ),
        }
    }

    fn validate(&self) -> Result {
        for (name, seconds) in [
            ("round delay", self.round_delay),
            ("error backoff", self.error_backoff),
            ("confirmation timeout", self.confirmation_timeout),
            ("status interval", self.status_interval),
        ] {
            if let Some(seconds) = seconds {
                seconds_to_duration(name, seconds)?;
            }
        }

        ensure!(
            self.status_interval != Some(0.0),
            "status interval must be positive"
        );

        if let (Some(workers), Some(range_size)) = (self.workers, self.range_size) {
            ensure!(workers > 0, "workers must be at least 1");
            ensure!(range_size > 0, "range size must be at least 1");
            partition(workers, range_size)?;
        }

        ensure!(
            self.rotation_check_interval != Some(0),
            "rotation check interval must be at least 1"
        );

        Ok(())
    }

    /// Resolves into the immutable configuration the miner runs with. A
    /// random identity is chosen when none was configured.
    pub fn miner_config(&self) -> Result<MinerConfig> {
        let defaults = MinerConfig::default();

        let identity = self.identity.unwrap_or_else(|| {
            let identity = MinerIdentity::random();
            info!("No identity configured, mining as {identity}");
            identity
        });

        let seconds = |name: &str, value: Option<f64>, default: Duration| {
            value
                .map(|value| seconds_to_duration(name, value))
                .transpose()
                .map(|value| value.unwrap_or(default))
        };

        let config = MinerConfig {
            identity,
            workers: self.workers.unwrap_or(defaults.workers),
            range_size: self.range_size.unwrap_or(defaults.range_size),
            rotation_check_interval: self
                .rotation_check_interval
                .unwrap_or(defaults.rotation_check_interval),
            round_delay: seconds("round delay", self.round_delay, defaults.round_delay)?,
            gas: self
                .gas_price_multiplier
                .unwrap_or(defaults.gas)
                .with_floor(self.gas_price_floor.unwrap_or(defaults.gas.floor)),
            gas_limit: self.gas_limit.unwrap_or(defaults.gas_limit),
            mint_value: self.mint_value.unwrap_or(defaults.mint_value),
            target: self.target.unwrap_or(defaults.target),
            error_backoff: seconds("error backoff", self.error_backoff, defaults.error_backoff)?,
            confirmation_timeout: self
                .confirmation_timeout
                .map(|value| seconds_to_duration("confirmation timeout", value))
                .transpose()?,
            status_interval: seconds(
                "status interval",
                self.status_interval,
                defaults.status_interval,
            )?,
        };

        config.validate()?;

        Ok(config)
    }
}

fn seconds_to_duration(name: &str, seconds: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(seconds)
        .with_context(|| format!("{name} of {seconds} seconds is not a valid duration"))
}
