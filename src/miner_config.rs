use super::*;

/// Resolved, validated miner configuration shared by the orchestrator, its
/// workers, and their submission coordinators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinerConfig {
    pub identity: MinerIdentity,
    pub workers: usize,
    pub range_size: u64,
    pub rotation_check_interval: u64,
    pub round_delay: Duration,
    pub gas: GasPolicy,
    pub gas_limit: u64,
    pub mint_value: Amount,
    pub target: Target,
    pub error_backoff: Duration,
    pub confirmation_timeout: Option<Duration>,
    pub status_interval: Duration,
}

impl MinerConfig {
    pub const DEFAULT_WORKERS: usize = 4;
    pub const DEFAULT_RANGE_SIZE: u64 = 50_000_000;
    pub const DEFAULT_ROTATION_CHECK_INTERVAL: u64 = 100_000;
    pub const DEFAULT_ROUND_DELAY: Duration = Duration::from_secs(10);
    pub const DEFAULT_GAS_LIMIT: u64 = 2_000_000;
    pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(10);
    pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(5);

    pub fn default_mint_value() -> Amount {
        Amount::from_wei(U256::from(60_000_000_000_000_000u64))
    }

    pub fn validate(&self) -> Result {
        ensure!(self.workers > 0, "workers must be at least 1");
        ensure!(self.range_size > 0, "range size must be at least 1");
        ensure!(
            self.rotation_check_interval > 0,
            "rotation check interval must be at least 1"
        );
        ensure!(
            self.gas.denominator > 0,
            "gas price multiplier denominator must be nonzero"
        );
        ensure!(
            !self.status_interval.is_zero(),
            "status interval must be positive"
        );

        partition(self.workers, self.range_size)?;

        Ok(())
    }

    pub fn mint_options(&self, gas_price: Amount) -> MintOptions {
        MintOptions {
            gas_limit: self.gas_limit,
            gas_price,
            value: self.mint_value,
        }
    }
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            identity: MinerIdentity::default(),
            workers: Self::DEFAULT_WORKERS,
            range_size: Self::DEFAULT_RANGE_SIZE,
            rotation_check_interval: Self::DEFAULT_ROTATION_CHECK_INTERVAL,
            round_delay: Self::DEFAULT_ROUND_DELAY,
            gas: GasPolicy::default(),
            gas_limit: Self::DEFAULT_GAS_LIMIT,
            mint_value: Self::default_mint_value(),
            target: Target::DEFAULT,
            error_backoff: Self::DEFAULT_ERROR_BACKOFF,
            confirmation_timeout: None,
            status_interval: Self::DEFAULT_STATUS_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_miner() {
        let config = MinerConfig::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.range_size, 50_000_000);
        assert_eq!(config.rotation_check_interval, 100_000);
        assert_eq!(config.round_delay, Duration::from_secs(10));
        assert_eq!(config.gas_limit, 2_000_000);
        assert_eq!(config.mint_value, "0.06 ether".parse().unwrap());
        assert_eq!(config.gas.floor, Amount::from_gwei(20));
        assert_eq!(config.target, Target::DEFAULT);
        assert_eq!(config.confirmation_timeout, None);
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        for config in [
            MinerConfig {
                workers: 0,
                ..Default::default()
            },
            MinerConfig {
                range_size: 0,
                ..Default::default()
            },
            MinerConfig {
                rotation_check_interval: 0,
                ..Default::default()
            },
            MinerConfig {
                workers: 2,
                range_size: u64::MAX,
                ..Default::default()
            },
        ] {
            assert!(config.validate().is_err(), "accepted {config:?}");
        }
    }

    #[test]
    fn mint_options_use_fixed_limit_and_value() {
        let config = MinerConfig::default();
        assert_eq!(
            config.mint_options(Amount::from_gwei(30)),
            MintOptions {
                gas_limit: 2_000_000,
                gas_price: Amount::from_gwei(30),
                value: "0.06 ether".parse().unwrap(),
            }
        );
    }
}
