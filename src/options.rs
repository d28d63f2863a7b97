use super::*;

#[derive(Clone, Default, Debug, Parser)]
pub struct Options {
    #[arg(long, global = true, help = "Load configuration from <CONFIG>.")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Load configuration from <CONFIG_DIR>/powminer.toml."
    )]
    pub config_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "Mine as <IDENTITY>. [default: random]")]
    pub identity: Option<MinerIdentity>,

    #[arg(long, global = true, help = "Run <WORKERS> parallel search workers. [default: 4]")]
    pub workers: Option<usize>,

    #[arg(
        long,
        global = true,
        help = "Give each worker <RANGE_SIZE> nonces. [default: 50000000]"
    )]
    pub range_size: Option<u64>,

    #[arg(
        long,
        global = true,
        help = "Check for challenge rotation every <ROTATION_CHECK_INTERVAL> hashes. [default: 100000]"
    )]
    pub rotation_check_interval: Option<u64>,

    #[arg(
        long,
        global = true,
        help = "Wait <ROUND_DELAY> seconds between rounds. [default: 10]"
    )]
    pub round_delay: Option<f64>,

    #[arg(
        long,
        global = true,
        help = "Multiply the base gas price by <GAS_PRICE_MULTIPLIER>, given as `numerator/denominator`. [default: 5/4]"
    )]
    pub gas_price_multiplier: Option<GasPolicy>,

    #[arg(
        long,
        global = true,
        help = "Never bid less than <GAS_PRICE_FLOOR>. [default: 20 gwei]"
    )]
    pub gas_price_floor: Option<Amount>,

    #[arg(long, global = true, help = "Submit mints with <GAS_LIMIT>. [default: 2000000]")]
    pub gas_limit: Option<u64>,

    #[arg(
        long,
        global = true,
        help = "Attach <MINT_VALUE> to every mint. [default: 0.06 ether]"
    )]
    pub mint_value: Option<Amount>,

    #[arg(
        long,
        global = true,
        help = "Accept hashes below <TARGET>. [default: 0x000000ff…ff]"
    )]
    pub target: Option<Target>,

    #[arg(
        long,
        global = true,
        help = "Back off <ERROR_BACKOFF> seconds after a ledger error. [default: 10]"
    )]
    pub error_backoff: Option<f64>,

    #[arg(
        long,
        global = true,
        help = "Give up on a receipt after <CONFIRMATION_TIMEOUT> seconds. [default: wait forever]"
    )]
    pub confirmation_timeout: Option<f64>,

    #[arg(
        long,
        global = true,
        help = "Log a status line every <STATUS_INTERVAL> seconds. [default: 5]"
    )]
    pub status_interval: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = Options::default();
        assert!(options.config.is_none());
        assert!(options.workers.is_none());
        assert!(options.target.is_none());
    }

    #[test]
    fn parse_miner_options() {
        let options = Options::try_parse_from([
            "powminer",
            "--workers",
            "8",
            "--range-size",
            "1000",
            "--gas-price-multiplier",
            "3/2",
            "--gas-price-floor",
            "15 gwei",
            "--mint-value",
            "0.1 ether",
            "--round-delay",
            "0.5",
        ])
        .unwrap();

        assert_eq!(options.workers, Some(8));
        assert_eq!(options.range_size, Some(1_000));
        assert_eq!(options.gas_price_multiplier.unwrap().to_string(), "3/2");
        assert_eq!(options.gas_price_floor, Some(Amount::from_gwei(15)));
        assert_eq!(options.mint_value, Some("0.1 ether".parse().unwrap()));
        assert_eq!(options.round_delay, Some(0.5));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Options::try_parse_from(["powminer", "--workers", "many"]).is_err());
        assert!(Options::try_parse_from(["powminer", "--identity", "0x1234"]).is_err());
        assert!(Options::try_parse_from(["powminer", "--gas-price-multiplier", "5"]).is_err());
    }
}
