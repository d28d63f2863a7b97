use super::*;

/// One-shot multiplicative bump over the ledger's base gas price, clamped to a
/// floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DeserializeFromStr, SerializeDisplay)]
pub struct GasPolicy {
    pub numerator: u64,
    pub denominator: u64,
    pub floor: Amount,
}

impl GasPolicy {
    pub fn new(numerator: u64, denominator: u64, floor: Amount) -> Result<Self> {
        ensure!(denominator != 0, "gas price multiplier denominator must be nonzero");

        Ok(Self {
            numerator,
            denominator,
            floor,
        })
    }

    pub fn with_floor(self, floor: Amount) -> Self {
        Self { floor, ..self }
    }

    /// `max(base * numerator / denominator, floor)`
    pub fn price(&self, base: Amount) -> Amount {
        let proposed = Amount::from_wei(
            base.saturating_mul(self.numerator).wei() / U256::from(self.denominator),
        );

        proposed.max(self.floor)
    }
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            numerator: 5,
            denominator: 4,
            floor: Amount::from_gwei(20),
        }
    }
}

/// Parses the multiplier as `numerator/denominator`, keeping the default floor.
impl FromStr for GasPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (numerator, denominator) = s
            .split_once('/')
            .with_context(|| format!("gas price multiplier `{s}` must be `numerator/denominator`"))?;

        Self::new(
            numerator
                .trim()
                .parse()
                .with_context(|| format!("invalid multiplier numerator in `{s}`"))?,
            denominator
                .trim()
                .parse()
                .with_context(|| format!("invalid multiplier denominator in `{s}`"))?,
            Self::default().floor,
        )
    }
}

impl fmt::Display for GasPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bumps_base_price() {
        let policy = GasPolicy::default();
        assert_eq!(policy.price(Amount::from_gwei(40)), Amount::from_gwei(50));
    }

    #[test]
    fn floor_applies_to_cheap_base() {
        let policy = GasPolicy::default();
        assert_eq!(policy.price(Amount::from_gwei(8)), Amount::from_gwei(20));
        assert_eq!(policy.price(Amount::ZERO), Amount::from_gwei(20));
    }

    #[test]
    fn floor_boundary() {
        let policy = GasPolicy::default();
        assert_eq!(policy.price(Amount::from_gwei(16)), Amount::from_gwei(20));
        assert_eq!(policy.price(Amount::from_gwei(17)), "21.25 gwei".parse().unwrap());
    }

    #[test]
    fn integer_division_truncates() {
        let policy = GasPolicy::new(5, 4, Amount::ZERO).unwrap();
        assert_eq!(
            policy.price(Amount::from_wei(U256::from(3u64))),
            Amount::from_wei(U256::from(3u64))
        );
    }

    #[test]
    fn parse_multiplier() {
        let policy = "3/2".parse::<GasPolicy>().unwrap();
        assert_eq!(policy.numerator, 3);
        assert_eq!(policy.denominator, 2);
        assert_eq!(policy.floor, Amount::from_gwei(20));
        assert_eq!(policy.to_string(), "3/2");
    }

    #[test]
    fn parse_errors() {
        assert!("5".parse::<GasPolicy>().is_err());
        assert!("5/0".parse::<GasPolicy>().is_err());
        assert!("a/4".parse::<GasPolicy>().is_err());
    }
}
