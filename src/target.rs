use super::*;

/// Numeric threshold a digest must fall strictly below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, DeserializeFromStr, SerializeDisplay)]
pub struct Target(U256);

impl Target {
    /// `0x000000ffff…ff`: the threshold enforced by the challenge contract.
    pub const DEFAULT: Self = Self(U256([
        u64::MAX,
        u64::MAX,
        u64::MAX,
        0x0000_00ff_ffff_ffff,
    ]));

    pub const MAX: Self = Self(U256::MAX);

    pub const ZERO: Self = Self(U256([0; 4]));

    pub const fn new(value: U256) -> Self {
        Self(value)
    }

    pub fn value(&self) -> U256 {
        self.0
    }

    pub fn is_met_by(&self, digest: &Digest) -> bool {
        digest.to_u256() < self.0
    }

    /// Expected number of evaluations per valid digest.
    pub fn expected_hashes(&self) -> f64 {
        if self.0.is_zero() {
            return f64::INFINITY;
        }

        2f64.powi(256) / u256_to_f64(self.0)
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn u256_to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * 2f64.powi(64) + *limb as f64)
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        ensure!(
            !digits.is_empty() && digits.len() <= 64,
            "target `{s}` must have between 1 and 64 hex digits"
        );

        let value = U256::from_str_radix(digits, 16)
            .map_err(|err| anyhow!("invalid target `{s}`: {err:?}"))?;

        Ok(Self(value))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.to_big_endian()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_six_leading_zero_nibbles() {
        let text = Target::DEFAULT.to_string();
        assert_eq!(text, format!("0x000000{}", "f".repeat(58)));
    }

    #[test]
    fn parses_short_and_long_forms() {
        assert_eq!("0x1".parse::<Target>().unwrap().value(), U256::one());
        assert_eq!("ff".parse::<Target>().unwrap().value(), U256::from(255u64));
        assert_eq!(
            format!("0x000000{}", "F".repeat(58))
                .parse::<Target>()
                .unwrap(),
            Target::DEFAULT
        );
    }

    #[test]
    fn rejects_oversized_or_garbage() {
        assert!(format!("0x1{}", "0".repeat(64)).parse::<Target>().is_err());
        assert!("0x".parse::<Target>().is_err());
        assert!("0xzz".parse::<Target>().is_err());
    }

    #[test]
    fn boundary_is_strict() {
        let target = Target::new(U256::from(1000u64));
        assert!(target.is_met_by(&Digest::from(U256::from(999u64))));
        assert!(!target.is_met_by(&Digest::from(U256::from(1000u64))));
        assert!(!target.is_met_by(&Digest::from(U256::from(1001u64))));
    }

    #[test]
    fn expected_hashes_scales_with_target() {
        let easy = Target::new(U256::MAX >> 1).expected_hashes();
        let hard = Target::DEFAULT.expected_hashes();
        assert!((easy - 2.0).abs() < 1e-9, "easy={easy}");
        assert!((hard - 2f64.powi(24)).abs() / hard < 1e-9, "hard={hard}");
        assert!(Target::ZERO.expected_hashes().is_infinite());
    }
}
