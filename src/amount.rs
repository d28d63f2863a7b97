use super::*;

const UNITS: &[(&str, usize)] = &[("wei", 0), ("gwei", 9), ("ether", 18)];

/// A quantity of the ledger's native currency (or reward token) in its
/// smallest unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, DeserializeFromStr, SerializeDisplay,
)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Self = Self(U256([0; 4]));

    pub const fn from_wei(wei: U256) -> Self {
        Self(wei)
    }

    pub fn from_gwei(gwei: u64) -> Self {
        Self(U256::from(gwei) * U256::exp10(9))
    }

    pub fn wei(&self) -> U256 {
        self.0
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn saturating_mul(self, factor: u64) -> Self {
        Self(self.0.saturating_mul(U256::from(factor)))
    }

    /// Renders the amount as a decimal number of `decimals`-scaled units,
    /// without trailing zeros.
    pub fn format_units(&self, decimals: usize) -> String {
        let scale = U256::exp10(decimals);
        let whole = self.0 / scale;
        let fraction = self.0 % scale;

        if fraction.is_zero() {
            return whole.to_string();
        }

        let fraction = format!("{:0>width$}", fraction.to_string(), width = decimals);

        format!("{whole}.{}", fraction.trim_end_matches('0'))
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (number, decimals) = UNITS
            .iter()
            .rev()
            .find_map(|(unit, decimals)| {
                s.strip_suffix(unit)
                    .map(|number| (number.trim(), *decimals))
            })
            .unwrap_or((s, 0));

        ensure!(!number.is_empty(), "amount `{s}` is missing a number");

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));

        ensure!(
            fraction.len() <= decimals,
            "amount `{s}` has more than {decimals} decimal places"
        );

        ensure!(
            whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()),
            "invalid amount `{s}`"
        );

        let digits = format!("{whole}{fraction:0<decimals$}");
        let digits = digits.trim_start_matches('0');

        if digits.is_empty() {
            return Ok(Self::ZERO);
        }

        let wei = U256::from_dec_str(digits)
            .map_err(|err| anyhow!("invalid amount `{s}`: {err:?}"))?;

        Ok(Self(wei))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} wei", self.0)
    }
}
