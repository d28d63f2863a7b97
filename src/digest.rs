use super::*;

/// A 256-bit Keccak digest. Ordering is only meaningful through
/// [`Digest::to_u256`], never through the hex text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, DeserializeFromStr, SerializeDisplay)]
pub struct Digest([u8; 32]);

impl Digest {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_u256(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<U256> for Digest {
    fn from(value: U256) -> Self {
        Self(value.to_big_endian())
    }
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(
            decode_hex(s).with_context(|| format!("invalid hash `{s}`"))?,
        ))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_value_is_big_endian() {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        assert_eq!(Digest::new(bytes).to_u256(), U256::one());

        bytes = [0u8; 32];
        bytes[0] = 1;
        assert_eq!(Digest::new(bytes).to_u256(), U256::one() << 248);
    }

    #[test]
    fn u256_conversion_round_trips() {
        let value = U256::from(0xdead_beef_u64) << 100;
        assert_eq!(Digest::from(value).to_u256(), value);
    }
}
