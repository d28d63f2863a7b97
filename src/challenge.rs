use {super::*, sha3::Digest as _};

/// Opaque 32-byte value issued by the ledger for the current mining round.
/// Only ever compared for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, DeserializeFromStr, SerializeDisplay)]
pub struct Challenge([u8; 32]);

impl Challenge {
    pub const LEN: usize = 32;

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The challenge the ledger rolls to after this one is solved.
    pub fn next(&self) -> Self {
        Self(Keccak256::digest(self.0).into())
    }

    pub fn random() -> Self {
        Self(rand::random())
    }
}

impl From<[u8; 32]> for Challenge {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Challenge {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(
            decode_hex(s).with_context(|| format!("invalid challenge `{s}`"))?,
        ))
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
