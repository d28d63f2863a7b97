use super::*;

/// The 20-byte account address the miner mines for. Fixed for the process
/// lifetime and mixed into every hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, DeserializeFromStr, SerializeDisplay)]
pub struct MinerIdentity([u8; 20]);

impl MinerIdentity {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn random() -> Self {
        Self(rand::random())
    }
}

impl FromStr for MinerIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(
            decode_hex(s).with_context(|| format!("invalid miner address `{s}`"))?,
        ))
    }
}

impl fmt::Display for MinerIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
