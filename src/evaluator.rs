use {super::*, sha3::Digest as _};

const NONCE_LEN: usize = 32;
const PREIMAGE_LEN: usize = NONCE_LEN + 32 + 20;

fn keccak(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// `H(challenge ++ identity)`, the per-miner salt mixed into every nonce hash.
pub fn miner_specific_challenge(challenge: &Challenge, identity: &MinerIdentity) -> [u8; 32] {
    let mut data = [0u8; Challenge::LEN + 20];
    data[..Challenge::LEN].copy_from_slice(challenge.as_bytes());
    data[Challenge::LEN..].copy_from_slice(identity.as_bytes());
    keccak(&data)
}

/// `H(be32(nonce) ++ H(challenge ++ identity) ++ identity)`
pub fn evaluate(challenge: &Challenge, identity: &MinerIdentity, nonce: u64) -> Digest {
    Evaluator::new(*challenge, *identity).hash(nonce)
}

pub fn is_valid(digest: &Digest, target: &Target) -> bool {
    target.is_met_by(digest)
}

/// Hashes nonces for one (challenge, identity) binding. The miner-specific
/// challenge is computed once per binding so the search loop only pays for a
/// single Keccak over the fixed-layout preimage.
#[derive(Debug, Clone)]
pub struct Evaluator {
    challenge: Challenge,
    identity: MinerIdentity,
    preimage: [u8; PREIMAGE_LEN],
}

impl Evaluator {
    pub fn new(challenge: Challenge, identity: MinerIdentity) -> Self {
        let mut evaluator = Self {
            challenge,
            identity,
            preimage: [0; PREIMAGE_LEN],
        };
        evaluator.rebind(challenge);
        evaluator
    }

    pub fn challenge(&self) -> Challenge {
        self.challenge
    }

    pub fn rebind(&mut self, challenge: Challenge) {
        self.challenge = challenge;
        self.preimage = [0; PREIMAGE_LEN];
        self.preimage[NONCE_LEN..NONCE_LEN + 32]
            .copy_from_slice(&miner_specific_challenge(&challenge, &self.identity));
        self.preimage[NONCE_LEN + 32..].copy_from_slice(self.identity.as_bytes());
    }

    pub fn hash(&mut self, nonce: u64) -> Digest {
        self.preimage[NONCE_LEN - 8..NONCE_LEN].copy_from_slice(&nonce.to_be_bytes());
        Digest::new(keccak(&self.preimage))
    }
}
