use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Hash {
    #[arg(help = "Hash against <CHALLENGE>.")]
    challenge: Challenge,
    #[arg(help = "Hash as miner <ADDRESS>.")]
    address: MinerIdentity,
    #[arg(help = "Evaluate <NONCE>.")]
    nonce: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Output {
    pub challenge: Challenge,
    pub miner: MinerIdentity,
    pub nonce: u64,
    pub miner_specific_challenge: Digest,
    pub hash: Digest,
    pub target: Target,
    pub valid: bool,
}

impl Hash {
    pub(crate) fn run(self, settings: Settings) -> Result {
        let target = settings.target.unwrap_or_default();
        let hash = evaluate(&self.challenge, &self.address, self.nonce);

        let output = Output {
            challenge: self.challenge,
            miner: self.address,
            nonce: self.nonce,
            miner_specific_challenge: Digest::new(miner_specific_challenge(
                &self.challenge,
                &self.address,
            )),
            hash,
            target,
            valid: is_valid(&hash, &target),
        };

        println!("{}", serde_json::to_string_pretty(&output)?);

        Ok(())
    }
}
