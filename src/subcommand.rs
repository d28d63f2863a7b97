use {super::*, settings::Settings};

mod config;
mod hash;
mod partition;
mod simulate;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
    #[command(about = "Print the resolved miner configuration")]
    Config(config::ConfigCmd),
    #[command(about = "Evaluate one nonce against a challenge")]
    Hash(hash::Hash),
    #[command(about = "Print the nonce ranges assigned to each worker")]
    Partition(partition::Partition),
    #[command(about = "Mine against an in-process simulated ledger")]
    Simulate(simulate::Simulate),
}

impl Subcommand {
    pub(crate) async fn run(self, settings: Settings, cancel_token: CancellationToken) -> Result {
        match self {
            Self::Config(config) => config.run(settings),
            Self::Hash(hash) => hash.run(settings),
            Self::Partition(partition) => partition.run(settings),
            Self::Simulate(simulate) => simulate.run(settings, cancel_token).await,
        }
    }
}
