use super::*;

#[derive(Debug, Parser)]
pub(crate) struct ConfigCmd {
    #[arg(long, help = "Print the merged settings instead of the resolved configuration.")]
    raw: bool,
}

impl ConfigCmd {
    pub(crate) fn run(self, settings: Settings) -> Result {
        if self.raw {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&settings.miner_config()?)?);
        }

        Ok(())
    }
}
