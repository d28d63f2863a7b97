use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Partition;

#[derive(Debug, Serialize, Deserialize)]
pub struct Output {
    pub worker: u64,
    pub start: u64,
    pub end: u64,
}

impl Partition {
    pub(crate) fn run(self, settings: Settings) -> Result {
        let ranges = partition(
            settings.workers.unwrap_or(MinerConfig::DEFAULT_WORKERS),
            settings.range_size.unwrap_or(MinerConfig::DEFAULT_RANGE_SIZE),
        )?;

        let output = ranges
            .iter()
            .map(|range| Output {
                worker: range.index(),
                start: range.start,
                end: range.end(),
            })
            .collect::<Vec<Output>>();

        println!("{}", serde_json::to_string_pretty(&output)?);

        Ok(())
    }
}
