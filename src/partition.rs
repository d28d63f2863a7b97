use super::*;

/// A contiguous block of nonces `[start, start + length)` owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{start}..{}", start + length)]
pub struct SearchRange {
    pub start: u64,
    pub length: u64,
}

impl SearchRange {
    pub fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }

    pub fn end(&self) -> u64 {
        self.start + self.length
    }

    pub fn contains(&self, nonce: u64) -> bool {
        nonce >= self.start && nonce < self.end()
    }

    /// Index of this range in a partition of equally sized ranges.
    pub fn index(&self) -> u64 {
        self.start.checked_div(self.length).unwrap_or_default()
    }
}

/// Splits `[0, workers * range_size)` into `workers` equal, disjoint,
/// contiguous ranges. Range `i` always starts at `i * range_size`.
pub fn partition(workers: usize, range_size: u64) -> Result<Vec<SearchRange>> {
    let total = u64::try_from(workers)
        .ok()
        .and_then(|workers| workers.checked_mul(range_size))
        .ok_or_else(|| {
            anyhow!("nonce space of {workers} workers x {range_size} nonces overflows u64")
        })?;

    debug!("Partitioning {total} nonces across {workers} workers");

    Ok((0..workers as u64)
        .map(|i| SearchRange::new(i * range_size, range_size))
        .collect())
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    fn assert_covers(workers: usize, range_size: u64) {
        let ranges = partition(workers, range_size).unwrap();

        assert_eq!(ranges.len(), workers);

        let mut next = 0;
        for range in &ranges {
            assert_eq!(range.start, next, "gap or overlap before {range}");
            assert_eq!(range.length, range_size);
            next = range.end();
        }

        assert_eq!(next, workers as u64 * range_size);
    }

    #[test]
    fn reference_layout() {
        assert_eq!(
            partition(4, 50_000_000).unwrap(),
            vec![
                SearchRange::new(0, 50_000_000),
                SearchRange::new(50_000_000, 50_000_000),
                SearchRange::new(100_000_000, 50_000_000),
                SearchRange::new(150_000_000, 50_000_000),
            ]
        );
    }

    #[test]
    fn coverage_and_disjointness() {
        for workers in [1, 2, 3, 4, 7, 16, 64] {
            for range_size in [1, 2, 10, 100_000, 50_000_000] {
                assert_covers(workers, range_size);
            }
        }
    }

    #[test]
    fn pairwise_disjoint() {
        let ranges = partition(8, 1_000).unwrap();
        for (i, a) in ranges.iter().enumerate() {
            for b in &ranges[i + 1..] {
                assert!(a.end() <= b.start || b.end() <= a.start, "{a} overlaps {b}");
            }
        }
    }

    #[test]
    fn stable_across_calls() {
        assert_eq!(partition(6, 12_345).unwrap(), partition(6, 12_345).unwrap());
    }

    #[test]
    fn zero_workers_is_empty() {
        assert!(partition(0, 100).unwrap().is_empty());
    }

    #[test]
    fn overflow_is_an_error() {
        let err = partition(4, u64::MAX / 2).unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn range_helpers() {
        let range = SearchRange::new(100, 50);
        assert_eq!(range.end(), 150);
        assert!(range.contains(100));
        assert!(range.contains(149));
        assert!(!range.contains(150));
        assert!(!range.contains(99));
        assert_eq!(range.index(), 2);
        assert_eq!(range.to_string(), "100..150");
        assert_eq!(SearchRange::new(0, 0).index(), 0);
    }
}
