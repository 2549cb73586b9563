use std::collections::BTreeMap;

use crate::models::{BucketCount, CensusYear, ProximityBucket, ProximityRecord};

/// Count records per (year, bucket). Years without records are simply absent.
pub fn aggregate(records: &[ProximityRecord]) -> BTreeMap<(CensusYear, ProximityBucket), usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry((record.year, record.bucket)).or_insert(0) += 1;
    }
    counts
}

/// Flatten an aggregate into rows ordered by year, then bucket.
pub fn to_rows(counts: &BTreeMap<(CensusYear, ProximityBucket), usize>) -> Vec<BucketCount> {
    counts
        .iter()
        .map(|(&(year, bucket), &count)| BucketCount {
            year,
            bucket,
            count,
        })
        .collect()
}
