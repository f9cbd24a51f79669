use super::*;
use crate::test_helpers::{Endpoint, MockTransport, Scripted, instant_retry, mock_config};
use std::time::Duration;

mod cancellation;

/// Harvester over a mock transport whose retries never sleep
fn mock_harvester(transport: &Arc<MockTransport>, config: Config) -> Harvester {
    let retry = instant_retry(config.retry.clone());
    Harvester::with_transport(config, transport.clone())
        .unwrap()
        .with_retry_policy(retry)
}

fn ids(values: &[&str]) -> Vec<Identifier> {
    values.iter().map(|v| Identifier::new(*v)).collect()
}

fn dependents_of(harvest: &Harvest, occurrence: usize) -> Vec<String> {
    harvest
        .records_for(occurrence)
        .iter()
        .map(|r| r.dependent_id.to_string())
        .collect()
}

fn assert_ranges_cover_records(harvest: &Harvest) {
    let mut next = 0;
    for range in &harvest.ranges {
        assert_eq!(range.start, next, "ranges must be contiguous: {range:?}");
        next = range.end;
    }
    assert_eq!(next, harvest.records.len());
}
