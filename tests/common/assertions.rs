//! Custom test assertions for harvest results

use geo_harvest::Harvest;

/// Ranges start at 0, touch end to start, and end at the record count
pub fn assert_ranges_contiguous(harvest: &Harvest) {
    let mut next = 0;
    for range in &harvest.ranges {
        assert_eq!(range.start, next, "gap or overlap at {range:?}");
        assert!(range.end >= range.start, "inverted range {range:?}");
        next = range.end;
    }
    assert_eq!(next, harvest.records.len(), "ranges must cover every record");
}

/// DependentIDs of the records owned by input position `occurrence`
pub fn dependents_at(harvest: &Harvest, occurrence: usize) -> Vec<String> {
    harvest
        .records_for(occurrence)
        .iter()
        .map(|record| record.dependent_id.to_string())
        .collect()
}
