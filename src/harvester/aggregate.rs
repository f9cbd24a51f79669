//! Re-linearization of completed work into the Flat Record List.

use crate::types::{Identifier, IndexRange, Record, WorkResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

/// Ranges of the Flat Record List, one per Identifier occurrence, in input order
///
/// Duplicate Identifiers keep separate entries told apart by occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexRanges(Vec<IndexRange>);

impl IndexRanges {
    /// Ranges in input order
    pub fn iter(&self) -> std::slice::Iter<'_, IndexRange> {
        self.0.iter()
    }

    /// Number of Identifier occurrences
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no Identifiers were harvested
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Range for the Identifier at input position `occurrence`
    pub fn get(&self, occurrence: usize) -> Option<&IndexRange> {
        self.0.get(occurrence)
    }

    /// Every range belonging to `identifier`, in input order
    pub fn for_identifier<'a>(
        &'a self,
        identifier: &'a Identifier,
    ) -> impl Iterator<Item = &'a IndexRange> + 'a {
        self.0.iter().filter(move |range| &range.identifier == identifier)
    }

    /// Total records covered (the end of the last range)
    pub fn total(&self) -> usize {
        self.0.last().map_or(0, |range| range.end)
    }

    /// Range containing Flat Record List position `index`
    pub fn owner_of(&self, index: usize) -> Option<&IndexRange> {
        let pos = self.0.partition_point(|range| range.end <= index);
        self.0.get(pos).filter(|range| range.start <= index && index < range.end)
    }

    /// Plain Identifier → range view where a later duplicate replaces an earlier one
    pub fn to_last_write_wins(&self) -> HashMap<Identifier, Range<usize>> {
        self.0
            .iter()
            .map(|range| (range.identifier.clone(), range.as_range()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a IndexRanges {
    type Item = &'a IndexRange;
    type IntoIter = std::slice::Iter<'a, IndexRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Output of a harvest run: the Flat Record List and the ranges indexing into it
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Harvest {
    /// One range per input Identifier occurrence
    pub ranges: IndexRanges,
    /// Records of every Identifier, concatenated in input order
    pub records: Vec<Record>,
}

impl Harvest {
    /// Records owned by the Identifier at input position `occurrence`
    pub fn records_for(&self, occurrence: usize) -> &[Record] {
        self.ranges
            .get(occurrence)
            .and_then(|range| self.records.get(range.as_range()))
            .unwrap_or_default()
    }
}

/// Walk `identifiers` in input order and concatenate the matching results
///
/// Results are matched by occurrence. A position with no result (or one
/// carrying a different Identifier) contributes an empty range.
pub fn aggregate(identifiers: &[Identifier], results: Vec<WorkResult>) -> Harvest {
    let mut by_occurrence: BTreeMap<usize, WorkResult> = BTreeMap::new();
    for result in results {
        if let Some(previous) = by_occurrence.insert(result.occurrence, result) {
            tracing::warn!(
                occurrence = previous.occurrence,
                identifier = %previous.identifier,
                "Duplicate result for occurrence, keeping the later one"
            );
        }
    }

    let mut ranges = Vec::with_capacity(identifiers.len());
    let mut records = Vec::new();

    for (occurrence, identifier) in identifiers.iter().enumerate() {
        let result = match by_occurrence.remove(&occurrence) {
            Some(result) if &result.identifier == identifier => result,
            Some(result) => {
                tracing::warn!(
                    occurrence,
                    expected = %identifier,
                    found = %result.identifier,
                    "Result identifier mismatch, using empty result"
                );
                WorkResult::empty(occurrence, identifier.clone())
            }
            None => {
                tracing::warn!(occurrence, identifier = %identifier, "No result for identifier");
                WorkResult::empty(occurrence, identifier.clone())
            }
        };

        let start = records.len();
        records.extend(result.records);
        ranges.push(IndexRange {
            identifier: identifier.clone(),
            occurrence,
            start,
            end: records.len(),
        });
    }

    if !by_occurrence.is_empty() {
        tracing::warn!(
            leftover = by_occurrence.len(),
            "Ignoring results for positions outside the input list"
        );
    }

    Harvest {
        ranges: IndexRanges(ranges),
        records,
    }
}
