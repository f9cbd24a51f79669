//! Core types and events for geo-harvest

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Top-level input key naming one unit of work (a PubMed ID)
///
/// Opaque: the harvester never parses it. Order and duplicates in the input
/// list are significant.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(pub String);

impl Identifier {
    /// Create a new Identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Identifier {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Secondary entity linked from an [`Identifier`] (a GEO DataSets UID)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependentId(pub String);

impl DependentId {
    /// Create a new DependentId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DependentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for DependentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structured text harvested for one DependentID
///
/// Records are never mutated after assembly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier whose resolution produced this record
    pub identifier: Identifier,
    /// DependentID the detail lookup was issued for
    pub dependent_id: DependentId,
    /// Series accession used for the supplementary lookup (e.g. "GSE12345")
    pub accession: String,
    /// Dataset title
    pub title: String,
    /// Experiment type (`gdsType`)
    pub experiment_type: String,
    /// Dataset summary
    pub summary: String,
    /// Organism (`taxon`)
    pub organism: String,
    /// Overall design joined from the series text
    pub design: String,
}

impl Record {
    /// Join every field except the Identifier into one text blob
    ///
    /// This is the document handed to the analysis backend for this record.
    pub fn text_blob(&self) -> String {
        [
            self.dependent_id.as_str(),
            self.title.as_str(),
            self.experiment_type.as_str(),
            self.summary.as_str(),
            self.organism.as_str(),
            self.design.as_str(),
        ]
        .join(" ")
    }
}

/// Per-Identifier outcome bundle produced by exactly one worker
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkResult {
    /// Position of this Identifier occurrence in the input list
    pub occurrence: usize,
    /// The Identifier this worker ran for
    pub identifier: Identifier,
    /// Number of records successfully assembled (always `records.len()`)
    pub success_count: usize,
    /// Records in resolution order
    pub records: Vec<Record>,
}

impl WorkResult {
    /// Zero-record result, used when a worker produced nothing
    pub fn empty(occurrence: usize, identifier: Identifier) -> Self {
        Self {
            occurrence,
            identifier,
            success_count: 0,
            records: Vec::new(),
        }
    }

    /// Build a result from assembled records, keeping the count consistent
    pub fn from_records(occurrence: usize, identifier: Identifier, records: Vec<Record>) -> Self {
        Self {
            occurrence,
            identifier,
            success_count: records.len(),
            records,
        }
    }
}

/// Contiguous slice `[start, end)` of the Flat Record List owned by one Identifier occurrence
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    /// The Identifier value
    pub identifier: Identifier,
    /// Position of this occurrence in the input list
    pub occurrence: usize,
    /// First index (inclusive)
    pub start: usize,
    /// End index (exclusive)
    pub end: usize,
}

impl IndexRange {
    /// Number of records covered
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True for Identifiers that produced no records
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// As a std range, for slicing the Flat Record List
    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Events emitted while harvesting
///
/// Consumers subscribe through [`Harvester::subscribe`](crate::Harvester::subscribe).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A worker picked up an Identifier occurrence
    WorkerStarted {
        /// Identifier value
        identifier: Identifier,
        /// Input position
        occurrence: usize,
    },

    /// Resolve call returned
    DependentsResolved {
        /// Identifier value
        identifier: Identifier,
        /// Number of DependentIDs returned
        count: usize,
    },

    /// A record was assembled
    RecordAssembled {
        /// Identifier value
        identifier: Identifier,
        /// DependentID of the record
        dependent_id: DependentId,
        /// Series accession
        accession: String,
    },

    /// A DependentID produced no record
    RecordDropped {
        /// Identifier value
        identifier: Identifier,
        /// DependentID that was dropped
        dependent_id: DependentId,
        /// Machine-readable reason (error code)
        reason: String,
    },

    /// Remote service answered 429; the lookup will wait and retry
    RateLimited {
        /// Lookup label (e.g. "resolve 12345")
        lookup: String,
        /// Attempt number that was throttled (1-based)
        attempt: u32,
        /// Delay before the next attempt in milliseconds
        delay_ms: u64,
    },

    /// A single lookup was abandoned
    LookupFailed {
        /// Lookup label
        lookup: String,
        /// Machine-readable error code
        code: String,
        /// Human-readable error message
        error: String,
    },

    /// A worker finished (normally or cancelled)
    WorkerFinished {
        /// Identifier value
        identifier: Identifier,
        /// Input position
        occurrence: usize,
        /// Records produced
        success_count: usize,
        /// Whether the worker stopped early because of cancellation or deadline
        cancelled: bool,
    },

    /// All workers finished and the results were aggregated
    HarvestComplete {
        /// Number of Identifier occurrences processed
        identifiers: usize,
        /// Length of the Flat Record List
        records: usize,
    },
}

/// Explicit sink for [`Event`]s, cloned into every component
///
/// Wraps a broadcast sender. Sending with no subscriber is not an error.
#[derive(Clone, Debug)]
pub struct EventSink {
    tx: tokio::sync::broadcast::Sender<Event>,
}

impl EventSink {
    /// Create a sink with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = tokio::sync::broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Emit an event to all current subscribers
    pub fn emit(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.tx.send(event).ok();
    }

    /// Subscribe to subsequent events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new(1024)
    }
}
