//! Aggregate root trait and optimistic concurrency expectations.

/// Versioned aggregate.
///
/// Records that are mutated after creation expose a version so the storage
/// boundary can reject stale writes.
pub trait AggregateRoot {
    /// Monotonically increasing version of the persisted state.
    ///
    /// Starts at 1 when the record is first stored and is bumped by one on
    /// every successful write.
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation for a write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// Require the stored record to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }
}
