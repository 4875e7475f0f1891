#![forbid(unsafe_code)]

//! Immutable collection snapshots.
//!
//! A [`Snapshot`] is one fetch result: the ordered records plus the query
//! parameters that produced the order. Snapshots are shared read-only
//! (`Arc`) and replaced wholesale on every refetch, so no locking is needed
//! and a resolver can never observe a half-updated collection.

use std::fmt;
use std::sync::Arc;

use crate::record::Record;

/// Sort direction for a [`SortSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// The column a snapshot was sorted by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortSpec {
    /// Column/field name as understood by the data layer.
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
}

impl SortSpec {
    /// Ascending sort on `field`.
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending sort on `field`.
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Sort and filter parameters that produced a snapshot's order.
///
/// The engine never interprets these; they travel with the snapshot so that
/// resolutions can be logged against the ordering they were computed under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QueryParams {
    /// Active sort, if any.
    pub sort: Option<SortSpec>,
    /// Active filter text, if any.
    pub filter: Option<String>,
}

impl QueryParams {
    /// Parameters with only a sort.
    pub fn sorted(sort: SortSpec) -> Self {
        Self {
            sort: Some(sort),
            filter: None,
        }
    }

    /// Set the filter text.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sort {
            Some(SortSpec { field, direction }) => {
                let dir = match direction {
                    SortDirection::Ascending => "asc",
                    SortDirection::Descending => "desc",
                };
                write!(f, "sort={field}:{dir}")?;
            }
            None => f.write_str("sort=none")?,
        }
        if let Some(filter) = &self.filter {
            write!(f, " filter={filter:?}")?;
        }
        Ok(())
    }
}

/// One immutable, ordered fetch result.
///
/// Cloning is cheap: the record storage is shared.
pub struct Snapshot<R> {
    records: Arc<[R]>,
    params: QueryParams,
    generation: u64,
}

impl<R> Clone for Snapshot<R> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            params: self.params.clone(),
            generation: self.generation,
        }
    }
}

impl<R> fmt::Debug for Snapshot<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("len", &self.records.len())
            .field("params", &self.params)
            .field("generation", &self.generation)
            .finish()
    }
}

impl<R> Snapshot<R> {
    /// Create a snapshot at generation 0 with default query parameters.
    pub fn new(records: impl Into<Arc<[R]>>) -> Self {
        Self {
            records: records.into(),
            params: QueryParams::default(),
            generation: 0,
        }
    }

    /// An empty snapshot.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Attach the query parameters that produced this order.
    #[must_use]
    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    /// Set the producer-assigned generation number.
    #[must_use]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// The records in snapshot order.
    #[inline]
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot holds no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&R> {
        self.records.get(index)
    }

    /// Query parameters.
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Producer-assigned generation number.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<R: Record> Snapshot<R> {
    /// Absolute index of the record with `id`, by linear scan.
    pub fn position_of(&self, id: &R::Id) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    /// Whether a record with `id` is present.
    pub fn contains(&self, id: &R::Id) -> bool {
        self.position_of(id).is_some()
    }
}

impl<R> From<Vec<R>> for Snapshot<R> {
    fn from(records: Vec<R>) -> Self {
        Self::new(records)
    }
}

impl<R> Default for Snapshot<R> {
    fn default() -> Self {
        Self::empty()
    }
}
