use std::cmp::Ordering;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// A storable record type.
///
/// `TABLE` is the explicit type tag naming the record's table (and its
/// snapshot file on disk); identity for upserts comes from `id()`.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const TABLE: &'static str;

    fn id(&self) -> Uuid;
}

type Predicate<R> = Box<dyn Fn(&R) -> bool + Send + Sync>;
type Comparator<R> = Box<dyn Fn(&R, &R) -> Ordering + Send + Sync>;

/// A typed query against one record table: optional predicate, optional
/// sort order, and an offset/limit window applied after both.
pub struct Query<R> {
    pub(crate) predicate: Option<Predicate<R>>,
    pub(crate) sort: Option<Comparator<R>>,
    pub(crate) limit: Option<usize>,
    pub(crate) offset: usize,
}

impl<R: Record> Query<R> {
    pub fn new() -> Self {
        Self {
            predicate: None,
            sort: None,
            limit: None,
            offset: 0,
        }
    }

    /// Keep only records matching the predicate.
    pub fn filter(mut self, predicate: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Sort matching records with the given comparator.
    pub fn sort_by(
        mut self,
        comparator: impl Fn(&R, &R) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.sort = Some(Box::new(comparator));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

impl<R: Record> Default for Query<R> {
    fn default() -> Self {
        Self::new()
    }
}
