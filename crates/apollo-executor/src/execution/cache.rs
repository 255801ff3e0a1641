use crate::executable::ExecutableOperation;
use crate::execution::GraphQLError;
use lru::LruCache;
use sha1::Digest;
use sha1::Sha1;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

/// The outcome of preparing a request document.
///
/// Request errors are cached too: they only depend on the document and the operation name.
pub(crate) type Prepared = Result<Arc<ExecutableOperation>, Arc<[GraphQLError]>>;

/// A unique hash for an operation of a request document:
/// two operations of the same document have different hashes.
#[derive(Clone, Hash, PartialEq, Eq)]
pub(crate) struct QueryHash(Vec<u8>);

impl QueryHash {
    pub(crate) fn new(query_text: &str, operation_name: Option<&str>) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(query_text);
        // byte separator between each part that is hashed
        hasher.update([0xFF]);
        hasher.update(operation_name.unwrap_or("-"));
        Self(hasher.finalize().as_slice().into())
    }
}

impl fmt::Debug for QueryHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("QueryHash")
            .field(&hex::encode(&self.0))
            .finish()
    }
}

impl fmt::Display for QueryHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// Least-recently-used cache of prepared operations
pub(crate) struct PlanCache {
    /// `None` when disabled
    entries: Option<Mutex<LruCache<QueryHash, Prepared>>>,
}

impl PlanCache {
    /// A capacity of zero disables caching
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|capacity| Mutex::new(LruCache::new(capacity))),
        }
    }

    pub(crate) fn get_or_insert_with(
        &self,
        key: QueryHash,
        prepare: impl FnOnce() -> Prepared,
    ) -> Prepared {
        let Some(entries) = &self.entries else {
            return prepare();
        };
        let cached = entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(prepared) = cached {
            tracing::debug!(query.hash = %key, "plan cache hit");
            return prepared;
        }
        tracing::debug!(query.hash = %key, "plan cache miss");
        // Prepare without holding the lock; concurrent misses for the same key
        // may both prepare, the last one is kept.
        let prepared = prepare();
        entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(key, prepared.clone());
        prepared
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| {
            entries.lock().unwrap_or_else(PoisonError::into_inner).len()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeLocation;

    fn error(message: &str) -> Prepared {
        let sources = Default::default();
        Err(vec![GraphQLError::new(message, None::<NodeLocation>, &sources)].into())
    }

    #[test]
    fn hash_depends_on_operation_name() {
        let query = "query A { a } query B { b }";
        assert_eq!(QueryHash::new(query, Some("A")), QueryHash::new(query, Some("A")));
        assert_ne!(QueryHash::new(query, Some("A")), QueryHash::new(query, Some("B")));
        assert_ne!(QueryHash::new(query, None), QueryHash::new(query, Some("A")));
        assert_eq!(QueryHash::new("{ a }", None).to_string().len(), 40);
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let cache = PlanCache::new(2);
        let mut calls = 0;
        for query in ["{ a }", "{ b }", "{ a }", "{ c }", "{ a }"] {
            cache.get_or_insert_with(QueryHash::new(query, None), || {
                calls += 1;
                error(query)
            });
        }
        // `{ a }` stays, `{ b }` is evicted by `{ c }`
        assert_eq!(calls, 3);
        assert_eq!(cache.len(), 2);
        let mut called = false;
        cache.get_or_insert_with(QueryHash::new("{ b }", None), || {
            called = true;
            error("{ b }")
        });
        assert!(called);
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let cache = PlanCache::new(0);
        let mut calls = 0;
        for _ in 0..2 {
            cache.get_or_insert_with(QueryHash::new("{ a }", None), || {
                calls += 1;
                error("{ a }")
            });
        }
        assert_eq!(calls, 2);
        assert_eq!(cache.len(), 0);
    }
}
