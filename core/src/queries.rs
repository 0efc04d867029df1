//! Cached reads and cache-maintaining mutations for catalog resources.
//!
//! Reads go through `QueryCache::lookup` so a fresh entry costs no request
//! and a key already in flight is not fetched twice. Mutations run their
//! cache maintenance before returning, so the next read on this thread
//! always sees the invalidation:
//!
//! - create / delete: invalidate every key of the entity kind;
//! - update: invalidate, then seed the item key with the server's reply.

use crate::api::CatalogApi;
use crate::cache::{Lookup, QueryCache, QueryKey};
use crate::error::ApiError;
use crate::resource::Resource;

/// Loading/error projection of a cached read.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    Loading,
    Ready(T),
    Failed(ApiError),
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            QueryState::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_result(self) -> Option<Result<T, ApiError>> {
        match self {
            QueryState::Loading => None,
            QueryState::Ready(data) => Some(Ok(data)),
            QueryState::Failed(e) => Some(Err(e)),
        }
    }
}

/// Status of the most recent mutation a control triggered.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MutationState {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed(ApiError),
}

impl MutationState {
    /// Controls that trigger the mutation are disabled while pending.
    pub fn is_pending(&self) -> bool {
        matches!(self, MutationState::Pending)
    }
}

fn read<T: Clone + 'static>(
    cache: &mut QueryCache,
    key: QueryKey,
    fetch: impl FnOnce() -> Result<T, ApiError>,
) -> QueryState<T> {
    match cache.lookup::<T>(&key) {
        Lookup::Fresh(data) => QueryState::Ready(data),
        Lookup::Pending => QueryState::Loading,
        Lookup::Fetch => {
            tracing::debug!(%key, "cache miss");
            let result = fetch();
            cache.resolve(&key, &result);
            match result {
                Ok(data) => QueryState::Ready(data),
                Err(e) => QueryState::Failed(e),
            }
        }
    }
}

pub fn fetch_list<R: Resource>(api: &mut CatalogApi, cache: &mut QueryCache) -> QueryState<Vec<R>> {
    read(cache, QueryKey::list(R::KIND), || api.list::<R>())
}

pub fn fetch_item<R: Resource>(
    api: &mut CatalogApi,
    cache: &mut QueryCache,
    id: &str,
) -> QueryState<R> {
    read(cache, QueryKey::item(R::KIND, id), || api.get::<R>(id))
}

pub fn create<R: Resource>(
    api: &mut CatalogApi,
    cache: &mut QueryCache,
    input: &R::Create,
) -> Result<R, ApiError> {
    let created = api.create::<R>(input)?;
    cache.invalidate_kind(R::KIND);
    Ok(created)
}

pub fn update<R: Resource>(
    api: &mut CatalogApi,
    cache: &mut QueryCache,
    id: &str,
    input: &R::Update,
) -> Result<R, ApiError> {
    let updated = api.update::<R>(id, input)?;
    cache.invalidate_kind(R::KIND);
    cache.set(&QueryKey::item(R::KIND, updated.id()), updated.clone());
    Ok(updated)
}

pub fn delete<R: Resource>(
    api: &mut CatalogApi,
    cache: &mut QueryCache,
    id: &str,
) -> Result<(), ApiError> {
    api.delete::<R>(id)?;
    cache.invalidate_kind(R::KIND);
    Ok(())
}
