//! Lazy resolution proxies
//!
//! A proxy wraps a fetch that has not run yet. It is built synchronously
//! and does no I/O until [`InstanceProxy::resolve`] or
//! [`SequenceProxy::resolve`] is called. The first resolution spawns the
//! fetch as a background task and publishes the `Resolving` state before
//! yielding; later and concurrent resolutions attach to that same task.
//! Its outcome, success or failure, is memoized for the proxy's lifetime.
//!
//! Because the fetch runs in its own task, a caller that gives up on a
//! resolution (for example through a timeout) does not cancel it: the
//! fetch still completes and populates the cache, or fails with a logged
//! warning. The task publishes the outcome to the proxy itself, so the
//! proxy leaves `Resolving` even when no caller is left waiting.
//!
//! Cloning a proxy yields a handle to the same underlying state.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::future::{BoxFuture, FutureExt, Shared};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::warn;

use crate::entity::{decode, Entity};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::source::RecordSource;

/// Observable resolution state of a proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    Unresolved,
    Resolving,
    Resolved,
    Failed,
}

type SharedFetch<T> = Shared<BoxFuture<'static, Result<T>>>;

enum State<T> {
    /// Holds the fetch until the first resolution takes it
    Unresolved(Option<BoxFuture<'static, Result<T>>>),
    Resolving(SharedFetch<T>),
    Resolved(T),
    Failed(Error),
}

enum Step<T> {
    Done(Result<T>),
    Wait(SharedFetch<T>),
}

/// Memoizing, at-most-once fetch shared by both proxy variants
struct Lazy<T> {
    state: Mutex<State<T>>,
}

impl<T> Lazy<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn new(fetch: BoxFuture<'static, Result<T>>) -> Self {
        Self {
            state: Mutex::new(State::Unresolved(Some(fetch))),
        }
    }

    fn resolved(value: T) -> Self {
        Self {
            state: Mutex::new(State::Resolved(value)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> ProxyState {
        match &*self.lock() {
            State::Unresolved(_) => ProxyState::Unresolved,
            State::Resolving(_) => ProxyState::Resolving,
            State::Resolved(_) => ProxyState::Resolved,
            State::Failed(_) => ProxyState::Failed,
        }
    }

    async fn resolve(self: &Arc<Self>) -> Result<T> {
        let shared = match self.begin() {
            Step::Done(outcome) => return outcome,
            Step::Wait(shared) => shared,
        };
        let outcome = shared.await;
        self.finish(&outcome);
        outcome
    }

    /// Inspect the state and, for the first caller, start the fetch.
    ///
    /// Runs entirely under the lock without suspending, so exactly one
    /// caller can observe `Unresolved`.
    fn begin(self: &Arc<Self>) -> Step<T> {
        let mut state = self.lock();
        let fetch = match &mut *state {
            State::Resolved(value) => return Step::Done(Ok(value.clone())),
            State::Failed(err) => return Step::Done(Err(err.clone())),
            State::Resolving(shared) => return Step::Wait(shared.clone()),
            State::Unresolved(fetch) => fetch.take(),
        };
        let Some(fetch) = fetch else {
            return Step::Done(Err(Error::Join("proxy fetch already taken".to_string())));
        };

        let owner: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let outcome = fetch.await;
            if let Err(e) = &outcome {
                warn!(error = %e, "Proxy fetch failed");
            }
            if let Some(lazy) = owner.upgrade() {
                lazy.finish(&outcome);
            }
            outcome
        });
        let shared = async move { handle.await.map_err(Error::from).and_then(|r| r) }
            .boxed()
            .shared();

        *state = State::Resolving(shared.clone());
        Step::Wait(shared)
    }

    /// Publish the outcome; only the first call out of `Resolving` counts
    fn finish(&self, outcome: &Result<T>) {
        let mut state = self.lock();
        if let State::Resolving(_) = &*state {
            *state = match outcome {
                Ok(value) => State::Resolved(value.clone()),
                Err(err) => State::Failed(err.clone()),
            };
        }
    }
}

/// Proxy for a relationship that yields at most one record
pub struct InstanceProxy<E> {
    inner: Arc<Lazy<Option<Arc<E>>>>,
}

impl<E: Entity> InstanceProxy<E> {
    pub(crate) fn new<F>(fetch: F) -> Self
    where
        F: Future<Output = Result<Option<Arc<E>>>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Lazy::new(fetch.boxed())),
        }
    }

    /// A proxy already resolved to "no record", for relations the source
    /// record does not have
    pub fn absent() -> Self {
        Self {
            inner: Arc::new(Lazy::resolved(None)),
        }
    }

    /// Resolve the relationship, fetching it on first use
    pub async fn resolve(&self) -> Result<Option<Arc<E>>> {
        self.inner.resolve().await
    }

    pub fn state(&self) -> ProxyState {
        self.inner.state()
    }
}

impl<E> Clone for InstanceProxy<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Proxy for a relationship that yields an ordered list of records
pub struct SequenceProxy<E> {
    inner: Arc<Lazy<Vec<Arc<E>>>>,
    source: Arc<dyn RecordSource>,
    filter: Filter,
    limit: u32,
    offset: u32,
}

impl<E: Entity> SequenceProxy<E> {
    pub(crate) fn new<F>(
        fetch: F,
        source: Arc<dyn RecordSource>,
        filter: Filter,
        limit: u32,
        offset: u32,
    ) -> Self
    where
        F: Future<Output = Result<Vec<Arc<E>>>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Lazy::new(fetch.boxed())),
            source,
            filter,
            limit,
            offset,
        }
    }

    /// Resolve the relationship into the full list, fetching it on first use
    pub async fn resolve(&self) -> Result<Vec<Arc<E>>> {
        self.inner.resolve().await
    }

    pub fn state(&self) -> ProxyState {
        self.inner.state()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Stream the records one at a time, fetching `page_size` records per
    /// request.
    ///
    /// Streaming is independent of [`resolve`](Self::resolve): it issues
    /// its own requests, memoizes nothing and never touches the cache.
    pub fn stream(&self, page_size: u32) -> BoxStream<'static, Result<Arc<E>>> {
        let source = Arc::clone(&self.source);
        let filter = self.filter.clone();
        let limit = self.limit;
        let page_size = page_size.max(1);

        stream::try_unfold((self.offset, 0u32, false), move |cursor| {
            next_page::<E>(Arc::clone(&source), filter.clone(), cursor, limit, page_size)
        })
        .map_ok(|records| stream::iter(records.into_iter().map(Ok::<_, Error>)))
        .try_flatten()
        .boxed()
    }
}

/// Paging position: next offset, records yielded so far, source exhausted
type Cursor = (u32, u32, bool);

async fn next_page<E: Entity>(
    source: Arc<dyn RecordSource>,
    filter: Filter,
    (offset, yielded, exhausted): Cursor,
    limit: u32,
    page_size: u32,
) -> Result<Option<(Vec<Arc<E>>, Cursor)>> {
    if exhausted || yielded >= limit {
        return Ok(None);
    }
    let wanted = page_size.min(limit - yielded);
    let page = source.fetch_many(E::KIND, &filter, wanted, offset).await?;
    let received = page.len() as u32;
    let records = page
        .into_iter()
        .map(|value| decode::<E>(value).map(Arc::new))
        .collect::<Result<Vec<_>>>()?;
    Ok(Some((
        records,
        (offset + received, yielded + received, received < wanted),
    )))
}

impl<E> Clone for SequenceProxy<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            source: Arc::clone(&self.source),
            filter: self.filter.clone(),
            limit: self.limit,
            offset: self.offset,
        }
    }
}
