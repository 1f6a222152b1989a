use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::interfaces::gateway::{Filter, PersistenceGateway, Session, Table};

/// A single filtered read against one table.
pub trait ResourceQuery: Send + Sync {
    type Item: DeserializeOwned + Clone + Send + Sync;

    fn table(&self) -> Table;

    /// `None` while a required parameter is still undefined; no read is
    /// issued and `data` stays `None`.
    fn filters(&self) -> Option<Vec<Filter>>;

    /// Static, user-facing message shown when the read fails.
    fn error_message(&self) -> &'static str;

    fn arrange(&self, _items: &mut Vec<Self::Item>) {}
}

#[derive(Debug, Clone)]
pub struct ResourceState<T> {
    pub data: Option<Vec<T>>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

struct Inner<T> {
    state: ResourceState<T>,
    applied: u64,
}

/// Request lifecycle for one query: idle, loading, then success or error,
/// with explicit revalidation.
///
/// `loading` is only raised while nothing has been loaded yet; later reads
/// keep showing the previous rows until the new ones land. Each read is
/// ticketed when issued and a response is dropped if a newer ticket has
/// already been applied, so the most recently issued read always wins.
pub struct Resource<Q: ResourceQuery> {
    gateway: Arc<dyn PersistenceGateway>,
    session: Option<Session>,
    query: Q,
    inner: RwLock<Inner<Q::Item>>,
    tickets: AtomicU64,
    revalidations: AtomicU64,
    alive: AtomicBool,
}

impl<Q: ResourceQuery> Resource<Q> {
    /// `session` is `None` until auth has resolved; nothing is fetched
    /// without it.
    pub fn new(gateway: Arc<dyn PersistenceGateway>, session: Option<Session>, query: Q) -> Self {
        Self {
            gateway,
            session,
            query,
            inner: RwLock::new(Inner {
                state: ResourceState::default(),
                applied: 0,
            }),
            tickets: AtomicU64::new(0),
            revalidations: AtomicU64::new(0),
            alive: AtomicBool::new(true),
        }
    }

    pub async fn mount(&self) {
        self.fetch().await;
    }

    pub async fn revalidate(&self) {
        self.revalidations.fetch_add(1, Ordering::SeqCst);
        self.fetch().await;
    }

    pub fn revalidation_count(&self) -> u64 {
        self.revalidations.load(Ordering::SeqCst)
    }

    /// Responses that arrive after this are ignored.
    pub fn unmount(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub async fn state(&self) -> ResourceState<Q::Item> {
        self.inner.read().await.state.clone()
    }

    async fn fetch(&self) {
        if !self.alive.load(Ordering::SeqCst) {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(filters) = self.query.filters() else {
            return;
        };

        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut inner = self.inner.write().await;
            if inner.state.data.is_none() {
                inner.state.loading = true;
            }
        }

        let table = self.query.table();
        let result = match self.gateway.select(session, table, &filters).await {
            Ok(response) => response.rows::<Q::Item>(),
            Err(err) => Err(err),
        };

        if !self.alive.load(Ordering::SeqCst) {
            debug!(table = table.as_str(), ticket, "dropping read for unmounted resource");
            return;
        }

        let mut inner = self.inner.write().await;
        if ticket <= inner.applied {
            debug!(table = table.as_str(), ticket, "dropping stale read");
            return;
        }
        inner.applied = ticket;
        inner.state.loading = false;
        match result {
            Ok(mut items) => {
                self.query.arrange(&mut items);
                inner.state.data = Some(items);
                inner.state.error = None;
            }
            Err(err) => {
                warn!(table = table.as_str(), "read failed: {}", err);
                inner.state.error = Some(self.query.error_message().to_string());
            }
        }
    }
}
