//! Remote resource cache
//!
//! Memoizes backend reads per key. Concurrent reads of one key share a single
//! request, a failed read settles to "unavailable" instead of an error, and an
//! absent key never issues a request.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use rbx_wizard_api::{
    CodeResponse, CodeTemplatesApi, Result as ApiResult, ReviewApi, Statement, StatementsApi,
};
use tokio::sync::{watch, Mutex};

use crate::types::TemplateKind;

/// State of a keyed remote value as seen by a consumer.
#[derive(Debug)]
pub enum Loadable<V> {
    /// No key, so nothing was requested.
    Absent,
    /// A request is in flight.
    Loading,
    Ready(Arc<V>),
    /// The last request failed; see the logs for the cause.
    Unavailable,
}

impl<V> Clone for Loadable<V> {
    fn clone(&self) -> Self {
        match self {
            Self::Absent => Self::Absent,
            Self::Loading => Self::Loading,
            Self::Ready(value) => Self::Ready(Arc::clone(value)),
            Self::Unavailable => Self::Unavailable,
        }
    }
}

impl<V> Loadable<V> {
    pub fn ready(&self) -> Option<&Arc<V>> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    fn settled(value: Option<Arc<V>>) -> Self {
        value.map_or(Self::Unavailable, Self::Ready)
    }
}

type Fetcher<K, V> = dyn Fn(K) -> BoxFuture<'static, ApiResult<V>> + Send + Sync;
type SharedFetch<V> = Shared<BoxFuture<'static, Option<Arc<V>>>>;

enum Slot<V> {
    InFlight {
        generation: u64,
        fetch: SharedFetch<V>,
    },
    Settled(Option<Arc<V>>),
}

struct CacheState<K, V> {
    slots: HashMap<K, Slot<V>>,
    next_generation: u64,
}

/// Keyed memoizing cache for one resource family.
pub struct ResourceCache<K, V> {
    family: &'static str,
    fetcher: Box<Fetcher<K, V>>,
    state: Mutex<CacheState<K, V>>,
}

impl<K, V> ResourceCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new<F>(family: &'static str, fetcher: F) -> Self
    where
        F: Fn(K) -> BoxFuture<'static, ApiResult<V>> + Send + Sync + 'static,
    {
        Self {
            family,
            fetcher: Box::new(fetcher),
            state: Mutex::new(CacheState {
                slots: HashMap::new(),
                next_generation: 0,
            }),
        }
    }

    /// The value for `key`, fetching it on first use.
    pub async fn load(&self, key: Option<&K>) -> Loadable<V> {
        let Some(key) = key else {
            return Loadable::Absent;
        };

        let (generation, fetch) = {
            let mut state = self.state.lock().await;
            let pending = match state.slots.get(key) {
                Some(Slot::Settled(value)) => return Loadable::settled(value.clone()),
                Some(Slot::InFlight { generation, fetch }) => Some((*generation, fetch.clone())),
                None => None,
            };
            match pending {
                Some(pending) => pending,
                None => self.start_fetch(&mut state, key),
            }
        };

        self.settle(key, generation, fetch).await
    }

    /// Fetch `key` again, disregarding the memoized value.
    pub async fn refetch(&self, key: &K) -> Loadable<V> {
        let (generation, fetch) = {
            let mut state = self.state.lock().await;
            self.start_fetch(&mut state, key)
        };
        self.settle(key, generation, fetch).await
    }

    /// Current state of `key` without fetching.
    pub async fn peek(&self, key: Option<&K>) -> Loadable<V> {
        let Some(key) = key else {
            return Loadable::Absent;
        };
        match self.state.lock().await.slots.get(key) {
            Some(Slot::Settled(value)) => Loadable::settled(value.clone()),
            Some(Slot::InFlight { .. }) => Loadable::Loading,
            None => Loadable::Absent,
        }
    }

    fn start_fetch(&self, state: &mut CacheState<K, V>, key: &K) -> (u64, SharedFetch<V>) {
        state.next_generation += 1;
        let generation = state.next_generation;

        let family = self.family;
        let key_desc = format!("{key:?}");
        let request = (self.fetcher)(key.clone());
        let fetch = async move {
            log::debug!("Fetching {family} {key_desc}");
            match request.await {
                Ok(value) => Some(Arc::new(value)),
                Err(e) => {
                    if e.is_expected() {
                        log::warn!("Failed to fetch {family} {key_desc}: {e}");
                    } else {
                        log::error!("Failed to fetch {family} {key_desc}: {e}");
                    }
                    None
                }
            }
        }
        .boxed()
        .shared();

        state.slots.insert(
            key.clone(),
            Slot::InFlight {
                generation,
                fetch: fetch.clone(),
            },
        );
        (generation, fetch)
    }

    /// Await the fetch and commit it, unless a newer fetch of the key replaced it.
    async fn settle(&self, key: &K, generation: u64, fetch: SharedFetch<V>) -> Loadable<V> {
        let value = fetch.await;
        let mut state = self.state.lock().await;
        let is_latest = matches!(
            state.slots.get(key),
            Some(Slot::InFlight { generation: current, .. }) if *current == generation
        );
        if is_latest {
            state.slots.insert(key.clone(), Slot::Settled(value.clone()));
        }
        Loadable::settled(value)
    }
}

struct BindingState<K> {
    key: Option<K>,
    epoch: u64,
}

/// One consumer's view of a cache, driven by a changing key.
///
/// Results are only published while their key is still the bound key, so a slow
/// response for an old key never overwrites the value for a newer one.
pub struct CacheBinding<K, V> {
    cache: Arc<ResourceCache<K, V>>,
    state: Mutex<BindingState<K>>,
    tx: watch::Sender<Loadable<V>>,
}

impl<K, V> CacheBinding<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(cache: Arc<ResourceCache<K, V>>) -> Self {
        let (tx, _rx) = watch::channel(Loadable::Absent);
        Self {
            cache,
            state: Mutex::new(BindingState {
                key: None,
                epoch: 0,
            }),
            tx,
        }
    }

    pub fn current(&self) -> Loadable<V> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Loadable<V>> {
        self.tx.subscribe()
    }

    pub async fn key(&self) -> Option<K> {
        self.state.lock().await.key.clone()
    }

    /// Bind to `key` and load it. Re-binding the current key does not fetch again.
    pub async fn set_key(&self, key: Option<K>) -> Loadable<V> {
        let epoch = {
            let mut state = self.state.lock().await;
            let settled = !matches!(*self.tx.borrow(), Loadable::Loading);
            if state.epoch > 0 && state.key == key && settled {
                return self.current();
            }
            state.key.clone_from(&key);
            state.epoch += 1;
            self.tx.send_replace(if key.is_some() {
                Loadable::Loading
            } else {
                Loadable::Absent
            });
            state.epoch
        };

        let value = self.cache.load(key.as_ref()).await;
        self.publish_if_current(epoch, &value).await;
        value
    }

    /// Fetch the bound key again.
    pub async fn refetch(&self) -> Loadable<V> {
        let (epoch, key) = {
            let mut state = self.state.lock().await;
            state.epoch += 1;
            (state.epoch, state.key.clone())
        };
        let Some(key) = key else {
            return Loadable::Absent;
        };
        self.tx.send_replace(Loadable::Loading);
        let value = self.cache.refetch(&key).await;
        self.publish_if_current(epoch, &value).await;
        value
    }

    async fn publish_if_current(&self, epoch: u64, value: &Loadable<V>) {
        let state = self.state.lock().await;
        if state.epoch == epoch {
            self.tx.send_replace(value.clone());
        }
    }
}

/// The backend reads the workbench caches.
pub struct RemoteResources {
    pub statements: Arc<ResourceCache<(), Vec<Statement>>>,
    pub statement_code: Arc<ResourceCache<String, CodeResponse>>,
    pub templates: Arc<ResourceCache<TemplateKind, CodeResponse>>,
    pub models: Arc<ResourceCache<(), Vec<String>>>,
}

impl RemoteResources {
    pub fn new(
        statements_api: Arc<dyn StatementsApi>,
        templates_api: Arc<dyn CodeTemplatesApi>,
        review_api: Arc<dyn ReviewApi>,
    ) -> Self {
        let list_api = Arc::clone(&statements_api);
        let statements = ResourceCache::new("statements", move |(): ()| {
            let api = Arc::clone(&list_api);
            async move { api.list_statements().await }.boxed()
        });

        let code_api = statements_api;
        let statement_code = ResourceCache::new("statement code", move |id: String| {
            let api = Arc::clone(&code_api);
            async move { api.get_statement_code(&id).await }.boxed()
        });

        let templates = ResourceCache::new("template", move |kind: TemplateKind| {
            let api = Arc::clone(&templates_api);
            async move { api.get_template(kind).await }.boxed()
        });

        let models = ResourceCache::new("models", move |(): ()| {
            let api = Arc::clone(&review_api);
            async move { api.list_models().await }.boxed()
        });

        Self {
            statements: Arc::new(statements),
            statement_code: Arc::new(statement_code),
            templates: Arc::new(templates),
            models: Arc::new(models),
        }
    }

    /// All statements; empty when the list could not be fetched.
    pub async fn statements(&self) -> Vec<Statement> {
        match self.statements.load(Some(&())).await {
            Loadable::Ready(list) => list.as_ref().clone(),
            _ => Vec::new(),
        }
    }
}
