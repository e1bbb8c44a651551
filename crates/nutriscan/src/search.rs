//! Product search orchestration.
//!
//! [`ProductSearch`] drives one lookup at a time: cache check, quick lookup,
//! early partial publication, full lookup, optional legacy grade fallback,
//! final publication and cache write. Starting a new search cancels the
//! previous one; a superseded search never publishes state or notices.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use nutriscan_core::{
    Barcode, LookupKind, NutriError, NutritionData, ProductCache, ProductPayload, ProductSource,
    Result,
};

use nutriscan_cache::InMemoryCache;

use crate::state::{LoadingStage, Notice, SearchOutcome, SearchState};

/// Buffered notices per subscriber before old ones are dropped.
const NOTICE_CAPACITY: usize = 16;

static SHARED_CACHE: OnceLock<Arc<InMemoryCache>> = OnceLock::new();

/// The process-wide in-memory cache.
///
/// Created on first use with the given TTL; later callers get the same cache
/// and their `ttl` is ignored.
pub fn shared_cache(ttl: Duration) -> Arc<InMemoryCache> {
    SHARED_CACHE
        .get_or_init(|| Arc::new(InMemoryCache::with_ttl(ttl)))
        .clone()
}

/// Lifecycle of one search session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Quick,
    Full,
    Fallback,
    Done,
    Aborted,
}

/// The currently active session, owned by the orchestrator.
#[derive(Debug, Default)]
struct SessionSlot {
    generation: u64,
    token: CancellationToken,
}

impl SessionSlot {
    /// Cancels the active session and opens a new generation.
    fn supersede(&mut self) -> (u64, CancellationToken) {
        self.token.cancel();
        self.generation += 1;
        self.token = CancellationToken::new();
        (self.generation, self.token.clone())
    }
}

/// One in-flight lookup.
#[derive(Debug)]
struct Session {
    barcode: Barcode,
    generation: u64,
    token: CancellationToken,
    phase: Phase,
}

impl Session {
    fn advance(&mut self, phase: Phase) {
        debug!(barcode = %self.barcode, from = ?self.phase, to = ?phase, "Session phase");
        self.phase = phase;
    }
}

/// Barcode lookup orchestrator.
///
/// Holds the observable [`SearchState`] and broadcasts [`Notice`]s. The product
/// source and cache are injected, so tests can supply their own.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use nutriscan::{InMemoryCache, OpenFoodFactsProvider, ProductSearch};
///
/// let search = ProductSearch::new(
///     Arc::new(OpenFoodFactsProvider::new()),
///     Arc::new(InMemoryCache::new()),
/// );
/// let mut state = search.subscribe();
///
/// search.search("3017620422003").await;
/// println!("{:?}", state.borrow_and_update().result);
/// ```
pub struct ProductSearch {
    source: Arc<dyn ProductSource>,
    cache: Arc<dyn ProductCache>,
    slot: Mutex<SessionSlot>,
    state: watch::Sender<SearchState>,
    notices: broadcast::Sender<Notice>,
}

impl std::fmt::Debug for ProductSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductSearch")
            .field("source", &self.source.name())
            .field("cache", &self.cache)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl ProductSearch {
    /// Create a search over the given source and cache.
    #[must_use]
    pub fn new(source: Arc<dyn ProductSource>, cache: Arc<dyn ProductCache>) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            source,
            cache,
            slot: Mutex::new(SessionSlot::default()),
            state,
            notices,
        }
    }

    /// Create a search against Open Food Facts from loaded configuration.
    ///
    /// Uses the [`shared_cache`] when caching is enabled, otherwise a
    /// [`NoopCache`](nutriscan_cache::NoopCache).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    #[cfg(feature = "off")]
    pub fn from_config(config: &crate::NutriConfig) -> Result<Self> {
        config.validate()?;

        let source = nutriscan_off::OpenFoodFactsProvider::new()
            .with_base_url(&config.base_url)?
            .with_user_agent(config.user_agent.clone())
            .with_timeout(config.timeout());

        let cache: Arc<dyn ProductCache> = if config.cache_enabled {
            shared_cache(config.cache_ttl())
        } else {
            Arc::new(nutriscan_cache::NoopCache::new())
        };

        debug!(
            base_url = %config.base_url,
            cache_enabled = config.cache_enabled,
            "Configured product search"
        );
        Ok(Self::new(Arc::new(source), cache))
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    /// Subscribe to user-facing notices.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// The currently published product, partial or complete.
    #[must_use]
    pub fn current_result(&self) -> Option<NutritionData> {
        self.state.borrow().result.clone()
    }

    /// Current loading stage.
    #[must_use]
    pub fn loading_stage(&self) -> LoadingStage {
        self.state.borrow().stage
    }

    /// Returns true while a lookup is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Cancel any in-flight search and reset to an empty, idle state.
    pub fn clear(&self) {
        let mut slot = self.lock_slot();
        slot.supersede();
        self.state.send_if_modified(|state| {
            let changed = state.result.is_some() || state.is_loading();
            *state = SearchState::default();
            changed
        });
        debug!("Cleared search state");
    }

    /// Look up a barcode.
    ///
    /// Surrounding whitespace is ignored and an empty barcode is a no-op.
    /// Any search still in flight is cancelled first.
    #[instrument(skip(self))]
    pub async fn search(&self, barcode: &str) -> SearchOutcome {
        let barcode = Barcode::new(barcode);
        if barcode.is_empty() {
            return SearchOutcome::Ignored;
        }

        let mut session = self.begin(barcode);

        let outcome = match self.run(&mut session).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_failure() => {
                warn!(barcode = %session.barcode, error = %e, "Product lookup failed");
                let notice = Notice::FetchFailed {
                    barcode: session.barcode.clone(),
                };
                match self.commit(&session, |state| state.result = None, Some(notice)) {
                    Ok(()) => SearchOutcome::Failed,
                    Err(_) => SearchOutcome::Superseded,
                }
            }
            // Cancelled; not-found never leaves `run`
            Err(_) => SearchOutcome::Superseded,
        };

        let finished = self.publish(&session, |state| state.stage = LoadingStage::Idle);
        if finished.is_ok() && outcome != SearchOutcome::Superseded {
            session.advance(Phase::Done);
        } else {
            session.advance(Phase::Aborted);
        }

        outcome
    }

    fn lock_slot(&self) -> MutexGuard<'_, SessionSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Supersede the current session and start a new one.
    fn begin(&self, barcode: Barcode) -> Session {
        let (generation, token) = self.lock_slot().supersede();
        debug!(barcode = %barcode, generation, "Starting search session");
        Session {
            barcode,
            generation,
            token,
            phase: Phase::Quick,
        }
    }

    async fn run(&self, session: &mut Session) -> Result<SearchOutcome> {
        match self.cache.get(&session.barcode).await {
            Ok(Some(cached)) if !cached.is_partial => {
                self.publish(session, |state| {
                    state.result = Some(cached.clone());
                    state.stage = LoadingStage::Idle;
                })?;
                return Ok(SearchOutcome::Cached(cached));
            }
            Ok(_) => {}
            Err(e) => warn!(barcode = %session.barcode, error = %e, "Cache read failed"),
        }

        self.publish(session, |state| state.stage = LoadingStage::Quick)?;

        let quick = match self.fetch(session, LookupKind::Quick).await {
            Ok(product) => product,
            Err(NutriError::ProductNotFound(_)) => {
                let notice = Notice::NotFound {
                    barcode: session.barcode.clone(),
                };
                self.commit(session, |state| state.result = None, Some(notice))?;
                return Ok(SearchOutcome::NotFound);
            }
            Err(e) => return Err(e),
        };

        let partial = NutritionData::partial(quick);
        self.publish(session, |state| {
            state.result = Some(partial.clone());
            state.stage = LoadingStage::Full;
        })?;
        session.advance(Phase::Full);

        let mut full = match self.fetch(session, LookupKind::Full).await {
            Ok(product) => product,
            Err(NutriError::ProductNotFound(_)) => {
                debug!(barcode = %session.barcode, "Full lookup found nothing, keeping partial record");
                return Ok(SearchOutcome::Partial(partial));
            }
            Err(e) => return Err(e),
        };

        if !full.grades.has_grade() {
            session.advance(Phase::Fallback);
            match self.fetch(session, LookupKind::Legacy).await {
                Ok(legacy) => full.grades.merge_fallback(legacy.grades),
                Err(NutriError::Cancelled) => return Err(NutriError::Cancelled),
                Err(e) => debug!(barcode = %session.barcode, error = %e, "Legacy grade lookup failed"),
            }
        }

        let complete = NutritionData::complete(full);
        debug!(barcode = %session.barcode, grade = ?complete.grade(), "Lookup complete");

        self.publish(session, |state| state.result = Some(complete.clone()))?;

        if let Err(e) = self.cache.put(&session.barcode, &complete).await {
            warn!(barcode = %session.barcode, error = %e, "Failed to cache product");
        }

        Ok(SearchOutcome::Complete(complete))
    }

    /// Run one lookup, discarding its result if the session was superseded meanwhile.
    async fn fetch(&self, session: &Session, kind: LookupKind) -> Result<ProductPayload> {
        if session.token.is_cancelled() {
            return Err(NutriError::Cancelled);
        }

        debug!(
            source = self.source.name(),
            barcode = %session.barcode,
            kind = kind.as_str(),
            "Fetching product"
        );
        let result = self
            .source
            .fetch_product(&session.barcode, kind, &session.token)
            .await;

        if session.token.is_cancelled() {
            return Err(NutriError::Cancelled);
        }
        result
    }

    fn publish(&self, session: &Session, update: impl FnOnce(&mut SearchState)) -> Result<()> {
        self.commit(session, update, None)
    }

    /// Apply a state update and send a notice, unless the session is no longer current.
    ///
    /// The slot lock is held across the check and the publication so a
    /// superseded session cannot publish after its successor.
    fn commit(
        &self,
        session: &Session,
        update: impl FnOnce(&mut SearchState),
        notice: Option<Notice>,
    ) -> Result<()> {
        let slot = self.lock_slot();
        if slot.generation != session.generation || session.token.is_cancelled() {
            return Err(NutriError::Cancelled);
        }

        self.state.send_if_modified(|state| {
            let before = state.clone();
            update(state);
            *state != before
        });

        if let Some(notice) = notice {
            // No subscribers is fine
            let _ = self.notices.send(notice);
        }

        drop(slot);
        Ok(())
    }
}
