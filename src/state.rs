use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    api::{AuthApi, BookingApi, ProviderSource},
    booking::{BookingFlow, FlowSnapshot},
    config::{AppConfig, DEFAULT_SESSION_IDLE_TTL},
    error::{AppError, AppResult},
    models::Booking,
};

/// Handles shared by request handlers. Each concern lives in its own
/// container so handlers only reach for what they use.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<WizardSessions>,
    pub providers: Arc<dyn ProviderSource>,
    pub booking_api: Arc<dyn BookingApi>,
    pub auth_api: Arc<dyn AuthApi>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        providers: Arc<dyn ProviderSource>,
        booking_api: Arc<dyn BookingApi>,
        auth_api: Arc<dyn AuthApi>,
    ) -> Self {
        let sessions = Arc::new(WizardSessions::new(config.session_idle_ttl));
        Self {
            config: Arc::new(config),
            sessions,
            providers,
            booking_api,
            auth_api,
        }
    }
}

/// In-memory booking wizard sessions. Nothing survives a restart, and
/// sessions idle for longer than the configured TTL are dropped.
pub struct WizardSessions {
    flows: Arc<Mutex<HashMap<Uuid, SessionEntry>>>,
    idle_ttl: Duration,
}

struct SessionEntry {
    flow: BookingFlow,
    last_touched: Instant,
}

impl SessionEntry {
    fn is_idle(&self, now: Instant, ttl: Duration) -> bool {
        !self.flow.is_submitting() && now.saturating_duration_since(self.last_touched) >= ttl
    }
}

impl Default for WizardSessions {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_IDLE_TTL)
    }
}

impl WizardSessions {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            flows: Arc::new(Mutex::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub async fn start(&self) -> FlowSnapshot {
        let flow = BookingFlow::new();
        let snapshot = flow.snapshot();
        let now = Instant::now();
        let mut flows = self.flows.lock().await;
        evict(&mut flows, now, self.idle_ttl);
        flows.insert(
            flow.id(),
            SessionEntry {
                flow,
                last_touched: now,
            },
        );
        log::info!("Booking session {} started", snapshot.session_id);
        snapshot
    }

    /// Runs `f` against the session's flow under the lock. A session that
    /// has sat idle past the TTL is gone.
    pub async fn with_flow<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut BookingFlow) -> AppResult<T>,
    ) -> AppResult<T> {
        let now = Instant::now();
        let mut flows = self.flows.lock().await;
        if flows
            .get(&id)
            .is_some_and(|entry| entry.is_idle(now, self.idle_ttl))
        {
            flows.remove(&id);
            log::info!("Booking session {id} expired");
        }
        let entry = flows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("booking session {id}")))?;
        entry.last_touched = now;
        f(&mut entry.flow)
    }

    pub async fn abandon(&self, id: Uuid) -> bool {
        let removed = self.flows.lock().await.remove(&id).is_some();
        if removed {
            log::info!("Booking session {id} abandoned");
        }
        removed
    }

    pub async fn active_count(&self) -> usize {
        self.flows.lock().await.len()
    }

    /// Drops every session idle at `now`. Sessions with a submission in
    /// flight are kept.
    pub async fn evict_idle_at(&self, now: Instant) -> usize {
        evict(&mut *self.flows.lock().await, now, self.idle_ttl)
    }

    /// Submits the session's draft. The lock is released while the backend
    /// call is outstanding; the `submitting` flag keeps a second submit out.
    /// A successful submit ends the session.
    pub async fn submit(&self, id: Uuid, api: &dyn BookingApi) -> AppResult<Booking> {
        let request = self.with_flow(id, BookingFlow::begin_submit).await?;
        let in_flight = InFlightSubmit {
            flows: self.flows.clone(),
            id,
            settled: false,
        };
        let result = api.create_booking(&request).await;
        in_flight.settle(result).await
    }
}

fn evict(flows: &mut HashMap<Uuid, SessionEntry>, now: Instant, ttl: Duration) -> usize {
    let before = flows.len();
    flows.retain(|_, entry| !entry.is_idle(now, ttl));
    let evicted = before - flows.len();
    if evicted > 0 {
        log::info!("Evicted {evicted} idle booking sessions");
    }
    evicted
}

/// Clears the session's `submitting` flag if the submit future is dropped
/// before the backend answers.
struct InFlightSubmit {
    flows: Arc<Mutex<HashMap<Uuid, SessionEntry>>>,
    id: Uuid,
    settled: bool,
}

impl InFlightSubmit {
    async fn settle(mut self, result: AppResult<Booking>) -> AppResult<Booking> {
        let id = self.id;
        let mut flows = self.flows.lock().await;
        self.settled = true;
        let Some(entry) = flows.get_mut(&id) else {
            log::info!("Booking session {id} was abandoned while submitting; discarding response");
            return result;
        };
        entry.last_touched = Instant::now();
        match entry.flow.finish_submit(result) {
            Ok(booking) => {
                flows.remove(&id);
                log::info!("Booking session {id} submitted as booking {}", booking.id);
                Ok(booking)
            }
            Err(err) => {
                log::warn!("Booking session {id} submission failed: {err}");
                Err(err)
            }
        }
    }
}

fn cancel_in_flight(flows: &mut HashMap<Uuid, SessionEntry>, id: Uuid) {
    if let Some(entry) = flows.get_mut(&id) {
        entry.flow.cancel_submit();
        log::warn!("Booking session {id} submission was cancelled before the backend answered");
    }
}

impl Drop for InFlightSubmit {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let id = self.id;
        match self.flows.try_lock() {
            Ok(mut flows) => cancel_in_flight(&mut flows, id),
            Err(_) => {
                let flows = self.flows.clone();
                tokio::spawn(async move {
                    cancel_in_flight(&mut *flows.lock().await, id);
                });
            }
        }
    }
}

/// Periodically drops idle wizard sessions.
pub fn spawn_idle_sweeper(sessions: Arc<WizardSessions>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if sessions.evict_idle_at(Instant::now()).await > 0 {
                log::info!("{} booking sessions active", sessions.active_count().await);
            }
        }
    })
}
