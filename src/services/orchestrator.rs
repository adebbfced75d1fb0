//! Orquestador de acciones
//!
//! Envuelve una llamada al motor de transición con la disciplina de
//! concurrencia y durabilidad que necesita un sistema multiusuario donde
//! varios dispatchers o drivers pueden competir por la misma carga.
//!
//! Protocolo por acción: snapshot de la carga conocida → update optimista
//! del cache → re-lectura del estado autoritativo → re-ejecución del guard
//! y la transición contra ese estado → escritura atómica de (mutación,
//! evento) → rollback del cache si algo falla. Solo los fallos transitorios
//! de almacenamiento se reintentan, con backoff exponencial acotado.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{CacheKey, LoadCache};
use crate::lifecycle::{
    assert_dispatcher_action_allowed, assert_driver_action_allowed, compute_dispatcher_transition,
    compute_driver_transition,
};
use crate::models::actor::ActorClaims;
use crate::models::event::LoadEvent;
use crate::models::load::Load;
use crate::models::transition::{
    AssignmentChange, AssignmentData, DispatcherAction, DriverAction, TransitionResult,
};
use crate::repositories::{FleetLookup, LoadRepository};
use crate::utils::errors::{AppError, AppResult};

/// Política de reintentos para fallos transitorios de almacenamiento
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay exponencial con tope y jitter de hasta 10%
    fn delay_for(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);
        let jitter_ceiling = (exponential.as_millis() as u64 / 10).max(1);
        let jitter = rand::thread_rng().gen_range(0..jitter_ceiling);
        exponential + Duration::from_millis(jitter)
    }
}

/// La acción solicitada, tal como se re-ejecuta contra el estado autoritativo
#[derive(Debug, Clone)]
enum ActionRequest {
    Driver {
        action: DriverAction,
    },
    Dispatcher {
        action: DispatcherAction,
        assignment: Option<AssignmentData>,
        reason: Option<String>,
    },
}

/// Acción en estado Pending: el update optimista ya es visible en el
/// cache, la escritura atómica todavía no se despachó. Puede cancelarse
/// con `ActionOrchestrator::cancel` antes de `commit`.
#[derive(Debug)]
pub struct StagedAction {
    claims: ActorClaims,
    load_id: Uuid,
    request: ActionRequest,
    previous: Load,
    optimistic: Load,
}

impl StagedAction {
    /// Snapshot previo al update optimista
    pub fn previous(&self) -> &Load {
        &self.previous
    }

    /// Vista optimista aplicada al cache
    pub fn optimistic(&self) -> &Load {
        &self.optimistic
    }
}

/// Resultado de resolver una acción staged
#[derive(Debug)]
pub enum ActionOutcome {
    /// La escritura atómica se aplicó; esta es la carga autoritativa
    Committed(Load),
    /// Algo falló; el cache volvió al snapshot y el error original
    /// se conserva sin re-envolver
    RolledBack { original: Load, error: AppError },
}

impl ActionOutcome {
    pub fn into_result(self) -> AppResult<Load> {
        match self {
            ActionOutcome::Committed(load) => Ok(load),
            ActionOutcome::RolledBack { error, .. } => Err(error),
        }
    }
}

/// Orquestador de acciones sobre cargas
pub struct ActionOrchestrator {
    repo: Arc<dyn LoadRepository>,
    lookup: Arc<dyn FleetLookup>,
    cache: Arc<dyn LoadCache>,
    retry: RetryPolicy,
}

impl ActionOrchestrator {
    pub fn new(
        repo: Arc<dyn LoadRepository>,
        lookup: Arc<dyn FleetLookup>,
        cache: Arc<dyn LoadCache>,
    ) -> Self {
        Self {
            repo,
            lookup,
            cache,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Acción de driver orquestada de punta a punta
    pub async fn apply_driver_action(
        &self,
        claims: &ActorClaims,
        load_id: Uuid,
        action: DriverAction,
    ) -> AppResult<Load> {
        let staged = self.stage_driver_action(claims, load_id, action).await?;
        self.commit(staged).await.into_result()
    }

    /// Acción de dispatcher orquestada de punta a punta
    pub async fn apply_dispatcher_action(
        &self,
        claims: &ActorClaims,
        load_id: Uuid,
        action: DispatcherAction,
        assignment: Option<AssignmentData>,
        reason: Option<String>,
    ) -> AppResult<Load> {
        let staged = self
            .stage_dispatcher_action(claims, load_id, action, assignment, reason)
            .await?;
        self.commit(staged).await.into_result()
    }

    /// Computa la transición contra el snapshot conocido y deja la vista
    /// optimista en el cache. No persiste nada.
    pub async fn stage_driver_action(
        &self,
        claims: &ActorClaims,
        load_id: Uuid,
        action: DriverAction,
    ) -> AppResult<StagedAction> {
        let previous = self.known_load(claims.fleet_id, load_id).await?;

        assert_driver_action_allowed(&previous, claims.driver_id)?;
        let transition = compute_driver_transition(&previous, action, Utc::now())?;

        self.stage(claims, load_id, ActionRequest::Driver { action }, previous, transition)
            .await
    }

    /// Variante de dispatcher. Valida además que el driver y el vehículo
    /// objetivo existen en el fleet del actor antes de publicar la vista
    /// optimista; un objetivo de otro fleet se reporta como `NotFound`.
    pub async fn stage_dispatcher_action(
        &self,
        claims: &ActorClaims,
        load_id: Uuid,
        action: DispatcherAction,
        assignment: Option<AssignmentData>,
        reason: Option<String>,
    ) -> AppResult<StagedAction> {
        let previous = self.known_load(claims.fleet_id, load_id).await?;

        assert_dispatcher_action_allowed(&claims.roles)?;
        let transition =
            compute_dispatcher_transition(&previous, action, assignment.as_ref(), reason.as_deref())?;

        if let AssignmentChange::Set {
            driver_id,
            vehicle_id,
        } = transition.assignment
        {
            self.lookup.get_driver(claims.fleet_id, driver_id).await?;
            self.lookup.get_vehicle(claims.fleet_id, vehicle_id).await?;
        }

        self.stage(
            claims,
            load_id,
            ActionRequest::Dispatcher {
                action,
                assignment,
                reason,
            },
            previous,
            transition,
        )
        .await
    }

    async fn stage(
        &self,
        claims: &ActorClaims,
        load_id: Uuid,
        request: ActionRequest,
        previous: Load,
        transition: TransitionResult,
    ) -> AppResult<StagedAction> {
        let optimistic = transition.apply_to(&previous, Utc::now());
        let key = CacheKey::detail(claims.fleet_id, load_id);
        self.cache.put_load(key, optimistic.clone()).await;

        Ok(StagedAction {
            claims: claims.clone(),
            load_id,
            request,
            previous,
            optimistic,
        })
    }

    /// Descarta una acción staged antes de despachar la escritura,
    /// restaurando el snapshot en el cache
    pub async fn cancel(&self, staged: StagedAction) {
        let key = CacheKey::detail(staged.claims.fleet_id, staged.load_id);
        self.cache.put_load(key, staged.previous).await;
    }

    /// Resuelve una acción staged contra el estado autoritativo.
    ///
    /// Este es el paso crítico de corrección: otro actor puede haber
    /// movido la carga entre el staging y esta llamada, así que el guard
    /// y la transición se re-ejecutan contra la carga re-leída, nunca
    /// contra el snapshot.
    pub async fn commit(&self, staged: StagedAction) -> ActionOutcome {
        let key = CacheKey::detail(staged.claims.fleet_id, staged.load_id);

        match self.commit_inner(&staged).await {
            Ok(load) => {
                self.cache.put_load(key, load.clone()).await;
                self.cache
                    .invalidate(&CacheKey::fleet(staged.claims.fleet_id))
                    .await;
                info!(
                    "✅ Acción aplicada sobre load {} -> {}",
                    staged.load_id, load.status
                );
                ActionOutcome::Committed(load)
            }
            Err(error) => {
                self.cache.put_load(key, staged.previous.clone()).await;
                warn!(
                    "↩️ Rollback de update optimista sobre load {}: {}",
                    staged.load_id, error
                );
                ActionOutcome::RolledBack {
                    original: staged.previous,
                    error,
                }
            }
        }
    }

    async fn commit_inner(&self, staged: &StagedAction) -> AppResult<Load> {
        let fleet_id = staged.claims.fleet_id;
        let load_id = staged.load_id;

        let repo = Arc::clone(&self.repo);
        let authoritative = self
            .with_retry(|| {
                let repo = Arc::clone(&repo);
                async move { repo.get_by_id(fleet_id, load_id).await }
            })
            .await?;

        let transition = match &staged.request {
            ActionRequest::Driver { action } => {
                assert_driver_action_allowed(&authoritative, staged.claims.driver_id)?;
                compute_driver_transition(&authoritative, *action, Utc::now())?
            }
            ActionRequest::Dispatcher {
                action,
                assignment,
                reason,
            } => {
                assert_dispatcher_action_allowed(&staged.claims.roles)?;
                compute_dispatcher_transition(
                    &authoritative,
                    *action,
                    assignment.as_ref(),
                    reason.as_deref(),
                )?
            }
        };

        let now = Utc::now();
        let updated = transition.apply_to(&authoritative, now);
        let event = LoadEvent::new(
            fleet_id,
            load_id,
            &staged.claims.uid,
            transition.event_payload.clone(),
            now,
        );

        let repo = Arc::clone(&self.repo);
        let expected_version = authoritative.updated_at;
        self.with_retry(|| {
            let repo = Arc::clone(&repo);
            let updated = updated.clone();
            let event = event.clone();
            async move {
                repo.atomic_update(load_id, expected_version, updated, event)
                    .await
            }
        })
        .await
    }

    /// Snapshot de la carga conocida: cache primero, repositorio después
    async fn known_load(&self, fleet_id: Uuid, load_id: Uuid) -> AppResult<Load> {
        let key = CacheKey::detail(fleet_id, load_id);
        if let Some(load) = self.cache.get_load(&key).await {
            return Ok(load);
        }
        let load = self.repo.get_by_id(fleet_id, load_id).await?;
        self.cache.put_load(key, load.clone()).await;
        Ok(load)
    }

    /// Reintenta solo errores transitorios de almacenamiento. Las
    /// transiciones rechazadas y los fallos de autorización no pasan
    /// por aquí dos veces.
    async fn with_retry<T, F, Fut>(&self, operation: F) -> AppResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = AppResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Err(error) if error.is_retriable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "⏳ Fallo transitorio de almacenamiento (intento {}): {}. Reintentando en {:?}",
                        attempt + 1,
                        error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
