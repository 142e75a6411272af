// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Control Plane (§4.1): top-level aggregate owning every
//! `WorkflowInstance`, composing the broker, store, supervisor, health
//! monitor, and registry, and exposing the public `Create`/`Start`/`Stop`/
//! `Pause`/`Resume`/`Get`/`List`/`Subscribe`/`GetHealthStatus` operations.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex as SyncMutex;
use perles_core::error::{ConflictError, ExternalError, InternalError, NotFoundError, WorkflowError};
use perles_core::{
    ControlPlaneEvent, Clock, EventFilter, EventType, Namespace, ProcessEventType, ProcessId, ProcessRole,
    RecoveryAction, WorkflowDescriptor, WorkflowId, WorkflowSpec, WorkflowState,
};
use perles_registry::RegistryService;
use perles_store::SessionStore;
use perles_supervisor::coordinator_driver::{CoordinatorDriver, HandoffReceived, RefreshState};
use perles_supervisor::process_spawner::{ExitReason, ProcessHandle, ProcessSpawner, SignalKind, SpawnRequest};
use perles_supervisor::read_loop::SupervisedLine;
use perles_supervisor::worker_pool::WorkerPool;
use tokio::sync::mpsc;

use crate::broker::{Broker, Subscription};
use crate::collaborators::TrackerExecutor;
use crate::config::Config;
use crate::health_monitor::{CheckOutcome, HealthMonitor};
use crate::recovery_executor::{RecoveryError, RecoveryExecutor, RecoveryOutcome};
use crate::workflow_creator::WorkflowCreator;
use crate::workflow_instance::WorkflowInstance;

/// What a caller supplies to `Create` beyond the bare `WorkflowSpec`:
/// the project a session belongs to, the registration namespace, and the
/// rendering args for the coordinator prompt template.
pub struct CreateRequest {
    pub spec: WorkflowSpec,
    pub project: String,
    pub namespace: Namespace,
    pub args: BTreeMap<String, String>,
}

pub struct StopRequest {
    pub reason: String,
    pub force: bool,
    /// How long to wait for a coordinator drain before escalating to a kill
    /// signal (§4.1 `Stop(id, {Reason, Force, GracePeriod})`).
    pub grace_period: Duration,
}

type Instances = Arc<SyncMutex<HashMap<WorkflowId, Arc<WorkflowInstance>>>>;

pub struct ControlPlane<C: Clock> {
    config: Config,
    clock: C,
    store: SessionStore,
    registry: Arc<dyn RegistryService>,
    tracker: Arc<dyn TrackerExecutor>,
    spawner: Arc<dyn ProcessSpawner>,
    broker: Broker,
    health: Arc<HealthMonitor<C>>,
    instances: Instances,
}

impl<C: Clock> ControlPlane<C> {
    pub fn new(
        config: Config,
        clock: C,
        store: SessionStore,
        registry: Arc<dyn RegistryService>,
        tracker: Arc<dyn TrackerExecutor>,
        spawner: Arc<dyn ProcessSpawner>,
    ) -> Self {
        let broker = Broker::new(config.broker_capacity);
        let health = Arc::new(HealthMonitor::new(clock.clone(), config.health_policy));
        let instances: Instances = Arc::new(SyncMutex::new(HashMap::new()));

        spawn_health_check_loop(
            clock.clone(),
            health.clone(),
            broker.clone(),
            store.clone(),
            instances.clone(),
            config.health_check_interval,
        );

        Self {
            config,
            clock,
            store,
            registry,
            tracker,
            spawner,
            broker,
            health,
            instances,
        }
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    pub fn health(&self) -> &HealthMonitor<C> {
        &self.health
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc_now()
    }

    fn instance(&self, id: &WorkflowId) -> Result<Arc<WorkflowInstance>, WorkflowError> {
        self.instances
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| NotFoundError::Workflow(id.clone()).into())
    }

    /// Takes an owned snapshot rather than a `MutexGuard` reference: the
    /// caller must drop its lock before calling this (§5 locking
    /// discipline, "no lock held while publishing to the broker").
    async fn publish_lifecycle(&self, event_type: EventType, descriptor: &WorkflowDescriptor) {
        let event = ControlPlaneEvent::lifecycle(
            event_type,
            descriptor.id.clone(),
            descriptor.template_id.clone(),
            descriptor.name.clone(),
            descriptor.state,
            self.now(),
        );
        self.broker.publish(event).await;
    }

    /// Persists a workflow's current state to its session row. On failure
    /// the caller is expected to roll the in-memory transition back (§4.1:
    /// "the core never reports a state change it did not durably persist").
    async fn persist_state(&self, id: &WorkflowId, state: WorkflowState, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        let mut session =
            self.store.find_by_id(id).await.map_err(|e| WorkflowError::from(InternalError::from(e)))?;
        session.state = state;
        session.updated_at = now;
        if state == WorkflowState::Running && session.started_at.is_none() {
            session.started_at = Some(now);
        }
        if state == WorkflowState::Paused {
            session.paused_at = Some(now);
        }
        self.store.save(&session).await.map_err(|e| WorkflowError::from(InternalError::from(e)))
    }

    /// §4.1 `Create`: persists a pending session row, constructs the
    /// in-memory `WorkflowInstance`, publishes `WorkflowCreated`.
    pub async fn create(&self, request: CreateRequest) -> Result<WorkflowId, WorkflowError> {
        request.spec.validate().map_err(WorkflowError::from)?;

        let registration = self
            .registry
            .get_by_key(&request.namespace, request.spec.template_id.as_str())
            .await
            .map_err(|e| WorkflowError::from(perles_core::error::ValidationError::from(e)))?;

        let creator = WorkflowCreator::new(self.tracker.as_ref());
        let created = creator
            .create(&request.spec, &registration, &request.args)
            .await
            .map_err(|e| match e {
                crate::workflow_creator::WorkflowCreationError::Validation(v) => WorkflowError::from(v),
                crate::workflow_creator::WorkflowCreationError::Tracker(t) => WorkflowError::from(t),
            })?;

        let mut spec = request.spec;
        spec.epic_id = Some(created.epic_id);
        spec.initial_prompt = created.initial_prompt;

        let id = WorkflowId::new();
        let descriptor = WorkflowDescriptor::new(id.clone(), &spec, self.now());

        // Worktree provisioning is a `GitExecutor` concern (§4.9); until a
        // worktree mode resolves one, the working directory defaults to the
        // project's own root.
        let session = perles_core::Session::new(id.clone(), request.project.clone(), request.project.clone(), self.now());
        self.store.save(&session).await.map_err(|e| WorkflowError::from(InternalError::from(e)))?;

        let coordinator = CoordinatorDriver::new(ProcessId::new(), registration);
        let pool = WorkerPool::new(id.to_string());
        let instance = Arc::new(WorkflowInstance::new(descriptor, coordinator, pool));
        self.instances.lock().insert(id.clone(), instance.clone());

        let snapshot = instance.descriptor.lock().clone();
        self.publish_lifecycle(EventType::WorkflowCreated, &snapshot).await;
        Ok(id)
    }

    /// §4.1 `Start`: preconditions `state ∈ {pending, paused}`.
    pub async fn start(&self, id: &WorkflowId) -> Result<(), WorkflowError> {
        let instance = self.instance(id)?;

        {
            let descriptor = instance.descriptor.lock();
            if !descriptor.state.can_start() {
                return Err(ConflictError::IllegalState { id: id.clone(), state: descriptor.state.to_string() }.into());
            }
        }

        let request = SpawnRequest {
            workflow_id: id.clone(),
            role: ProcessRole::Coordinator,
            command: "perles-coordinator".to_string(),
            args: Vec::new(),
            env: HashMap::new(),
            workdir: PathBuf::from("."),
        };
        let (line_tx, line_rx) = mpsc::channel::<SupervisedLine>(64);

        let spawn_result = self.spawner.spawn(request, line_tx).await;
        match spawn_result {
            Ok(handle) => {
                let now = self.now();
                let (snapshot, prior) = {
                    let mut descriptor = instance.descriptor.lock();
                    let prior = descriptor.transition(WorkflowState::Running, now).map_err(|_| {
                        ConflictError::IllegalState { id: id.clone(), state: descriptor.state.to_string() }
                    })?;
                    (descriptor.clone(), prior)
                };
                if let Err(err) = self.persist_state(id, WorkflowState::Running, now).await {
                    instance.descriptor.lock().state = prior;
                    return Err(err);
                }

                *instance.coordinator_handle.lock() = Some(handle.clone());
                self.health.track(id.clone());
                self.spawn_process_reader(id.clone(), instance.clone(), handle, line_rx);
                self.publish_lifecycle(EventType::WorkflowStarted, &snapshot).await;
                Ok(())
            }
            Err(spawn_err) => {
                let now = self.now();
                let snapshot = {
                    let mut descriptor = instance.descriptor.lock();
                    let _ = descriptor.transition(WorkflowState::Failed, now);
                    descriptor.clone()
                };
                let _ = self.persist_state(id, WorkflowState::Failed, now).await;
                self.publish_lifecycle(EventType::WorkflowFailed, &snapshot).await;
                Err(ExternalError::Spawn(spawn_err.to_string()).into())
            }
        }
    }

    /// Owns a spawned coordinator's event stream for the rest of its life
    /// (§2 control flow, §4.1): classifies each line into the Health
    /// Monitor, relays it onto the broker, and — once the stream ends
    /// because the child's stdout closed — applies the coordinator-exit
    /// failure policy.
    fn spawn_process_reader(
        &self,
        id: WorkflowId,
        instance: Arc<WorkflowInstance>,
        handle: ProcessHandle,
        mut line_rx: mpsc::Receiver<SupervisedLine>,
    ) {
        let health = self.health.clone();
        let broker = self.broker.clone();
        let store = self.store.clone();
        let spawner = self.spawner.clone();
        let clock = self.clock.clone();

        tokio::spawn(async move {
            while let Some(line) = line_rx.recv().await {
                match line {
                    SupervisedLine::Event(scoped) => {
                        health.record_heartbeat(&id);
                        if scoped.event.is_progress() {
                            health.record_progress(&id);
                        }

                        if scoped.event.event_type == ProcessEventType::Handoff {
                            handle_coordinator_handoff(&id, &instance, &scoped.event);
                        }
                        if scoped.event.event_type == ProcessEventType::WorkflowComplete {
                            // §4.6 event-ingest loop: "ProcessWorkflowComplete
                            // untracks the workflow" ahead of the coordinator
                            // actually exiting.
                            health.untrack(&id);
                        }

                        let event_type = EventType::from_process_event_type(&scoped.event.event_type);
                        let event = ControlPlaneEvent::process(
                            event_type,
                            id.clone(),
                            scoped.event.process_id.clone(),
                            scoped.event.payload.clone(),
                            scoped.event.timestamp,
                        );
                        broker.publish(event).await;
                    }
                    SupervisedLine::ParseError { workflow_id, raw, error } => {
                        tracing::warn!(%workflow_id, %error, raw = %raw, "malformed process event line");
                    }
                }
            }

            // Stdout closed: the coordinator process exited. §4.1 failure
            // policy: workflow-complete exit reason -> completed, anything
            // else -> failed; workers retired either way.
            let exit_reason = spawner.wait(&handle).await;
            let to_state = match &exit_reason {
                Ok(ExitReason::WorkflowComplete) => WorkflowState::Completed,
                Err(err) => {
                    tracing::warn!(workflow_id = %id, %err, "failed to reap coordinator process");
                    WorkflowState::Failed
                }
                Ok(_) => WorkflowState::Failed,
            };

            let now = clock.utc_now();
            let snapshot = {
                let mut descriptor = instance.descriptor.lock();
                if descriptor.state.is_terminal() {
                    return;
                }
                if descriptor.transition(to_state, now).is_err() {
                    return;
                }
                descriptor.clone()
            };

            for worker in instance.pool.list() {
                let _ = instance.pool.mark_draining(&worker.id);
                let _ = instance.pool.remove(&worker.id);
            }
            *instance.coordinator_handle.lock() = None;

            if let Ok(mut session) = store.find_by_id(&id).await {
                session.state = to_state;
                session.updated_at = now;
                let _ = store.save(&session).await;
            }

            health.untrack(&id);
            let event_type = if to_state == WorkflowState::Completed {
                EventType::WorkflowCompleted
            } else {
                EventType::WorkflowFailed
            };
            let event = ControlPlaneEvent::lifecycle(
                event_type,
                id.clone(),
                snapshot.template_id.clone(),
                snapshot.name.clone(),
                snapshot.state,
                now,
            );
            broker.publish(event).await;
        });
    }

    /// §4.1 `Stop`: requests a coordinator drain, waits up to the grace
    /// period, then kills children; retires every worker; transitions to
    /// `stopped`.
    pub async fn stop(&self, id: &WorkflowId, request: StopRequest) -> Result<(), WorkflowError> {
        let instance = self.instance(id)?;

        let handle = instance.coordinator_handle.lock().take();
        if let Some(handle) = &handle {
            let first = if request.force { SignalKind::Kill } else { SignalKind::Interrupt };
            if let Err(err) = self.spawner.signal(handle, first).await {
                tracing::warn!(workflow_id = %id, %err, "failed to signal coordinator during stop");
            }
            if !request.force {
                match tokio::time::timeout(request.grace_period, self.spawner.wait(handle)).await {
                    Ok(_) => {}
                    Err(_) => {
                        tracing::warn!(workflow_id = %id, "coordinator did not drain within the grace period; killing");
                        if let Err(err) = self.spawner.signal(handle, SignalKind::Kill).await {
                            tracing::warn!(workflow_id = %id, %err, "failed to kill coordinator during stop");
                        }
                    }
                }
            }
        }

        for worker in instance.pool.list() {
            let _ = instance.pool.mark_draining(&worker.id);
            let _ = instance.pool.remove(&worker.id);
        }

        let now = self.now();
        let (snapshot, prior) = {
            let mut descriptor = instance.descriptor.lock();
            let prior = descriptor
                .transition(WorkflowState::Stopped, now)
                .map_err(|_| ConflictError::IllegalState { id: id.clone(), state: descriptor.state.to_string() })?;
            (descriptor.clone(), prior)
        };
        if let Err(err) = self.persist_state(id, WorkflowState::Stopped, now).await {
            instance.descriptor.lock().state = prior;
            return Err(err);
        }

        self.health.untrack(id);
        tracing::info!(workflow_id = %id, reason = %request.reason, force = request.force, "workflow stopped");
        self.publish_lifecycle(EventType::WorkflowStopped, &snapshot).await;
        Ok(())
    }

    /// §4.1 `Pause`/`Resume`.
    pub async fn pause(&self, id: &WorkflowId) -> Result<(), WorkflowError> {
        let instance = self.instance(id)?;
        let now = self.now();
        let (snapshot, prior) = {
            let mut descriptor = instance.descriptor.lock();
            let prior = descriptor
                .transition(WorkflowState::Paused, now)
                .map_err(|_| ConflictError::IllegalState { id: id.clone(), state: descriptor.state.to_string() })?;
            (descriptor.clone(), prior)
        };
        if let Err(err) = self.persist_state(id, WorkflowState::Paused, now).await {
            instance.descriptor.lock().state = prior;
            return Err(err);
        }
        self.publish_lifecycle(EventType::WorkflowPaused, &snapshot).await;
        Ok(())
    }

    pub async fn resume(&self, id: &WorkflowId) -> Result<(), WorkflowError> {
        let instance = self.instance(id)?;
        let now = self.now();
        let (snapshot, prior) = {
            let mut descriptor = instance.descriptor.lock();
            let prior = descriptor
                .transition(WorkflowState::Running, now)
                .map_err(|_| ConflictError::IllegalState { id: id.clone(), state: descriptor.state.to_string() })?;
            (descriptor.clone(), prior)
        };
        if let Err(err) = self.persist_state(id, WorkflowState::Running, now).await {
            instance.descriptor.lock().state = prior;
            return Err(err);
        }
        self.publish_lifecycle(EventType::WorkflowResumed, &snapshot).await;
        Ok(())
    }

    pub fn get(&self, id: &WorkflowId) -> Option<WorkflowDescriptor> {
        self.instances.lock().get(id).map(|i| i.descriptor.lock().clone())
    }

    pub fn list(&self) -> Vec<WorkflowDescriptor> {
        self.instances.lock().values().map(|i| i.descriptor.lock().clone()).collect()
    }

    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.broker.subscribe(filter)
    }

    pub fn unsubscribe(&self, subscription_id: u64) {
        self.broker.unsubscribe(subscription_id);
    }

    pub fn health_status(&self, id: &WorkflowId) -> Option<crate::health_monitor::HealthStatusView> {
        self.health.status(id)
    }
}

/// A handoff-typed process event arrived (§4.4 step 3). Forwards it to the
/// workflow's `CoordinatorDriver` and, if it completes a pending refresh,
/// clears the refresh state. Physical replacement — killing the old
/// coordinator and spawning a new one with a continuation prompt — is not
/// wired yet (see DESIGN.md); this brings the protocol's state machine and
/// timeout to parity with `ReplaceCoordinator`'s existing scope.
fn handle_coordinator_handoff(id: &WorkflowId, instance: &Arc<WorkflowInstance>, event: &perles_core::ProcessEvent) {
    let summary = handoff_summary(event);
    let received = instance.coordinator.lock().receive_handoff(summary);
    if let HandoffReceived::AcceptedForReplacement { summary } = received {
        let mut driver = instance.coordinator.lock();
        let unchanged_id = driver.coordinator_id.clone();
        driver.finish_replacement(unchanged_id);
        tracing::info!(workflow_id = %id, %summary, "coordinator handoff accepted; refresh cycle complete");
    } else {
        tracing::debug!(workflow_id = %id, "unsolicited coordinator handoff message");
    }
}

fn handoff_summary(event: &perles_core::ProcessEvent) -> String {
    event
        .payload
        .as_str()
        .map(str::to_string)
        .or_else(|| event.status.clone())
        .unwrap_or_else(|| "handoff".to_string())
}

/// §4.6 check loop: every `health_check_interval`, walks tracked workflows
/// and turns each `CheckOutcome` into the matching health event and/or a
/// detached recovery dispatch.
fn spawn_health_check_loop<C: Clock>(
    clock: C,
    health: Arc<HealthMonitor<C>>,
    broker: Broker,
    store: SessionStore,
    instances: Instances,
    interval: Duration,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            for (id, outcome) in health.check() {
                let now = clock.utc_now();
                match outcome {
                    CheckOutcome::Healthy => {}
                    CheckOutcome::HeartbeatMissed => {
                        broker.publish(ControlPlaneEvent::health(EventType::HealthHeartbeatMissed, id, now)).await;
                    }
                    CheckOutcome::StuckSuspected => {
                        broker.publish(ControlPlaneEvent::health(EventType::HealthStuckSuspected, id, now)).await;
                    }
                    CheckOutcome::StillStuck => {
                        broker.publish(ControlPlaneEvent::health(EventType::HealthStillStuck, id, now)).await;
                    }
                    CheckOutcome::StillStuckRateLimited => {}
                    CheckOutcome::RecoveryDecision(action) => {
                        let Some(instance) = instances.lock().get(&id).cloned() else { continue };
                        dispatch_recovery(id, action, instance, clock.clone(), health.clone(), broker.clone(), store.clone());
                    }
                }
            }
        }
    });
}

/// §4.6: "invoke the Recovery Executor in a detached task with a 30s
/// timeout." Brackets the whole dispatch — not just the executor call — so
/// a slow store write can't leave a decision half-applied past the bound.
fn dispatch_recovery<C: Clock>(
    id: WorkflowId,
    action: RecoveryAction,
    instance: Arc<WorkflowInstance>,
    clock: C,
    health: Arc<HealthMonitor<C>>,
    broker: Broker,
    store: SessionStore,
) {
    tokio::spawn(async move {
        let started_at = clock.utc_now();
        broker.publish(ControlPlaneEvent::health(EventType::HealthRecoveryStarted, id.clone(), started_at)).await;

        let outcome = tokio::time::timeout(Duration::from_secs(30), async {
            let executor = RecoveryExecutor::new();
            let decision = executor.execute(&action, &instance.coordinator, &instance.pool, clock.utc_now())?;
            apply_recovery_outcome(&id, &decision, &instance, &clock, &health, &store, &broker).await;
            Ok::<(), RecoveryError>(())
        })
        .await;

        let now = clock.utc_now();
        let event_type = match outcome {
            Ok(Ok(())) => EventType::HealthRecoverySucceeded,
            Ok(Err(err)) => {
                tracing::warn!(workflow_id = %id, %err, "recovery action failed");
                EventType::HealthRecoveryFailed
            }
            Err(_) => {
                tracing::warn!(workflow_id = %id, "recovery action timed out");
                EventType::HealthRecoveryFailed
            }
        };
        broker.publish(ControlPlaneEvent::health(event_type, id, now)).await;
    });
}

async fn apply_recovery_outcome<C: Clock>(
    id: &WorkflowId,
    outcome: &RecoveryOutcome,
    instance: &Arc<WorkflowInstance>,
    clock: &C,
    health: &Arc<HealthMonitor<C>>,
    store: &SessionStore,
    broker: &Broker,
) {
    match outcome {
        RecoveryOutcome::Nudged => {}
        RecoveryOutcome::ReplacementRequested => {
            let deadline = match instance.coordinator.lock().refresh_state() {
                RefreshState::AwaitingHandoff { deadline } => Some(*deadline),
                _ => None,
            };
            if let Some(deadline) = deadline {
                spawn_refresh_timeout_watcher(id.clone(), instance.coordinator.clone(), clock.clone(), deadline);
            }
        }
        RecoveryOutcome::Paused => {
            transition_and_persist(id, WorkflowState::Paused, instance, clock, store, broker, EventType::WorkflowPaused)
                .await;
        }
        RecoveryOutcome::Failed { retired_workers } => {
            tracing::warn!(workflow_id = %id, retired_workers, "recovery ladder exhausted; failing workflow");
            transition_and_persist(id, WorkflowState::Failed, instance, clock, store, broker, EventType::WorkflowFailed)
                .await;
            health.untrack(id);
        }
    }
}

/// §4.4 step 5: fires `handle_timeout` at the refresh deadline if no
/// handoff message has arrived by then.
fn spawn_refresh_timeout_watcher<C: Clock>(
    id: WorkflowId,
    coordinator: Arc<parking_lot::Mutex<CoordinatorDriver>>,
    clock: C,
    deadline: DateTime<Utc>,
) {
    tokio::spawn(async move {
        let wait = (deadline - clock.utc_now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;
        if let Some(summary) = coordinator.lock().handle_timeout(clock.utc_now()) {
            tracing::warn!(workflow_id = %id, %summary, "coordinator refresh timed out; using synthetic handoff");
        }
    });
}

/// Applies a state transition, persists it, and publishes the matching
/// lifecycle event — shared by the recovery dispatcher's `Pause`/`Fail`
/// outcomes, which run detached from any `ControlPlane` method.
async fn transition_and_persist<C: Clock>(
    id: &WorkflowId,
    to: WorkflowState,
    instance: &Arc<WorkflowInstance>,
    clock: &C,
    store: &SessionStore,
    broker: &Broker,
    event_type: EventType,
) {
    let now = clock.utc_now();
    let snapshot = {
        let mut descriptor = instance.descriptor.lock();
        if descriptor.state.is_terminal() || descriptor.transition(to, now).is_err() {
            return;
        }
        descriptor.clone()
    };

    if let Ok(mut session) = store.find_by_id(id).await {
        session.state = to;
        session.updated_at = now;
        let _ = store.save(&session).await;
    }

    let event = ControlPlaneEvent::lifecycle(
        event_type,
        id.clone(),
        snapshot.template_id.clone(),
        snapshot.name.clone(),
        snapshot.state,
        now,
    );
    broker.publish(event).await;
}

#[cfg(test)]
#[path = "control_plane_tests.rs"]
mod tests;
