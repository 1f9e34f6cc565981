//! Fail-fast [`ControllerBuilder`]: registrations in, validated [`Controller`] out.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use crate::app::{AppKind, Tag};
use crate::broadcast::Broadcaster;
use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::health::HealthCheck;
use crate::tasks::{ExecResult, ExecutorFn, ExecutorRef, Params, TaskContext, Validator};

use super::core::Controller;
use super::handler::{FailureHandler, HandlerRef, LogFailures};
use super::registry::Registry;

/// Collects registrations and builds a [`Controller`].
///
/// # Fail-fast
/// `build()` refuses to produce a controller when:
/// - a task type, or an activity type's check list, was registered twice;
/// - a declared activity type has no activity-check entry (an empty list is a valid entry).
///
/// Task types without a validator or executor are allowed: the first is
/// rejected at submission, the second fails as `Unroutable` when dequeued.
pub struct ControllerBuilder<K: AppKind> {
    app: Arc<K::App>,
    broadcaster: Arc<dyn Broadcaster>,
    config: ControllerConfig,
    validators: HashMap<K::TaskType, Validator>,
    executors: HashMap<K::TaskType, ExecutorRef<K>>,
    core_checks: Vec<HealthCheck<K::CheckType>>,
    activity_checks: HashMap<K::ActivityType, Vec<HealthCheck<K::CheckType>>>,
    on_core_failure: Option<HandlerRef<K>>,
    on_activity_failure: Option<HandlerRef<K>>,
    duplicates: Vec<String>,
}

impl<K: AppKind> ControllerBuilder<K> {
    pub(crate) fn new(app: Arc<K::App>, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            app,
            broadcaster,
            config: ControllerConfig::default(),
            validators: HashMap::new(),
            executors: HashMap::new(),
            core_checks: Vec::new(),
            activity_checks: HashMap::new(),
            on_core_failure: None,
            on_activity_failure: None,
            duplicates: Vec::new(),
        }
    }

    /// Replaces the default [`ControllerConfig`].
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers the submission validator of `task_type`.
    pub fn validator<F>(mut self, task_type: K::TaskType, f: F) -> Self
    where
        F: Fn(&Params) -> Result<(), String> + Send + Sync + 'static,
    {
        let slot = format!("validator '{}'", task_type.as_str());
        let validator: Validator = Arc::new(f);
        insert_once(&mut self.validators, &mut self.duplicates, task_type, validator, slot);
        self
    }

    /// Registers a closure executor for `task_type`.
    pub fn executor<F, Fut>(self, task_type: K::TaskType, f: F) -> Self
    where
        F: Fn(TaskContext<K>, Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ExecResult> + Send + 'static,
    {
        self.executor_ref(task_type, ExecutorFn::arc(f))
    }

    /// Registers a shared executor for `task_type`.
    pub fn executor_ref(mut self, task_type: K::TaskType, executor: ExecutorRef<K>) -> Self {
        let slot = format!("executor '{}'", task_type.as_str());
        insert_once(&mut self.executors, &mut self.duplicates, task_type, executor, slot);
        self
    }

    /// Adds an application-core check, evaluated on every heartbeat.
    pub fn core_check<F, Fut>(mut self, check_type: K::CheckType, probe: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.core_checks.push(HealthCheck::new(check_type, probe));
        self
    }

    /// Sets the checks evaluated while an activity of `activity_type` is current.
    pub fn activity_checks(
        mut self,
        activity_type: K::ActivityType,
        checks: Vec<HealthCheck<K::CheckType>>,
    ) -> Self {
        let slot = format!("activity checks '{}'", activity_type.as_str());
        insert_once(&mut self.activity_checks, &mut self.duplicates, activity_type, checks, slot);
        self
    }

    /// Handler for application-core failures. Defaults to a warning log.
    pub fn on_core_failure(mut self, handler: impl FailureHandler<K>) -> Self {
        let handler: HandlerRef<K> = Arc::new(handler);
        self.on_core_failure = Some(handler);
        self
    }

    /// Handler for activity failures. Defaults to a warning log.
    pub fn on_activity_failure(mut self, handler: impl FailureHandler<K>) -> Self {
        let handler: HandlerRef<K> = Arc::new(handler);
        self.on_activity_failure = Some(handler);
        self
    }

    /// Validates the registrations and builds the controller (not started).
    pub fn build(self) -> Result<Arc<Controller<K>>, ControllerError> {
        if !self.duplicates.is_empty() {
            return Err(ControllerError::Configuration {
                reason: format!("registered more than once: {}", self.duplicates.join(", ")),
            });
        }

        let registry = Registry {
            validators: self.validators,
            executors: self.executors,
            core_checks: self.core_checks,
            activity_checks: self.activity_checks,
            on_core_failure: self
                .on_core_failure
                .unwrap_or_else(|| log_failures("core")),
            on_activity_failure: self
                .on_activity_failure
                .unwrap_or_else(|| log_failures("activity")),
        };

        let uncovered = registry.uncovered_activities();
        if !uncovered.is_empty() {
            return Err(ControllerError::Configuration {
                reason: format!("no health checks registered for activities: {}", uncovered.join(", ")),
            });
        }

        Ok(Controller::new_internal(
            self.app,
            self.broadcaster,
            self.config,
            registry,
        ))
    }
}

fn log_failures<K: AppKind>(bucket: &'static str) -> HandlerRef<K> {
    Arc::new(LogFailures { bucket })
}

fn insert_once<T, V>(
    table: &mut HashMap<T, V>,
    duplicates: &mut Vec<String>,
    key: T,
    value: V,
    slot: String,
) where
    T: Eq + Hash,
{
    if table.insert(key, value).is_some() {
        duplicates.push(slot);
    }
}
