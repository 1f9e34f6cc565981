//! Immutable dispatch tables built once by the
//! [`ControllerBuilder`](crate::ControllerBuilder).

use std::collections::HashMap;

use crate::app::{AppKind, Tag};
use crate::error::ControllerError;
use crate::health::HealthCheck;
use crate::tasks::{ExecutorRef, Params, Validator};

use super::handler::HandlerRef;

pub(crate) struct Registry<K: AppKind> {
    pub(crate) validators: HashMap<K::TaskType, Validator>,
    pub(crate) executors: HashMap<K::TaskType, ExecutorRef<K>>,
    pub(crate) core_checks: Vec<HealthCheck<K::CheckType>>,
    pub(crate) activity_checks: HashMap<K::ActivityType, Vec<HealthCheck<K::CheckType>>>,
    pub(crate) on_core_failure: HandlerRef<K>,
    pub(crate) on_activity_failure: HandlerRef<K>,
}

impl<K: AppKind> Registry<K> {
    /// Runs the validator of `task_type`. A missing validator rejects.
    pub(crate) fn validate(
        &self,
        task_type: K::TaskType,
        params: &Params,
    ) -> Result<(), ControllerError> {
        let reject = |reason: String| ControllerError::Validation {
            task_type: task_type.as_str(),
            reason,
        };
        let validator = self
            .validators
            .get(&task_type)
            .ok_or_else(|| reject("no validator registered".to_string()))?;
        validator(params).map_err(reject)
    }

    pub(crate) fn executor(&self, task_type: K::TaskType) -> Option<ExecutorRef<K>> {
        self.executors.get(&task_type).cloned()
    }

    pub(crate) fn activity_checks(
        &self,
        activity_type: K::ActivityType,
    ) -> Result<&[HealthCheck<K::CheckType>], ControllerError> {
        self.activity_checks
            .get(&activity_type)
            .map(Vec::as_slice)
            .ok_or_else(|| ControllerError::Configuration {
                reason: format!(
                    "no health checks registered for activity '{}'",
                    activity_type.as_str()
                ),
            })
    }

    /// Declared activity types without an activity-check entry.
    pub(crate) fn uncovered_activities(&self) -> Vec<&'static str> {
        K::ActivityType::VARIANTS
            .iter()
            .filter(|a| !self.activity_checks.contains_key(*a))
            .map(Tag::as_str)
            .collect()
    }
}
