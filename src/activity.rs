//! # Activities
//!
//! An [`Activity`] is a long-running engagement of the application (sitting
//! in a voice channel, sharing a screen) that widens the heartbeat with the
//! checks registered for its type. At most one activity is current per
//! controller; executors and failure handlers reach the slot through an
//! [`ActivityHandle`].
//!
//! ## Rules
//! - `start` while an activity is current fails with `ActivityInProgress`.
//! - `end` with no current activity fails with `NoActivity`.
//! - `start` emits `activity_start`, `end` emits `activity_end`; both after the slot is updated.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::app::{AppKind, Tag};
use crate::broadcast::{MessageType, Notifier};
use crate::error::ControllerError;
use crate::tasks::Params;

/// A current or finished activity.
#[derive(Clone, Debug, PartialEq)]
pub struct Activity<A> {
    activity_type: A,
    initiator: String,
    terminator: Option<String>,
    start_time: OffsetDateTime,
    end_time: Option<OffsetDateTime>,
    metadata: Params,
}

impl<A: Tag> Activity<A> {
    pub fn new(activity_type: A, initiator: impl Into<String>, metadata: Params) -> Self {
        Self {
            activity_type,
            initiator: initiator.into(),
            terminator: None,
            start_time: OffsetDateTime::now_utc(),
            end_time: None,
            metadata,
        }
    }

    pub fn activity_type(&self) -> A {
        self.activity_type
    }

    /// Task id or actor name that started the activity.
    pub fn initiator(&self) -> &str {
        &self.initiator
    }

    pub fn terminator(&self) -> Option<&str> {
        self.terminator.as_deref()
    }

    pub fn start_time(&self) -> OffsetDateTime {
        self.start_time
    }

    pub fn end_time(&self) -> Option<OffsetDateTime> {
        self.end_time
    }

    pub fn metadata(&self) -> &Params {
        &self.metadata
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }

    fn finish(&mut self, terminator: String) {
        self.terminator = Some(terminator);
        self.end_time = Some(OffsetDateTime::now_utc());
    }

    pub fn view(&self) -> ActivityView {
        ActivityView {
            activity_type: self.activity_type.as_str().to_string(),
            initiator: self.initiator.clone(),
            terminator: self.terminator.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            metadata: self.metadata.clone(),
        }
    }
}

/// Wire projection of an [`Activity`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityView {
    pub activity_type: String,
    pub initiator: String,
    pub terminator: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    pub metadata: Params,
}

/// Shared access to a controller's activity slot.
pub struct ActivityHandle<K: AppKind> {
    slot: Arc<RwLock<Option<Activity<K::ActivityType>>>>,
    notifier: Notifier,
}

impl<K: AppKind> Clone for ActivityHandle<K> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            notifier: self.notifier.clone(),
        }
    }
}

impl<K: AppKind> ActivityHandle<K> {
    pub(crate) fn new(notifier: Notifier) -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
            notifier,
        }
    }

    /// Snapshot of the current activity.
    pub async fn current(&self) -> Option<Activity<K::ActivityType>> {
        self.slot.read().await.clone()
    }

    /// Makes a new activity current and emits `activity_start`.
    pub async fn start(
        &self,
        activity_type: K::ActivityType,
        initiator: impl Into<String>,
        metadata: Params,
    ) -> Result<(), ControllerError> {
        let view = {
            let mut slot = self.slot.write().await;
            if let Some(current) = slot.as_ref() {
                return Err(ControllerError::ActivityInProgress {
                    current: current.activity_type.as_str(),
                });
            }
            let activity = Activity::new(activity_type, initiator, metadata);
            let view = activity.view();
            *slot = Some(activity);
            view
        };

        tracing::info!(activity = %view.activity_type, initiator = %view.initiator, "activity started");
        self.notifier.send(MessageType::ActivityStart, &view).await;
        Ok(())
    }

    /// Finishes the current activity, clears the slot and emits `activity_end`.
    ///
    /// Returns the finished activity.
    pub async fn end(
        &self,
        terminator: impl Into<String>,
    ) -> Result<Activity<K::ActivityType>, ControllerError> {
        let ended = {
            let mut slot = self.slot.write().await;
            let mut activity = slot.take().ok_or(ControllerError::NoActivity)?;
            activity.finish(terminator.into());
            activity
        };

        tracing::info!(
            activity = ended.activity_type.as_str(),
            terminator = ended.terminator().unwrap_or_default(),
            "activity ended"
        );
        self.notifier.send(MessageType::ActivityEnd, &ended.view()).await;
        Ok(ended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ManagedApp;
    use crate::broadcast::{Broadcaster, Envelope};
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Mutex;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Act {
        Voice,
        Screen,
    }

    impl Tag for Act {
        const VARIANTS: &'static [Self] = &[Act::Voice, Act::Screen];
        fn as_str(&self) -> &'static str {
            match self {
                Act::Voice => "in_voice_channel",
                Act::Screen => "screen_sharing",
            }
        }
    }

    struct Nothing;

    #[async_trait]
    impl ManagedApp for Nothing {
        fn name(&self) -> &str {
            "nothing"
        }
        async fn is_running(&self) -> bool {
            true
        }
        async fn is_interactable(&self) -> bool {
            true
        }
        async fn is_locatable(&self) -> bool {
            true
        }
        async fn launch(&self) -> bool {
            true
        }
        async fn terminate(&self) -> bool {
            true
        }
    }

    struct Kind;

    impl AppKind for Kind {
        type App = Nothing;
        type TaskType = Act;
        type ActivityType = Act;
        type CheckType = Act;
    }

    #[derive(Default)]
    struct Sink(Mutex<Vec<Envelope>>);

    #[async_trait]
    impl Broadcaster for Sink {
        async fn broadcast(&self, message: Envelope) {
            self.0.lock().await.push(message);
        }
    }

    fn handle() -> (ActivityHandle<Kind>, Arc<Sink>) {
        let sink = Arc::new(Sink::default());
        let handle = ActivityHandle::new(Notifier::new("nothing", sink.clone()));
        (handle, sink)
    }

    #[tokio::test]
    async fn test_start_then_end_round_trip() {
        let (handle, sink) = handle();
        let meta = json!({"channel": "general"}).as_object().cloned().unwrap();

        handle.start(Act::Voice, "task-1", meta).await.unwrap();
        let current = handle.current().await.unwrap();
        assert_eq!(current.activity_type(), Act::Voice);
        assert_eq!(current.initiator(), "task-1");
        assert!(!current.is_finished());

        let ended = handle.end("task-2").await.unwrap();
        assert_eq!(ended.terminator(), Some("task-2"));
        assert!(ended.is_finished());
        assert!(handle.current().await.is_none());

        let sent = sink.0.lock().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].message_type, MessageType::ActivityStart);
        assert_eq!(sent[0].payload["metadata"]["channel"], "general");
        assert_eq!(sent[1].message_type, MessageType::ActivityEnd);
        assert_eq!(sent[1].payload["terminator"], "task-2");
        assert!(sent[1].payload["end_time"].is_string());
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let (handle, sink) = handle();
        handle.start(Act::Voice, "a", Params::new()).await.unwrap();

        let err = handle.start(Act::Screen, "b", Params::new()).await.unwrap_err();
        assert_eq!(
            err,
            ControllerError::ActivityInProgress {
                current: "in_voice_channel"
            }
        );
        assert_eq!(handle.current().await.unwrap().activity_type(), Act::Voice);
        assert_eq!(sink.0.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_end_without_activity_is_rejected() {
        let (handle, sink) = handle();
        assert_eq!(handle.end("x").await.unwrap_err(), ControllerError::NoActivity);
        assert!(sink.0.lock().await.is_empty());
    }
}
