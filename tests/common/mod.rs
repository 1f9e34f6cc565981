#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use appvisor::{
    AppKind, BackoffPolicy, Broadcaster, ControllerConfig, Envelope, ManagedApp, MessageType, Tag,
};
use async_trait::async_trait;

/// Chat client driver whose probes are flipped by the test.
pub struct FakeApp {
    pub running: AtomicBool,
    pub interactable: AtomicBool,
    pub locatable: AtomicBool,
    pub logged_in: AtomicBool,
    pub in_voice: AtomicBool,
    pub launches: AtomicUsize,
    pub terminates: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeApp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            running: AtomicBool::new(false),
            interactable: AtomicBool::new(true),
            locatable: AtomicBool::new(true),
            logged_in: AtomicBool::new(true),
            in_voice: AtomicBool::new(true),
            launches: AtomicUsize::new(0),
            terminates: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn terminates(&self) -> usize {
        self.terminates.load(Ordering::SeqCst)
    }

    async fn lifecycle_op(&self, running_after: bool) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.running.store(running_after, Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ManagedApp for FakeApp {
    fn name(&self) -> &str {
        "discord"
    }

    async fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn is_interactable(&self) -> bool {
        self.interactable.load(Ordering::SeqCst)
    }

    async fn is_locatable(&self) -> bool {
        self.locatable.load(Ordering::SeqCst)
    }

    async fn launch(&self) -> bool {
        self.launches.fetch_add(1, Ordering::SeqCst);
        self.lifecycle_op(true).await;
        true
    }

    async fn terminate(&self) -> bool {
        self.terminates.fetch_add(1, Ordering::SeqCst);
        self.lifecycle_op(false).await;
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChatTask {
    LearnServers,
    JoinVoice,
    Echo,
    Unrouted,
}

impl Tag for ChatTask {
    const VARIANTS: &'static [Self] = &[
        ChatTask::LearnServers,
        ChatTask::JoinVoice,
        ChatTask::Echo,
        ChatTask::Unrouted,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ChatTask::LearnServers => "learn_servers",
            ChatTask::JoinVoice => "join_voice",
            ChatTask::Echo => "echo",
            ChatTask::Unrouted => "unrouted",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChatActivity {
    InVoiceChannel,
    ScreenSharing,
}

impl Tag for ChatActivity {
    const VARIANTS: &'static [Self] = &[ChatActivity::InVoiceChannel, ChatActivity::ScreenSharing];

    fn as_str(&self) -> &'static str {
        match self {
            ChatActivity::InVoiceChannel => "in_voice_channel",
            ChatActivity::ScreenSharing => "screen_sharing",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChatCheck {
    IsLoggedIn,
    InVoiceChannel,
    ScreenSharing,
}

impl Tag for ChatCheck {
    const VARIANTS: &'static [Self] = &[
        ChatCheck::IsLoggedIn,
        ChatCheck::InVoiceChannel,
        ChatCheck::ScreenSharing,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ChatCheck::IsLoggedIn => "is_logged_in",
            ChatCheck::InVoiceChannel => "in_voice_channel",
            ChatCheck::ScreenSharing => "screen_sharing",
        }
    }
}

pub struct Chat;

impl AppKind for Chat {
    type App = FakeApp;
    type TaskType = ChatTask;
    type ActivityType = ChatActivity;
    type CheckType = ChatCheck;
}

/// Broadcaster that keeps every envelope.
#[derive(Default)]
pub struct Recorder {
    seen: Mutex<Vec<Envelope>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn all(&self) -> Vec<Envelope> {
        self.seen.lock().unwrap().clone()
    }

    pub fn of(&self, message_type: MessageType) -> Vec<Envelope> {
        self.all()
            .into_iter()
            .filter(|e| e.message_type == message_type)
            .collect()
    }

    pub fn count(&self, message_type: MessageType) -> usize {
        self.of(message_type).len()
    }

    /// Message types concerning task `id`, in emission order.
    pub fn task_trail(&self, id: &str) -> Vec<MessageType> {
        self.all()
            .into_iter()
            .filter(|e| e.task_id() == Some(id))
            .map(|e| e.message_type)
            .collect()
    }

    pub fn clear(&self) {
        self.seen.lock().unwrap().clear();
    }
}

#[async_trait]
impl Broadcaster for Recorder {
    async fn broadcast(&self, message: Envelope) {
        self.seen.lock().unwrap().push(message);
    }
}

/// Heartbeat every 20ms, instant restarts.
pub fn fast_config() -> ControllerConfig {
    ControllerConfig {
        heartbeat_interval: Duration::from_millis(20),
        stop_grace: Duration::from_secs(1),
        failure_capacity: 8,
        restart_backoff: BackoffPolicy::immediate(),
    }
}

/// No automatic heartbeat within a test's lifetime; cycles are driven by hand.
pub fn manual_config() -> ControllerConfig {
    ControllerConfig {
        heartbeat_interval: Duration::from_secs(3600),
        ..fast_config()
    }
}

/// Polls `cond` every 5ms for up to 3s.
pub async fn eventually<F>(what: &str, mut cond: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while !cond() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for: {what}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Builder with every activity type covered: voice checks read `in_voice`,
/// screen sharing has no checks.
pub fn chat_builder(
    app: &Arc<FakeApp>,
    recorder: &Arc<Recorder>,
    config: ControllerConfig,
) -> appvisor::ControllerBuilder<Chat> {
    let probe_app = Arc::clone(app);
    let voice = appvisor::HealthCheck::new(ChatCheck::InVoiceChannel, move || {
        let app = Arc::clone(&probe_app);
        async move { app.in_voice.load(Ordering::SeqCst) }
    });

    appvisor::Controller::<Chat>::builder(Arc::clone(app), recorder.clone())
        .config(config)
        .activity_checks(ChatActivity::InVoiceChannel, vec![voice])
        .activity_checks(ChatActivity::ScreenSharing, Vec::new())
}
