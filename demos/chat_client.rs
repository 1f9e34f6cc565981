//! Supervises a simulated chat client until Ctrl-C.
//!
//! ```text
//! cargo run --example chat_client --features logging
//! APPVISOR_HEARTBEAT_INTERVAL_MS=1000 cargo run --example chat_client --features logging
//! ```
//!
//! Every 7s the simulated client drops out of its voice channel; the activity
//! handler notices and ends the activity. Every 20s it crashes outright and
//! the supervisor restarts it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use appvisor::{
    AppKind, AppResponse, Controller, ControllerConfig, HandlerContext, HandlerFn, HealthCheck,
    LogWriter, LoggerConfig, ManagedApp, Params, Subscribe, SubscriberSet, Tag, TaskContext,
    TaskFailure, logger_init, validators, wait_for_shutdown_signal,
};
use async_trait::async_trait;
use serde_json::json;

#[derive(Default)]
struct ChatClient {
    running: AtomicBool,
    logged_in: AtomicBool,
    in_voice: AtomicBool,
    sessions: AtomicU32,
}

impl ChatClient {
    async fn servers(&self) -> Result<Vec<&'static str>, String> {
        if !self.logged_in.load(Ordering::SeqCst) {
            return Err("not logged in".into());
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok(vec!["rust-lang", "tokio", "serde"])
    }

    async fn join_voice(&self, channel: &str) -> Result<(), String> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(format!("cannot join '{channel}': client is not running"));
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        self.in_voice.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ManagedApp for ChatClient {
    fn name(&self) -> &str {
        "chat"
    }

    async fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn is_interactable(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn is_locatable(&self) -> bool {
        true
    }

    async fn launch(&self) -> bool {
        tokio::time::sleep(Duration::from_millis(500)).await;
        self.running.store(true, Ordering::SeqCst);
        self.logged_in.store(true, Ordering::SeqCst);
        self.sessions.fetch_add(1, Ordering::SeqCst);
        true
    }

    async fn terminate(&self) -> bool {
        self.running.store(false, Ordering::SeqCst);
        self.logged_in.store(false, Ordering::SeqCst);
        self.in_voice.store(false, Ordering::SeqCst);
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum ChatTask {
    LearnServers,
    JoinVoice,
}

impl Tag for ChatTask {
    const VARIANTS: &'static [Self] = &[ChatTask::LearnServers, ChatTask::JoinVoice];

    fn as_str(&self) -> &'static str {
        match self {
            ChatTask::LearnServers => "learn_servers",
            ChatTask::JoinVoice => "join_voice",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum ChatActivity {
    InVoiceChannel,
}

impl Tag for ChatActivity {
    const VARIANTS: &'static [Self] = &[ChatActivity::InVoiceChannel];

    fn as_str(&self) -> &'static str {
        "in_voice_channel"
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum ChatCheck {
    IsLoggedIn,
    InVoiceChannel,
}

impl Tag for ChatCheck {
    const VARIANTS: &'static [Self] = &[ChatCheck::IsLoggedIn, ChatCheck::InVoiceChannel];

    fn as_str(&self) -> &'static str {
        match self {
            ChatCheck::IsLoggedIn => "is_logged_in",
            ChatCheck::InVoiceChannel => "in_voice_channel",
        }
    }
}

struct Chat;

impl AppKind for Chat {
    type App = ChatClient;
    type TaskType = ChatTask;
    type ActivityType = ChatActivity;
    type CheckType = ChatCheck;
}

async fn learn_servers(ctx: TaskContext<Chat>, _params: Params) -> appvisor::ExecResult {
    let servers = ctx.app.servers().await.map_err(TaskFailure::execution)?;
    Ok(Some(AppResponse::for_task(
        ChatTask::LearnServers,
        json!({ "servers": servers }),
    )))
}

async fn join_voice(ctx: TaskContext<Chat>, params: Params) -> appvisor::ExecResult {
    let channel = params
        .get("channel")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_owned();

    ctx.app
        .join_voice(&channel)
        .await
        .map_err(TaskFailure::execution)?;
    ctx.activity
        .start(ChatActivity::InVoiceChannel, ctx.task_id.to_string(), params)
        .await
        .map_err(TaskFailure::execution)?;
    Ok(None)
}

async fn leave_failed_call(ctx: HandlerContext<Chat>, failed: Vec<ChatCheck>) {
    tracing::warn!(?failed, "voice connection lost; ending activity");
    let _ = ctx.activity.end("health").await;
}

async fn relogin(ctx: HandlerContext<Chat>, _failed: Vec<ChatCheck>) {
    tracing::warn!("session expired; logging back in");
    ctx.app.logged_in.store(true, Ordering::SeqCst);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger_init(&LoggerConfig::default())?;

    let client = Arc::new(ChatClient::default());
    let subscribers = Arc::new(SubscriberSet::new(vec![
        Arc::new(LogWriter::new()) as Arc<dyn Subscribe>
    ]));

    let logged_in = Arc::clone(&client);
    let in_voice = Arc::clone(&client);
    let voice_checks = vec![HealthCheck::new(ChatCheck::InVoiceChannel, move || {
        let client = Arc::clone(&in_voice);
        async move { client.in_voice.load(Ordering::SeqCst) }
    })];

    let controller = Controller::<Chat>::builder(Arc::clone(&client), subscribers.clone())
        .config(ControllerConfig::from_env()?)
        .validator(ChatTask::LearnServers, validators::no_params)
        .executor(ChatTask::LearnServers, learn_servers)
        .validator(ChatTask::JoinVoice, validators::required_keys(&["channel"]))
        .executor(ChatTask::JoinVoice, join_voice)
        .core_check(ChatCheck::IsLoggedIn, move || {
            let client = Arc::clone(&logged_in);
            async move { client.logged_in.load(Ordering::SeqCst) }
        })
        .activity_checks(ChatActivity::InVoiceChannel, voice_checks)
        .on_core_failure(HandlerFn::new(relogin))
        .on_activity_failure(HandlerFn::new(leave_failed_call))
        .build()?;

    controller.start().await?;
    controller
        .submit_task(ChatTask::LearnServers, Params::new())
        .await?;

    let mut voice = Params::new();
    voice.insert("channel".into(), json!("general"));
    controller.submit_task(ChatTask::JoinVoice, voice.clone()).await?;

    // Chaos: drop voice every 7s, crash every 20s, rejoin after each drop.
    let chaos = {
        let client = Arc::clone(&client);
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            let mut tick = 0u64;
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;
                tick += 1;
                if tick % 20 == 0 {
                    tracing::warn!("simulating a crash");
                    client.running.store(false, Ordering::SeqCst);
                } else if tick % 7 == 0 {
                    client.in_voice.store(false, Ordering::SeqCst);
                } else if tick % 7 == 3 && controller.activity().await.is_none() {
                    let _ = controller.submit_task(ChatTask::JoinVoice, voice.clone()).await;
                }
            }
        })
    };

    wait_for_shutdown_signal().await?;
    chaos.abort();
    let _ = chaos.await;
    controller.shutdown().await;
    tracing::info!(
        sessions = client.sessions.load(Ordering::SeqCst),
        "chat client supervised"
    );

    drop(controller);
    if let Ok(subscribers) = Arc::try_unwrap(subscribers) {
        subscribers.shutdown().await;
    }
    Ok(())
}
