mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use appvisor::{
    BackoffPolicy, Controller, ControllerConfig, ControllerError, HealthState, JitterPolicy,
    MessageType,
};
use common::*;
use serde_json::json;

fn controller(config: ControllerConfig) -> (Arc<FakeApp>, Arc<Recorder>, Arc<Controller<Chat>>) {
    let app = FakeApp::new();
    let recorder = Recorder::new();
    let controller = chat_builder(&app, &recorder, config).build().unwrap();
    (app, recorder, controller)
}

#[tokio::test(flavor = "multi_thread")]
async fn start_launches_and_announces_starting() {
    let (app, recorder, controller) = controller(manual_config());
    assert_eq!(controller.health().await, HealthState::Uninitialised);
    assert!(!controller.is_running());

    controller.start().await.unwrap();
    assert!(controller.is_running());
    assert_eq!(app.launches(), 1);
    assert_eq!(controller.health().await, HealthState::Starting);

    let types: Vec<MessageType> = recorder.all().into_iter().map(|e| e.message_type).collect();
    assert_eq!(types, vec![MessageType::HealthUpdate, MessageType::AppLaunch]);

    let all = recorder.all();
    assert_eq!(all[0].payload["health_state"], "starting");
    assert_eq!(all[1].payload, json!({ "launched": true }));
    assert_eq!(all[1].app, "discord");

    controller.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn double_start_and_double_stop_are_rejected() {
    let (app, _recorder, controller) = controller(manual_config());

    assert_eq!(controller.stop().await, Err(ControllerError::NotRunning));

    controller.start().await.unwrap();
    assert_eq!(controller.start().await, Err(ControllerError::AlreadyRunning));
    assert_eq!(app.launches(), 1);

    controller.stop().await.unwrap();
    assert_eq!(controller.stop().await, Err(ControllerError::NotRunning));
    assert_eq!(app.terminates(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_terminates_and_reports_stopped() {
    let (app, recorder, controller) = controller(manual_config());
    controller.start().await.unwrap();
    recorder.clear();

    controller.stop().await.unwrap();
    assert!(!controller.is_running());
    assert!(!app.running.load(Ordering::SeqCst));
    assert_eq!(controller.health().await, HealthState::Stopped);

    let all = recorder.all();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].message_type, MessageType::AppTerminate);
    assert_eq!(all[0].payload, json!({ "terminated": true }));
    assert_eq!(all[1].message_type, MessageType::HealthUpdate);
    assert_eq!(all[1].payload["health_state"], "stopped");
}

#[tokio::test(flavor = "multi_thread")]
async fn controller_can_start_again_after_stop() {
    let (app, _recorder, controller) = controller(fast_config());

    controller.start().await.unwrap();
    controller.stop().await.unwrap();
    controller.start().await.unwrap();

    assert!(controller.is_running());
    assert_eq!(app.launches(), 2);
    assert_eq!(app.terminates(), 1);

    // The fresh heartbeat keeps running.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while controller.health().await != HealthState::Healthy {
        assert!(tokio::time::Instant::now() < deadline, "heartbeat never ran");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    controller.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn each_critical_signal_causes_exactly_one_restart() {
    let (app, recorder, controller) = controller(manual_config());
    controller.start().await.unwrap();

    for round in 1..=2 {
        app.running.store(false, Ordering::SeqCst);
        let state = controller.run_heartbeat_cycle().await.unwrap();
        assert_eq!(state, HealthState::Error);

        let (probe, running) = (Arc::clone(&app), Arc::clone(&controller));
        eventually("restart finished", move || {
            probe.launches() == round + 1 && running.is_running()
        })
        .await;
        assert_eq!(app.terminates(), round);
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(app.launches(), 3);
    assert_eq!(app.terminates(), 2);
    assert_eq!(app.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.count(MessageType::AppTerminate), 2);
    assert_eq!(recorder.count(MessageType::AppLaunch), 3);
    assert!(controller.is_running());

    controller.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn critical_burst_is_drained_one_restart_at_a_time() {
    let (app, recorder, controller) = controller(manual_config());
    controller.start().await.unwrap();

    // Three Criticals queue up before the supervisor has handled the first.
    app.running.store(false, Ordering::SeqCst);
    for _ in 0..3 {
        let state = controller.run_heartbeat_cycle().await.unwrap();
        assert_eq!(state, HealthState::Error);
    }

    let (probe, running) = (Arc::clone(&app), Arc::clone(&controller));
    eventually("burst drained", move || {
        probe.launches() == 4 && running.is_running()
    })
    .await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(app.launches(), 4);
    assert_eq!(app.terminates(), 3);
    assert_eq!(app.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.count(MessageType::AppTerminate), 3);
    assert!(controller.is_running());
    assert!(app.running.load(Ordering::SeqCst));

    controller.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn restart_is_skipped_when_stopped_deliberately() {
    let (app, _recorder, controller) = controller(ControllerConfig {
        restart_backoff: BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_millis(100),
            factor: 1.0,
            jitter: JitterPolicy::None,
        },
        ..manual_config()
    });
    controller.start().await.unwrap();
    controller.stop().await.unwrap();

    // Stale signal: the app is down and the controller is already stopped.
    controller.run_heartbeat_cycle().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(app.launches(), 1);
    assert_eq!(app.terminates(), 1);
    assert!(!controller.is_running());
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_stops_and_forbids_restart() {
    let (app, _recorder, controller) = controller(manual_config());
    controller.start().await.unwrap();

    controller.shutdown().await;
    assert!(!controller.is_running());
    assert_eq!(controller.health().await, HealthState::Stopped);
    assert_eq!(app.terminates(), 1);

    assert_eq!(controller.start().await, Err(ControllerError::ShutDown));

    controller.shutdown().await;
    assert_eq!(app.terminates(), 1);
    assert_eq!(app.launches(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_cuts_the_restart_backoff_short() {
    let (app, _recorder, controller) = controller(ControllerConfig {
        restart_backoff: BackoffPolicy {
            first: Duration::from_secs(30),
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::None,
        },
        ..manual_config()
    });
    controller.start().await.unwrap();

    app.running.store(false, Ordering::SeqCst);
    controller.run_heartbeat_cycle().await.unwrap();

    let probe = Arc::clone(&app);
    eventually("supervisor stopped the app", move || probe.terminates() == 1).await;

    tokio::time::timeout(Duration::from_secs(1), controller.shutdown())
        .await
        .expect("shutdown does not wait for the backoff");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(app.launches(), 1);
    assert!(!controller.is_running());
}

#[tokio::test(flavor = "multi_thread")]
async fn pending_restart_never_outlives_shutdown() {
    let (app, _recorder, controller) = controller(manual_config());
    controller.start().await.unwrap();

    app.running.store(false, Ordering::SeqCst);
    for _ in 0..3 {
        controller.run_heartbeat_cycle().await.unwrap();
    }
    controller.shutdown().await;
    let launches = app.launches();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(app.launches(), launches, "no launch after shutdown returned");
    assert!(!controller.is_running());
    assert_eq!(controller.start().await, Err(ControllerError::ShutDown));
}
