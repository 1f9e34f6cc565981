mod common;

use std::sync::Arc;

use appvisor::{Controller, ControllerError, HealthState, Params, TaskContext, validators};
use common::*;

fn assert_misconfigured(result: Result<Arc<Controller<Chat>>, ControllerError>, needle: &str) {
    match result {
        Err(ControllerError::Configuration { reason }) => {
            assert!(reason.contains(needle), "unexpected reason: {reason}");
        }
        Err(other) => panic!("expected a configuration error, got {other}"),
        Ok(_) => panic!("expected a configuration error, got a controller"),
    }
}

#[test]
fn every_activity_type_needs_a_check_entry() {
    let app = FakeApp::new();
    let recorder = Recorder::new();

    let result = Controller::<Chat>::builder(app, recorder)
        .activity_checks(ChatActivity::InVoiceChannel, Vec::new())
        .build();
    assert_misconfigured(result, "screen_sharing");
}

#[test]
fn duplicate_registrations_are_rejected() {
    let app = FakeApp::new();
    let recorder = Recorder::new();

    let result = chat_builder(&app, &recorder, manual_config())
        .validator(ChatTask::Echo, validators::any)
        .validator(ChatTask::Echo, validators::no_params)
        .build();
    assert_misconfigured(result, "validator 'echo'");

    let result = chat_builder(&app, &recorder, manual_config())
        .executor(ChatTask::Echo, |_ctx: TaskContext<Chat>, _params| async move { Ok(None) })
        .executor(ChatTask::Echo, |_ctx: TaskContext<Chat>, _params| async move { Ok(None) })
        .build();
    assert_misconfigured(result, "executor 'echo'");

    let result = chat_builder(&app, &recorder, manual_config())
        .activity_checks(ChatActivity::ScreenSharing, Vec::new())
        .build();
    assert_misconfigured(result, "activity checks 'screen_sharing'");
}

#[tokio::test]
async fn built_controller_is_idle() {
    let app = FakeApp::new();
    let recorder = Recorder::new();

    let controller = chat_builder(&app, &recorder, manual_config())
        .validator(ChatTask::LearnServers, validators::no_params)
        .build()
        .unwrap();

    assert_eq!(controller.name(), "discord");
    assert!(!controller.is_running());
    assert_eq!(controller.health().await, HealthState::Uninitialised);
    assert!(controller.activity().await.is_none());
    assert!(controller.tasks().await.is_empty());
    assert_eq!(app.launches(), 0);
    assert!(recorder.all().is_empty());

    controller
        .submit_task(ChatTask::LearnServers, Params::new())
        .await
        .unwrap();
    assert_eq!(controller.tasks().await.len(), 1);
}
