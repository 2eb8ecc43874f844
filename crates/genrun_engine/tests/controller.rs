use std::sync::{Arc, Once};
use std::time::Duration;

use genrun_core::{RunNotice, StopReason, SubmissionId};
use genrun_engine::{
    Attachment, CaptureOutcome, ClipboardEvent, Command, ControllerHandle, HeuristicAdapter,
    HostCall, Page, RunController, RunEvent, RunSettings, SimulatedPage,
};
use pretty_assertions::assert_eq;
use tokio::time::{sleep, timeout, Instant};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(genrun_logging::initialize_for_tests);
}

fn spawn_controller(
    sim: &SimulatedPage,
    settings: RunSettings,
    persistence: bool,
) -> ControllerHandle {
    init_logging();
    let page = Page::new(Arc::new(sim.clone()), Arc::new(HeuristicAdapter::default()));
    let (controller, handle) = RunController::new(settings, page, persistence);
    tokio::spawn(controller.run());
    handle
}

fn start(prompts: &[&str], looping: bool) -> Command {
    Command::Start {
        prompts: prompts.iter().map(|p| p.to_string()).collect(),
        looping,
    }
}

async fn next_notice(handle: &mut ControllerHandle) -> RunNotice {
    loop {
        let event = timeout(Duration::from_secs(3600), handle.next_event())
            .await
            .expect("controller went quiet")
            .expect("controller exited");
        if let RunEvent::Notice(notice) = event {
            return notice;
        }
    }
}

async fn notices_until_stopped(handle: &mut ControllerHandle) -> Vec<RunNotice> {
    let mut notices = Vec::new();
    loop {
        let notice = next_notice(handle).await;
        let stopped = matches!(notice, RunNotice::Stopped { .. });
        notices.push(notice);
        if stopped {
            return notices;
        }
    }
}

fn id(n: u64) -> SubmissionId {
    SubmissionId(n)
}

#[tokio::test(start_paused = true)]
async fn two_prompts_run_to_completion_and_stop() {
    let sim = SimulatedPage::demo(Duration::from_secs(2));
    let mut handle = spawn_controller(&sim, RunSettings::default(), false);

    assert!(handle.send(start(&["a", "b"], false)));
    let notices = notices_until_stopped(&mut handle).await;

    assert_eq!(
        notices,
        vec![
            RunNotice::Started {
                prompts: 2,
                looping: false
            },
            RunNotice::Submitted { submission_id: id(1) },
            RunNotice::Completed { submission_id: id(1) },
            RunNotice::Submitted { submission_id: id(2) },
            RunNotice::Completed { submission_id: id(2) },
            RunNotice::Stopped {
                reason: StopReason::Drained
            },
        ]
    );
    assert_eq!(sim.clicks(), 2);
    let written: Vec<String> = sim
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            HostCall::NativeSet { value, .. } => Some(value),
            _ => None,
        })
        .collect();
    assert_eq!(written, vec!["a", "b"]);

    // Overlay watcher decorated both rendered tiles.
    sleep(Duration::from_millis(10)).await;
    let overlays = sim
        .calls()
        .iter()
        .filter(|call| matches!(call, HostCall::OverlayAttached(_)))
        .count();
    assert_eq!(overlays, 2);
}

#[tokio::test(start_paused = true)]
async fn looping_single_prompt_repeats_until_loop_is_turned_off() {
    let sim = SimulatedPage::demo(Duration::from_secs(1));
    let mut handle = spawn_controller(&sim, RunSettings::default(), false);

    handle.send(start(&["x"], true));
    let mut completed = 0;
    while completed < 3 {
        if let RunNotice::Completed { .. } = next_notice(&mut handle).await {
            completed += 1;
        }
    }
    handle.send(Command::SetLooping(false));
    let rest = notices_until_stopped(&mut handle).await;

    // The refill that followed the third completion was already decided.
    assert_eq!(
        rest,
        vec![
            RunNotice::Refilled { prompts: 1 },
            RunNotice::Submitted { submission_id: id(4) },
            RunNotice::Completed { submission_id: id(4) },
            RunNotice::Stopped {
                reason: StopReason::Drained
            },
        ]
    );
    assert_eq!(sim.clicks(), 4);
    assert_eq!(sim.completions(), 4);
}

#[tokio::test(start_paused = true)]
async fn missing_completion_counts_as_stall_and_advances() {
    let sim = SimulatedPage::demo(Duration::from_secs(1));
    sim.set_auto_complete(None);
    let settings = RunSettings {
        generation_timeout: Duration::from_secs(10),
        ..RunSettings::default()
    };
    let mut handle = spawn_controller(&sim, settings, false);
    let started = Instant::now();

    handle.send(start(&["a", "b"], false));
    let notices = notices_until_stopped(&mut handle).await;

    assert_eq!(
        notices,
        vec![
            RunNotice::Started {
                prompts: 2,
                looping: false
            },
            RunNotice::Submitted { submission_id: id(1) },
            RunNotice::Stalled { submission_id: id(1) },
            RunNotice::Submitted { submission_id: id(2) },
            RunNotice::Stalled { submission_id: id(2) },
            RunNotice::Stopped {
                reason: StopReason::Drained
            },
        ]
    );
    assert!(started.elapsed() >= Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn missing_prompt_field_stops_the_run() {
    let sim = SimulatedPage::new();
    sim.add_element(r#"<button aria-label="Generate">Generate</button>"#);
    let mut handle = spawn_controller(&sim, RunSettings::default(), false);

    handle.send(start(&["a", "b"], false));
    let notices = notices_until_stopped(&mut handle).await;

    assert_eq!(
        notices,
        vec![
            RunNotice::Started {
                prompts: 2,
                looping: false
            },
            RunNotice::Stopped {
                reason: StopReason::PromptFieldMissing
            },
        ]
    );
    assert_eq!(sim.clicks(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_submit_control_stops_after_the_wait_budget() {
    let sim = SimulatedPage::new();
    let field = sim.add_element(r#"<textarea placeholder="Describe it"></textarea>"#);
    let settings = RunSettings::default();
    let budget = settings.submit_wait_budget;
    let mut handle = spawn_controller(&sim, settings, false);
    let started = Instant::now();

    handle.send(start(&["a"], false));
    let notices = notices_until_stopped(&mut handle).await;

    assert_eq!(
        notices,
        vec![
            RunNotice::Started {
                prompts: 1,
                looping: false
            },
            RunNotice::Stopped {
                reason: StopReason::SubmitControlMissing
            },
        ]
    );
    assert!(started.elapsed() >= budget);
    assert_eq!(sim.clicks(), 0);
    assert_eq!(sim.value(field).as_deref(), Some("a"));
}

#[tokio::test(start_paused = true)]
async fn detached_prompt_field_stops_with_host_failure() {
    let sim = SimulatedPage::new();
    let field = sim.add_element(r#"<textarea placeholder="Describe it"></textarea>"#);
    sim.add_element(r#"<button aria-label="Generate">Generate</button>"#);
    sim.set_auto_complete(Some(Duration::from_secs(1)));
    let mut handle = spawn_controller(&sim, RunSettings::default(), false);

    handle.send(start(&["a", "b"], false));
    assert!(matches!(next_notice(&mut handle).await, RunNotice::Started { .. }));
    sleep(Duration::from_millis(150)).await;
    sim.remove(field);

    let message = match next_notice(&mut handle).await {
        RunNotice::Stopped {
            reason: StopReason::HostFailure(message),
        } => message,
        other => panic!("expected a host failure stop, got {other:?}"),
    };
    assert!(message.contains("no longer attached"), "{message}");
    assert_eq!(sim.clicks(), 0);
}

#[tokio::test(start_paused = true)]
async fn submission_tag_is_cleared_when_the_run_stops() {
    let sim = SimulatedPage::demo(Duration::from_secs(1));
    let mut handle = spawn_controller(&sim, RunSettings::default(), false);

    handle.send(start(&["a"], false));
    assert!(matches!(next_notice(&mut handle).await, RunNotice::Started { .. }));
    assert_eq!(
        next_notice(&mut handle).await,
        RunNotice::Submitted { submission_id: id(1) }
    );
    assert_eq!(genrun_logging::submission_tag(), Some(1));

    let rest = notices_until_stopped(&mut handle).await;
    assert_eq!(
        rest.last(),
        Some(&RunNotice::Stopped {
            reason: StopReason::Drained
        })
    );
    assert_eq!(genrun_logging::submission_tag(), None);
}

#[tokio::test(start_paused = true)]
async fn prompt_is_prepended_when_paste_replaces_the_text() {
    let sim = SimulatedPage::demo(Duration::from_secs(1));
    sim.set_replace_value_on_paste(Some("[image]"));
    let mut handle = spawn_controller(&sim, RunSettings::default(), true);
    handle
        .attachments()
        .append(Attachment::new("ref.png", "image/png", vec![1u8, 2, 3]));

    handle.send(start(&["a cat"], false));
    let notices = notices_until_stopped(&mut handle).await;

    assert_eq!(notices.len(), 4);
    assert_eq!(sim.pasted(), vec!["ref.png"]);
    let last_written = sim.calls().into_iter().rev().find_map(|call| match call {
        HostCall::NativeSet { value, .. } => Some(value),
        _ => None,
    });
    assert_eq!(last_written.as_deref(), Some("a cat [image]"));
}

#[tokio::test(start_paused = true)]
async fn stop_during_attachment_paste_cancels_the_sequence() {
    let sim = SimulatedPage::demo(Duration::from_secs(1));
    let mut handle = spawn_controller(&sim, RunSettings::default(), true);
    for name in ["a.png", "b.png", "c.png"] {
        handle
            .attachments()
            .append(Attachment::new(name, "image/png", name.as_bytes().to_vec()));
    }

    handle.send(start(&["a"], false));
    assert_eq!(
        next_notice(&mut handle).await,
        RunNotice::Started {
            prompts: 1,
            looping: false
        }
    );
    sleep(Duration::from_secs(1)).await;
    handle.send(Command::Stop);

    assert_eq!(
        next_notice(&mut handle).await,
        RunNotice::Stopped {
            reason: StopReason::UserRequested
        }
    );
    assert_eq!(sim.pasted(), vec!["a.png"]);
    assert_eq!(sim.clicks(), 0);
    assert!(!handle.attachments().is_busy());
}

#[tokio::test(start_paused = true)]
async fn second_start_while_running_is_rejected() {
    let sim = SimulatedPage::demo(Duration::from_secs(1));
    let mut handle = spawn_controller(&sim, RunSettings::default(), false);

    handle.send(start(&["a"], false));
    handle.send(start(&["b"], false));

    assert!(matches!(next_notice(&mut handle).await, RunNotice::Started { .. }));
    assert!(matches!(
        next_notice(&mut handle).await,
        RunNotice::StartRejected { .. }
    ));
    let rest = notices_until_stopped(&mut handle).await;
    assert_eq!(
        rest.last(),
        Some(&RunNotice::Stopped {
            reason: StopReason::Drained
        })
    );
}

#[tokio::test(start_paused = true)]
async fn clipboard_commands_report_their_outcome() {
    let sim = SimulatedPage::demo(Duration::from_secs(1));
    let mut handle = spawn_controller(&sim, RunSettings::default(), true);

    handle.send(Command::Capture(ClipboardEvent {
        files: vec![Attachment::new("ref.png", "image/png", vec![9u8])],
        placeholder_text: None,
    }));
    assert_eq!(
        handle.next_event().await,
        Some(RunEvent::Captured(Ok(CaptureOutcome::Stored { index: 0, len: 1 })))
    );

    handle.send(Command::PasteOne);
    assert_eq!(handle.next_event().await, Some(RunEvent::PasteFinished(Ok(1))));
    assert_eq!(sim.pasted(), vec!["ref.png"]);

    handle.send(Command::ClearAttachments);
    assert_eq!(handle.next_event().await, Some(RunEvent::AttachmentsCleared));
    assert!(handle.attachments().is_empty());

    handle.send(Command::Shutdown);
    assert_eq!(handle.next_event().await, None);
}
