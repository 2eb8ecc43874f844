use crate::{AppState, Effect, Msg, RunNotice, RunState, StopReason, SubmitOutcome};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartRequested { prompts, looping } => match state.run_state() {
            RunState::Idle if prompts.is_empty() => vec![Effect::Report(RunNotice::StartRejected {
                reason: "prompt queue is empty".to_string(),
            })],
            RunState::Idle => {
                let count = prompts.len();
                state.start_run(prompts, looping);
                let mut effects = vec![Effect::Report(RunNotice::Started {
                    prompts: count,
                    looping,
                })];
                effects.extend(process_next(&mut state));
                effects
            }
            RunState::Running | RunState::Stopping => {
                vec![Effect::Report(RunNotice::StartRejected {
                    reason: "a run is already active".to_string(),
                })]
            }
        },
        Msg::StopRequested => {
            if state.is_running() {
                stop(&mut state, StopReason::UserRequested)
            } else {
                Vec::new()
            }
        }
        Msg::LoopingChanged(looping) => {
            state.set_looping(looping);
            Vec::new()
        }
        Msg::SubmissionFinished {
            submission_id,
            outcome,
        } => {
            if !state.finish_submission(submission_id) {
                return (state, Vec::new());
            }
            match state.run_state() {
                RunState::Stopping => {
                    let reason = state
                        .last_stop()
                        .cloned()
                        .unwrap_or(StopReason::UserRequested);
                    state.enter_idle(reason.clone());
                    vec![Effect::Report(RunNotice::Stopped { reason })]
                }
                RunState::Idle => Vec::new(),
                RunState::Running => match outcome {
                    SubmitOutcome::Submitted => {
                        state.begin_generating(submission_id);
                        vec![
                            Effect::Report(RunNotice::Submitted { submission_id }),
                            Effect::ArmTimeout { submission_id },
                        ]
                    }
                    SubmitOutcome::Failed(kind) => stop(&mut state, kind.into()),
                    SubmitOutcome::Cancelled => stop(&mut state, StopReason::UserRequested),
                },
            }
        }
        Msg::Completion(cue) => {
            if !(state.is_running() && state.is_generating()) {
                return (state, Vec::new());
            }
            if !state.latch(cue) {
                return (state, Vec::new());
            }
            let mut effects = vec![Effect::ClearTimeout];
            if let Some(submission_id) = state.end_generating() {
                state.note_completed();
                effects.push(Effect::Report(RunNotice::Completed { submission_id }));
            }
            effects.extend(process_next(&mut state));
            effects
        }
        Msg::TimeoutFired { submission_id } => {
            if !(state.is_generating() && state.current() == Some(submission_id)) {
                return (state, Vec::new());
            }
            state.end_generating();
            state.note_stalled();
            let mut effects = vec![
                Effect::ClearTimeout,
                Effect::Report(RunNotice::Stalled { submission_id }),
            ];
            effects.extend(process_next(&mut state));
            effects
        }
    };

    (state, effects)
}

/// Advance-or-stop decision shared by completion and stall handling.
fn process_next(state: &mut AppState) -> Vec<Effect> {
    let mut effects = Vec::new();
    if state.queue().is_drained() {
        if !state.is_looping() {
            return stop(state, StopReason::Drained);
        }
        state.queue_mut().refill();
        state.note_refill();
        effects.push(Effect::Report(RunNotice::Refilled {
            prompts: state.queue().remaining(),
        }));
    }
    match state.queue_mut().dequeue() {
        Some(prompt) => {
            let submission_id = state.begin_submission();
            effects.push(Effect::Submit {
                submission_id,
                prompt,
            });
        }
        None => effects.extend(stop(state, StopReason::Drained)),
    }
    effects
}

fn stop(state: &mut AppState, reason: StopReason) -> Vec<Effect> {
    state.end_generating();
    let mut effects = vec![Effect::ClearTimeout, Effect::CancelPastes];
    if state.in_flight().is_some() {
        state.enter_stopping(reason);
    } else {
        state.enter_idle(reason.clone());
        effects.push(Effect::Report(RunNotice::Stopped { reason }));
    }
    effects
}
