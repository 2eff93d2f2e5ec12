use crate::{Disambiguator, Effect, FailureStage, Msg, RunEnd, RunMode, RunState, Stage};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages that do not fit the current stage are ignored. The only effect
/// that removes a prompt from the queue is `CommitRemoval`, and it is emitted
/// solely in response to `Msg::Delivered`.
pub fn update(mut state: RunState, msg: Msg) -> (RunState, Vec<Effect>) {
    if state.is_finished() {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::Start { local_hour } => {
            if state.is_started() {
                return (state, Vec::new());
            }
            if let Some(window) = state.plan().window {
                if !window.contains(local_hour) {
                    return finish(state, RunEnd::OutsideWindow);
                }
            }
            state.begin();
            vec![Effect::ResolveModel]
        }
        Msg::ModelResolved { model } => {
            if !state.is_running() || state.stage() != Stage::Idle {
                return (state, Vec::new());
            }
            state.set_model(model);
            vec![Effect::PeekPrompt]
        }
        Msg::ModelUnavailable { reason } => {
            if !state.is_running() || state.stage() != Stage::Idle {
                return (state, Vec::new());
            }
            return finish(state, RunEnd::NoBackendAvailable { reason });
        }
        Msg::PromptPeeked(head) => {
            if !awaiting_prompt(&state) {
                return (state, Vec::new());
            }
            let Some(prompt) = head else {
                let end = if state.committed_count() == 0 {
                    RunEnd::QueueEmpty
                } else {
                    RunEnd::Completed
                };
                return finish(state, end);
            };
            let Some(model) = state.model().map(ToOwned::to_owned) else {
                return (state, Vec::new());
            };
            state.start_job(prompt.clone());
            vec![Effect::Generate { model, prompt }]
        }
        Msg::QueueUnreadable { reason } => {
            if !awaiting_prompt(&state) {
                return (state, Vec::new());
            }
            return finish(state, RunEnd::QueueUnreadable { reason });
        }
        Msg::Generated { image } => {
            let Some(prompt) = prompt_at(&state, Stage::PromptLoaded) else {
                return (state, Vec::new());
            };
            let disambiguator = match state.plan().mode {
                RunMode::Single => Disambiguator::Timestamp,
                RunMode::Batch { .. } => {
                    Disambiguator::Ordinal(state.current_ordinal().unwrap_or(1))
                }
            };
            state.advance(Stage::Generated);
            vec![Effect::Persist {
                image,
                prompt,
                disambiguator,
            }]
        }
        Msg::Persisted { path } => {
            let Some(prompt) = prompt_at(&state, Stage::Generated) else {
                return (state, Vec::new());
            };
            state.advance(Stage::Persisted);
            state.set_artifact(path.clone());
            vec![Effect::Deliver { path, prompt }]
        }
        Msg::Delivered => {
            let Some(prompt) = prompt_at(&state, Stage::Persisted) else {
                return (state, Vec::new());
            };
            state.advance(Stage::Delivered);
            vec![Effect::CommitRemoval { prompt }]
        }
        Msg::Committed => {
            if prompt_at(&state, Stage::Delivered).is_none() {
                return (state, Vec::new());
            }
            state.advance(Stage::Committed);
            match state.plan().mode {
                RunMode::Single => return finish(state, RunEnd::Completed),
                RunMode::Batch { limit } => {
                    if limit.is_some_and(|limit| state.committed_count() >= limit) {
                        return finish(state, RunEnd::LimitReached);
                    }
                    vec![Effect::PeekPrompt]
                }
            }
        }
        Msg::JobFailed { stage, reason } => {
            let expected = match stage {
                FailureStage::Generate => Stage::PromptLoaded,
                FailureStage::Persist => Stage::Generated,
                FailureStage::Deliver => Stage::Persisted,
                FailureStage::Commit => Stage::Delivered,
            };
            if prompt_at(&state, expected).is_none() {
                return (state, Vec::new());
            }
            let Some(ordinal) = state.fail_job(stage, reason) else {
                return (state, Vec::new());
            };
            return finish(state, RunEnd::JobFailed { ordinal, stage });
        }
    };

    (state, effects)
}

fn finish(mut state: RunState, end: RunEnd) -> (RunState, Vec<Effect>) {
    state.finish(end.clone());
    (state, vec![Effect::Finish(end)])
}

fn awaiting_prompt(state: &RunState) -> bool {
    state.is_running() && matches!(state.stage(), Stage::ModelResolved | Stage::Committed)
}

/// Prompt of the job in flight when it sits at `stage`.
fn prompt_at(state: &RunState, stage: Stage) -> Option<String> {
    if !state.is_running() || state.stage() != stage {
        return None;
    }
    state.current_job().map(|job| job.prompt.clone())
}
