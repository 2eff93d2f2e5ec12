use std::sync::Once;

use promptcast_core::{update, Msg, RunPlan, RunState, Stage};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

#[test]
fn out_of_order_messages_are_ignored() {
    init_logging();
    let state = RunState::new(RunPlan::default());
    let (state, effects) = update(state, Msg::Delivered);
    assert!(effects.is_empty());
    assert!(!state.is_started());

    let (state, _) = update(state, Msg::Start { local_hour: 12 });
    let (state, effects) = update(state, Msg::PromptPeeked(Some("early".into())));
    assert!(effects.is_empty());
    assert_eq!(state.stage(), Stage::Idle);
    assert!(state.current_job().is_none());
}

#[test]
fn finished_run_ignores_everything() {
    init_logging();
    let state = RunState::new(RunPlan::default());
    let (state, _) = update(state, Msg::Start { local_hour: 0 });
    let (state, _) = update(
        state,
        Msg::ModelUnavailable {
            reason: "all down".into(),
        },
    );
    assert!(state.is_finished());

    let (state, effects) = update(state, Msg::ModelResolved { model: "m".into() });
    assert!(effects.is_empty());
    assert_eq!(state.model(), None);
}
