//! Promptcast core: pure run state machine and schedule gate.
mod effect;
mod msg;
mod state;
mod update;
mod window;

pub use effect::{Disambiguator, Effect};
pub use msg::{ImageHandle, Msg};
pub use state::{
    FailureStage, JobFailure, JobOrdinal, JobRecord, RunEnd, RunMode, RunPlan, RunReport,
    RunState, Stage,
};
pub use update::update;
pub use window::{PublishWindow, WindowError};
