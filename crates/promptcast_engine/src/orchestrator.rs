use std::collections::VecDeque;

use engine_logging::{
    clear_job_ordinal, engine_error, engine_info, engine_status, engine_trace, engine_warn,
    set_job_ordinal,
};
use promptcast_core::{update, Effect, FailureStage, Msg, RunPlan, RunReport, RunState};

use crate::artifact::ArtifactStore;
use crate::delivery::{CaptionStyle, DeliveryChannel};
use crate::invoke::GenerationInvoker;
use crate::params::GenerationParams;
use crate::queue::PromptQueue;
use crate::resolve::{Candidate, ModelResolver};

/// Everything a run needs, built once at startup.
pub struct Components {
    pub resolver: ModelResolver,
    pub candidates: Vec<Candidate>,
    pub queue: PromptQueue,
    pub invoker: Box<dyn GenerationInvoker>,
    pub params: GenerationParams,
    pub store: Box<dyn ArtifactStore>,
    pub delivery: Box<dyn DeliveryChannel>,
    pub captions: CaptionStyle,
}

/// Executes the effects requested by the core state machine, one at a time,
/// feeding each result back as a message until the run finishes.
pub struct Orchestrator {
    components: Components,
}

impl Orchestrator {
    pub fn new(components: Components) -> Self {
        Self { components }
    }

    pub async fn run(&self, plan: RunPlan, local_hour: u32) -> RunReport {
        let mut state = RunState::new(plan);
        let mut inbox = VecDeque::from([Msg::Start { local_hour }]);

        while let Some(msg) = inbox.pop_front() {
            engine_trace!("update at {}: {:?}", state.stage(), msg);
            let (next, effects) = update(state, msg);
            state = next;
            match state.current_ordinal() {
                Some(ordinal) => set_job_ordinal(ordinal),
                None => clear_job_ordinal(),
            }
            for effect in effects {
                if let Some(reply) = self.execute(effect).await {
                    inbox.push_back(reply);
                }
            }
        }

        clear_job_ordinal();
        state.report()
    }

    async fn execute(&self, effect: Effect) -> Option<Msg> {
        let c = &self.components;
        match effect {
            Effect::ResolveModel => Some(match c.resolver.resolve(&c.candidates).await {
                Ok(model) => {
                    engine_info!("Using model {}", model);
                    Msg::ModelResolved { model }
                }
                Err(err) => {
                    engine_error!("{}", err);
                    Msg::ModelUnavailable {
                        reason: err.to_string(),
                    }
                }
            }),
            Effect::PeekPrompt => Some(match c.queue.peek_first() {
                Ok(head) => {
                    if head.is_none() {
                        engine_info!("No prompts left in {:?}", c.queue.path());
                    }
                    Msg::PromptPeeked(head)
                }
                Err(err) => {
                    engine_error!("{}", err);
                    Msg::QueueUnreadable {
                        reason: err.to_string(),
                    }
                }
            }),
            Effect::Generate { model, prompt } => {
                engine_status!("generating", "{:?} with {}", prompt, model);
                Some(match c.invoker.invoke(&model, &prompt, &c.params).await {
                    Ok(image) => Msg::Generated { image },
                    Err(err) => job_failed(FailureStage::Generate, err),
                })
            }
            Effect::Persist {
                image,
                prompt,
                disambiguator,
            } => {
                engine_status!("saving", "{:?}", prompt);
                Some(match c.store.persist(&image, &prompt, disambiguator) {
                    Ok(path) => {
                        engine_info!("Image saved: {:?}", path);
                        Msg::Persisted { path }
                    }
                    Err(err) => job_failed(FailureStage::Persist, err),
                })
            }
            Effect::Deliver { path, prompt } => {
                engine_status!("delivering", "{:?}", path);
                let caption = c.captions.caption_for(&prompt);
                Some(match c.delivery.deliver(&path, caption.as_deref()).await {
                    Ok(()) => {
                        engine_info!("Delivered {:?}", path);
                        Msg::Delivered
                    }
                    Err(err) => {
                        engine_warn!("Artifact {:?} kept on disk but not delivered", path);
                        job_failed(FailureStage::Deliver, err)
                    }
                })
            }
            Effect::CommitRemoval { prompt } => {
                engine_status!("committing", "{:?}", prompt);
                Some(match c.queue.commit_remove_first() {
                    Ok(Some(removed)) => {
                        if removed != prompt {
                            engine_warn!(
                                "Queue head changed during the run: removed {:?}, delivered {:?}",
                                removed,
                                prompt
                            );
                        }
                        Msg::Committed
                    }
                    Ok(None) => {
                        engine_warn!("Queue was already empty when committing {:?}", prompt);
                        Msg::Committed
                    }
                    Err(err) => {
                        engine_error!(
                            "Prompt {:?} delivered but still queued, may be sent again: {}",
                            prompt,
                            err
                        );
                        Msg::JobFailed {
                            stage: FailureStage::Commit,
                            reason: err.to_string(),
                        }
                    }
                })
            }
            Effect::Finish(end) => {
                if end.is_fatal() {
                    engine_error!("Run ended: {}", end);
                } else {
                    engine_info!("Run ended: {}", end);
                }
                None
            }
        }
    }
}

fn job_failed(stage: FailureStage, err: impl std::fmt::Display) -> Msg {
    engine_error!("{} failed: {}", stage, err);
    Msg::JobFailed {
        stage,
        reason: err.to_string(),
    }
}
