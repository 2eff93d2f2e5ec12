mod cli;
mod config;
mod logging;

use std::path::Path;
use std::process::ExitCode;

use chrono::Timelike;
use clap::Parser;
use engine_logging::{engine_error, engine_info, engine_warn};
use promptcast_core::RunReport;
use promptcast_engine::{
    candidate_list, load_model_list, Components, GradioInvoker, HttpProber, ModelResolver,
    Orchestrator, PngArtifactStore, PromptQueue, RunLock, TelegramChannel, TelegramSettings,
};

use crate::cli::Args;
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine; the environment may already carry the credentials.
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    let local_hour = chrono::Local::now().hour();
    logging::initialize(log_file_for(&args, local_hour), args.verbose);

    match run(&args, local_hour).await {
        Ok(code) => code,
        Err(err) => {
            engine_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Runs outside the publish window leave the filesystem alone, log file included.
fn log_file_for(args: &Args, local_hour: u32) -> Option<&Path> {
    match config::publish_window(args) {
        Ok(Some(window)) if !window.contains(local_hour) => None,
        _ => Some(args.log_file.as_path()),
    }
}

async fn run(args: &Args, local_hour: u32) -> anyhow::Result<ExitCode> {
    if let Some(window) = config::publish_window(args)? {
        if !window.contains(local_hour) {
            engine_info!("Outside publish window {} at hour {}", window, local_hour);
            return Ok(ExitCode::SUCCESS);
        }
    }

    let config = AppConfig::from_args(args, |key| std::env::var(key).ok())?;

    let _lock = if config.lock {
        Some(RunLock::acquire(RunLock::path_for(&config.prompts))?)
    } else {
        None
    };

    let orchestrator = Orchestrator::new(build_components(&config));
    let report = orchestrator.run(config.plan, local_hour).await;
    log_summary(&report);
    Ok(ExitCode::from(exit_status(&report)))
}

fn build_components(config: &AppConfig) -> Components {
    let token = Some(config.credentials.hf_token.clone());
    let preferred = load_model_list(&config.models);

    Components {
        resolver: ModelResolver::new(Box::new(HttpProber::new(
            config.http.clone(),
            config.locator.clone(),
            token.clone(),
        ))),
        candidates: candidate_list(preferred),
        queue: PromptQueue::new(config.prompts.clone()),
        invoker: Box::new(GradioInvoker::new(
            config.http.clone(),
            config.locator.clone(),
            token,
        )),
        params: config.params.clone(),
        store: Box::new(
            PngArtifactStore::new(config.output_dir.clone()).with_prefix_len(config.prefix_len),
        ),
        delivery: Box::new(TelegramChannel::new(
            config.http.clone(),
            TelegramSettings {
                api_url: config.telegram_api_url.clone(),
                bot_token: config.credentials.telegram_bot_token.clone(),
                chat_id: config.credentials.telegram_channel_id.clone(),
            },
        )),
        captions: config.captions.clone(),
    }
}

fn log_summary(report: &RunReport) {
    for job in &report.jobs {
        match &job.failure {
            Some(failure) => engine_warn!(
                "Job {} {:?}: {} failed ({})",
                job.ordinal,
                job.prompt,
                failure.stage,
                failure.reason
            ),
            None => engine_info!("Job {} {:?}: {}", job.ordinal, job.prompt, job.stage),
        }
    }
    engine_info!(
        "Model {}, {} job(s), {} published",
        report.model.as_deref().unwrap_or("none"),
        report.jobs.len(),
        report.committed()
    );
}

/// 0 for clean endings, including job failures already logged; 1 when fatal.
fn exit_status(report: &RunReport) -> u8 {
    match &report.end {
        Some(end) if end.is_fatal() => 1,
        Some(_) => 0,
        None => {
            engine_error!("Run stopped without a recorded end");
            1
        }
    }
}
