//! Startup configuration: CLI flags plus credentials from the environment.

use std::path::PathBuf;
use std::time::Duration;

use promptcast_core::{PublishWindow, RunMode, RunPlan, WindowError};
use promptcast_engine::{CaptionStyle, GenerationParams, HttpSettings, SpaceLocator};
use thiserror::Error;
use url::Url;

use crate::cli::Args;

pub const HF_TOKEN: &str = "HF_TOKEN";
pub const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const TELEGRAM_CHANNEL_ID: &str = "TELEGRAM_CHANNEL_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing credential: set {0} in the environment or .env")]
    MissingCredential(&'static str),
    #[error("invalid --{flag} {value:?}: {reason}")]
    InvalidUrl {
        flag: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid publish window: {0}")]
    Window(#[from] WindowError),
}

#[derive(Clone)]
pub struct Credentials {
    pub hf_token: String,
    pub telegram_bot_token: String,
    pub telegram_channel_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("hf_token", &"<redacted>")
            .field("telegram_bot_token", &"<redacted>")
            .field("telegram_channel_id", &self.telegram_channel_id)
            .finish()
    }
}

impl Credentials {
    /// Reads every credential through `lookup`; blank values count as missing.
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |key: &'static str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingCredential(key))
        };
        Ok(Self {
            hf_token: require(HF_TOKEN)?,
            telegram_bot_token: require(TELEGRAM_BOT_TOKEN)?,
            telegram_channel_id: require(TELEGRAM_CHANNEL_ID)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub prompts: PathBuf,
    pub models: PathBuf,
    pub output_dir: PathBuf,
    pub prefix_len: usize,
    pub params: GenerationParams,
    pub plan: RunPlan,
    pub captions: CaptionStyle,
    pub http: HttpSettings,
    pub locator: SpaceLocator,
    pub telegram_api_url: String,
    pub lock: bool,
    pub credentials: Credentials,
}

impl AppConfig {
    pub fn from_args(
        args: &Args,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let credentials = Credentials::load(lookup)?;

        let window = publish_window(args)?;
        let mode = if args.batch {
            RunMode::Batch { limit: args.limit }
        } else {
            RunMode::Single
        };

        let captions = if args.no_caption {
            CaptionStyle::disabled()
        } else {
            match &args.caption_prefix {
                Some(prefix) => CaptionStyle {
                    enabled: true,
                    prefix: prefix.clone(),
                },
                None => CaptionStyle::default(),
            }
        };

        let locator = match &args.hub_base_url {
            Some(base) => SpaceLocator::mirror(base).map_err(|err| ConfigError::InvalidUrl {
                flag: "hub-base-url",
                value: base.clone(),
                reason: err.to_string(),
            })?,
            None => SpaceLocator::HuggingFace,
        };
        check_http_url(&args.telegram_api_url).map_err(|reason| ConfigError::InvalidUrl {
            flag: "telegram-api-url",
            value: args.telegram_api_url.clone(),
            reason,
        })?;

        Ok(Self {
            prompts: args.prompts.clone(),
            models: args.models.clone(),
            output_dir: args.output_dir.clone(),
            prefix_len: args.prefix_len,
            params: GenerationParams {
                seed: args.seed,
                width: args.width,
                height: args.height,
                guidance_scale: args.guidance_scale,
                num_inference_steps: args.steps,
            },
            plan: RunPlan { window, mode },
            captions,
            http: HttpSettings {
                connect_timeout: Duration::from_secs(args.connect_timeout_secs),
                request_timeout: Duration::from_secs(args.request_timeout_secs),
                generation_timeout: Duration::from_secs(args.generation_timeout_secs),
                ..HttpSettings::default()
            },
            locator,
            telegram_api_url: args.telegram_api_url.clone(),
            lock: !args.no_lock,
            credentials,
        })
    }
}

/// The configured hour gate, if both bounds were given.
pub fn publish_window(args: &Args) -> Result<Option<PublishWindow>, ConfigError> {
    match (args.window_start, args.window_end) {
        (Some(start), Some(end)) => Ok(Some(PublishWindow::new(start, end)?)),
        _ => Ok(None),
    }
}

fn check_http_url(value: &str) -> Result<(), String> {
    let parsed = Url::parse(value).map_err(|err| err.to_string())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {:?}", parsed.scheme()));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err("missing host".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use clap::Parser;
    use promptcast_core::{PublishWindow, RunMode};
    use promptcast_engine::SpaceLocator;

    use super::{AppConfig, ConfigError, HF_TOKEN, TELEGRAM_BOT_TOKEN, TELEGRAM_CHANNEL_ID};
    use crate::cli::Args;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn full_env() -> impl Fn(&str) -> Option<String> {
        env(&[
            (HF_TOKEN, "hf_abc"),
            (TELEGRAM_BOT_TOKEN, "123:xyz"),
            (TELEGRAM_CHANNEL_ID, "@gallery"),
        ])
    }

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("promptcast").chain(extra.iter().copied())).unwrap()
    }

    #[test]
    fn missing_or_blank_credentials_are_rejected() {
        let err = AppConfig::from_args(&args(&[]), env(&[(HF_TOKEN, "hf_abc")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(TELEGRAM_BOT_TOKEN)));

        let blank = env(&[
            (HF_TOKEN, "  "),
            (TELEGRAM_BOT_TOKEN, "123:xyz"),
            (TELEGRAM_CHANNEL_ID, "@gallery"),
        ]);
        let err = AppConfig::from_args(&args(&[]), blank).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(HF_TOKEN)));
    }

    #[test]
    fn defaults_build_a_single_ungated_run() {
        let config = AppConfig::from_args(&args(&[]), full_env()).unwrap();
        assert_eq!(config.plan.mode, RunMode::Single);
        assert!(config.plan.window.is_none());
        assert_eq!(config.locator, SpaceLocator::HuggingFace);
        assert!(config.lock);
        assert!(config.captions.enabled);
        assert_eq!(config.credentials.telegram_channel_id, "@gallery");
    }

    #[test]
    fn flags_map_onto_plan_and_captions() {
        let config = AppConfig::from_args(
            &args(&[
                "--window-start",
                "22",
                "--window-end",
                "2",
                "--batch",
                "--limit",
                "5",
                "--no-caption",
                "--no-lock",
                "--hub-base-url",
                "http://localhost:7860",
            ]),
            full_env(),
        )
        .unwrap();
        assert_eq!(config.plan.window, Some(PublishWindow::new(22, 2).unwrap()));
        assert_eq!(config.plan.mode, RunMode::Batch { limit: Some(5) });
        assert!(!config.captions.enabled);
        assert!(!config.lock);
        assert!(matches!(config.locator, SpaceLocator::Mirror(_)));
    }

    #[test]
    fn bad_urls_are_config_errors() {
        let err = AppConfig::from_args(&args(&["--hub-base-url", "not a url"]), full_env())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { flag: "hub-base-url", .. }));

        for bad in ["ftp://x", "http://bad host", "https://"] {
            let err = AppConfig::from_args(&args(&["--telegram-api-url", bad]), full_env())
                .unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidUrl { flag: "telegram-api-url", .. }),
                "{bad} accepted"
            );
        }

        let config = AppConfig::from_args(
            &args(&["--telegram-api-url", "http://127.0.0.1:8081"]),
            full_env(),
        )
        .unwrap();
        assert_eq!(config.telegram_api_url, "http://127.0.0.1:8081");
    }

    #[test]
    fn credentials_are_redacted_in_debug() {
        let config = AppConfig::from_args(&args(&[]), full_env()).unwrap();
        let printed = format!("{:?}", config.credentials);
        assert!(!printed.contains("hf_abc"));
        assert!(!printed.contains("123:xyz"));
    }
}
