use std::path::PathBuf;

use clap::Parser;

/// Publish AI-generated images for queued prompts to a Telegram channel.
///
/// Credentials come from the environment (or a `.env` file):
/// `HF_TOKEN`, `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHANNEL_ID`.
#[derive(Parser, Debug, Clone)]
#[command(name = "promptcast", version, about)]
pub struct Args {
    /// Prompt queue, one prompt per line
    #[arg(long, default_value = "input.txt")]
    pub prompts: PathBuf,

    /// Preferred models, one `owner/name` per line
    #[arg(long, default_value = "MODEL.txt")]
    pub models: PathBuf,

    /// Directory for generated images
    #[arg(long, default_value = "images")]
    pub output_dir: PathBuf,

    /// Log file, appended to on every run
    #[arg(long, default_value = "app.log")]
    pub log_file: PathBuf,

    /// Prompt characters used in image filenames
    #[arg(long, default_value_t = promptcast_engine::DEFAULT_PREFIX_LEN)]
    pub prefix_len: usize,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    #[arg(long, default_value_t = 1024)]
    pub width: u32,

    #[arg(long, default_value_t = 1024)]
    pub height: u32,

    #[arg(long, default_value_t = 3.5)]
    pub guidance_scale: f32,

    /// Number of inference steps
    #[arg(long, default_value_t = 28)]
    pub steps: u32,

    /// First local hour of the publish window (inclusive)
    #[arg(long, requires = "window_end", value_parser = clap::value_parser!(u32).range(0..=23))]
    pub window_start: Option<u32>,

    /// Local hour the publish window closes (exclusive)
    #[arg(long, requires = "window_start", value_parser = clap::value_parser!(u32).range(0..=23))]
    pub window_end: Option<u32>,

    /// Keep processing prompts until the queue is empty
    #[arg(long)]
    pub batch: bool,

    /// Stop a batch after this many published prompts
    #[arg(long, requires = "batch")]
    pub limit: Option<usize>,

    /// Text placed before the prompt in captions
    #[arg(long)]
    pub caption_prefix: Option<String>,

    /// Send images without a caption
    #[arg(long, conflicts_with = "caption_prefix")]
    pub no_caption: bool,

    #[arg(long, default_value_t = 300)]
    pub generation_timeout_secs: u64,

    #[arg(long, default_value_t = 60)]
    pub request_timeout_secs: u64,

    #[arg(long, default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Serve backends from `<url>/<space-slug>` instead of `*.hf.space`
    #[arg(long, env = "PROMPTCAST_HUB_BASE_URL")]
    pub hub_base_url: Option<String>,

    #[arg(long, env = "TELEGRAM_API_URL", default_value = promptcast_engine::TELEGRAM_API_URL)]
    pub telegram_api_url: String,

    /// Skip the `<prompts>.lock` run lock
    #[arg(long)]
    pub no_lock: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Args;

    #[test]
    fn defaults_match_documented_values() {
        let args = Args::try_parse_from(["promptcast"]).unwrap();
        assert_eq!(args.prompts.to_str(), Some("input.txt"));
        assert_eq!(args.models.to_str(), Some("MODEL.txt"));
        assert_eq!(args.output_dir.to_str(), Some("images"));
        assert_eq!(args.prefix_len, 30);
        assert_eq!(args.steps, 28);
        assert!(!args.batch);
        assert!(args.window_start.is_none());
    }

    #[test]
    fn window_bounds_come_in_pairs() {
        assert!(Args::try_parse_from(["promptcast", "--window-start", "19"]).is_err());
        assert!(Args::try_parse_from([
            "promptcast",
            "--window-start",
            "19",
            "--window-end",
            "24"
        ])
        .is_err());
        let args =
            Args::try_parse_from(["promptcast", "--window-start", "19", "--window-end", "20"])
                .unwrap();
        assert_eq!((args.window_start, args.window_end), (Some(19), Some(20)));
    }

    #[test]
    fn limit_needs_batch() {
        assert!(Args::try_parse_from(["promptcast", "--limit", "3"]).is_err());
        let args = Args::try_parse_from(["promptcast", "--batch", "--limit", "3"]).unwrap();
        assert_eq!(args.limit, Some(3));
    }
}
