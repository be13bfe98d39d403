//! DeploySlack command-line notifier.
//!
//! Meant to be called from the last step of a deployment recipe (or from its
//! failure hook) to post the outcome to a Slack incoming webhook. Also
//! provides subcommands for previewing the payload and generating /
//! validating configuration files.

mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use deployslack_core::config::AppConfig;
use deployslack_core::notify::{DeploymentOptions, Notifier};

/// Config file picked up from the working directory when `--config` is not
/// given.
const DEFAULT_CONFIG: &str = "deployslack.toml";

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// DeploySlack command-line notifier.
#[derive(Parser, Debug)]
#[command(
    name = "deployslack",
    version,
    about = "Post deployment results to a Slack incoming webhook"
)]
struct Cli {
    /// Path to the TOML configuration file [default: ./deployslack.toml if present].
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Post the deployment notification.
    Send {
        #[command(flatten)]
        message: MessageArgs,

        /// Webhook URL, overriding the config file.
        #[arg(long)]
        webhook_url: Option<String>,
    },

    /// Print the JSON body that `send` would post, without sending it.
    Preview {
        #[command(flatten)]
        message: MessageArgs,
    },

    /// Generate a sample configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./deployslack.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

/// What the message says.
#[derive(Args, Debug)]
struct MessageArgs {
    /// Report a failed deployment (default: successful).
    #[arg(long)]
    failed: bool,

    /// Task that failed, shown in the failure message.
    #[arg(long)]
    task: Option<String>,

    /// Deployment field as KEY=VALUE, overriding the config file. Keys:
    /// host, release, user, branch, php_version, github_url, success.
    #[arg(
        short = 'o',
        long = "option",
        value_name = "KEY=VALUE",
        value_parser = parse_key_val
    )]
    options: Vec<(String, String)>,

    /// Channel, overriding the config file. Only posted when
    /// `include_channel` is set in the config or `--include-channel` is given.
    #[arg(long)]
    channel: Option<String>,

    /// Add the channel as a top-level key in the posted body.
    #[arg(long)]
    include_channel: bool,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style::error(&format!("Error: {:#}", e)));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Send {
            message,
            webhook_url,
        } => cmd_send(config_path, &message, webhook_url).await,
        Commands::Preview { message } => cmd_preview(config_path, &message),
        Commands::Init { output } => cmd_init(&output),
        Commands::Validate => cmd_validate(config_path),
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// Load the config file. Without `--config`, `./deployslack.toml` is used if
/// it exists and an empty config otherwise.
fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => {
            AppConfig::load_from_file(path).context("failed to load configuration file")?
        }
        None if Path::new(DEFAULT_CONFIG).exists() => AppConfig::load_from_file(DEFAULT_CONFIG)
            .context("failed to load configuration file")?,
        None => {
            debug!("no configuration file, using command-line values only");
            AppConfig::default()
        }
    };
    config
        .resolve_env_vars()
        .context("failed to resolve environment variables")?;
    Ok(config)
}

/// Overlay command-line message arguments onto the loaded config.
fn apply_overrides(config: &mut AppConfig, message: &MessageArgs) -> Result<()> {
    let overrides = DeploymentOptions::from_pairs(
        message
            .options
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str())),
    )
    .context("invalid --option")?;
    config.deployment.merge(overrides);

    if let Some(ref channel) = message.channel {
        config.slack.channel = channel.clone();
    }
    if message.include_channel {
        config.slack.include_channel = true;
    }
    Ok(())
}

/// The config `send` posts with: file, environment, then command line. An
/// explicit `--webhook-url` beats both `webhook_url` and `webhook_url_env`.
fn send_config(
    config_path: Option<&Path>,
    message: &MessageArgs,
    webhook_url: Option<String>,
) -> Result<AppConfig> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, message)?;
    if webhook_url.is_some() {
        config.slack.webhook_url = webhook_url;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

async fn cmd_send(
    config_path: Option<&Path>,
    message: &MessageArgs,
    webhook_url: Option<String>,
) -> Result<()> {
    let config = send_config(config_path, message, webhook_url)?;

    let success = !message.failed;
    let notifier = Notifier::new(config).context("failed to create Slack client")?;
    notifier
        .notify(success, message.task.as_deref())
        .await
        .context("failed to send Slack notification")?;

    println!(
        "{}",
        style::success(&format!(
            "Slack notified: deployment {}",
            style::outcome(success)
        ))
    );
    Ok(())
}

fn cmd_preview(config_path: Option<&Path>, message: &MessageArgs) -> Result<()> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, message)?;

    let notifier = Notifier::new(config).context("failed to create Slack client")?;
    let payload = notifier
        .preview(!message.failed, message.task.as_deref())
        .context("failed to render Slack message")?;

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

const SAMPLE_CONFIG: &str = r##"# DeploySlack Configuration

[slack]
# Prefer referencing the webhook through an environment variable.
webhook_url_env = "SLACK_WEBHOOK_URL"
# webhook_url = "https://hooks.slack.com/services/T000/B000/XXXX"
channel = "#deploys"
# Add a top-level "channel" key to the posted body.
include_channel = false
timeout_secs = 10

# Fields shown in the message. Leave the whole section out to post
# placeholder values; otherwise set every field.
[deployment]
host = "web1"
release = 1
user = "deployer"
branch = "main"
php_version = "8.2"
github_url = "https://github.com/owner/repo/actions"
"##;

fn cmd_init(output: &Path) -> Result<()> {
    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, SAMPLE_CONFIG).context("failed to write config file")?;

    println!(
        "{}",
        style::success(&format!(
            "Default configuration written to {}",
            output.display()
        ))
    );
    println!();
    println!("Next steps:");
    println!("  1. Edit the [deployment] fields, or pass them with --option KEY=VALUE");
    println!("  2. Export the webhook: export SLACK_WEBHOOK_URL=https://hooks.slack.com/...");
    println!(
        "  3. Validate with: deployslack validate --config {}",
        output.display()
    );
    println!(
        "  4. Notify: deployslack send --config {} [--failed --task NAME]",
        output.display()
    );

    Ok(())
}

fn cmd_validate(config_path: Option<&Path>) -> Result<()> {
    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG));
    println!("Validating configuration: {}", path.display());
    println!();

    let mut config = AppConfig::load_from_file(path).context("failed to parse configuration")?;
    println!("  {}", style::success("TOML structure is valid"));

    // Resolve env vars (non-fatal warnings)
    let _ = config.resolve_env_vars();
    println!("  {}", style::success("Environment variable references processed"));

    match config.validate() {
        Ok(()) => println!("  {}", style::success("All required fields are valid")),
        Err(e) => {
            println!("  {}", style::error(&format!("Validation error: {}", e)));
            anyhow::bail!("configuration validation failed");
        }
    }

    // Summary. The webhook URL is a secret and never printed.
    println!();
    println!("{}", style::header("Configuration summary:"));
    println!("  Webhook URL    : set");
    println!(
        "  Channel        : {}",
        if config.slack.channel.is_empty() {
            style::dim("(webhook default)")
        } else {
            config.slack.channel.clone()
        }
    );
    println!("  Include channel: {}", config.slack.include_channel);
    println!(
        "  Timeout        : {}",
        config
            .slack
            .timeout_secs
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| style::dim("client default"))
    );
    if config.deployment.is_empty() {
        println!(
            "  Deployment     : {}",
            style::warn("no fields set, placeholders will be posted")
        );
    } else {
        let d = &config.deployment;
        let show = |v: &Option<String>| v.clone().unwrap_or_default();
        println!("  Host           : {}", show(&d.host));
        println!("  Branch         : {}", show(&d.branch));
        println!("  Release        : {}", show(&d.release));
        println!("  PHP version    : {}", show(&d.php_version));
        println!("  Created by     : {}", show(&d.user));
        println!("  GitHub URL     : {}", show(&d.github_url));
    }
    println!();
    println!("Configuration is valid.");

    Ok(())
}
