use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use strava_activity_client::config::Config;
use strava_activity_client::http_client::ReqwestStravaClient;
use strava_activity_client::retry::{RetryPolicy, with_token_refresh};
use strava_activity_client::{Credential, StravaClient, StravaError};
use strava_activity_tools::domains::{normalize_all, to_csv};
use strava_activity_tools::{SummarizeParams, WindowBasisParam, build_summary, tool_schemas};

#[derive(Parser)]
#[command(
    name = "strava-activities",
    version,
    about = "Fetch Strava activities and summarize them by Monday-Sunday week"
)]
struct Cli {
    #[arg(long, global = true, env = "STRAVA_CLIENT_ID", hide_env_values = true)]
    client_id: Option<String>,

    #[arg(long, global = true, env = "STRAVA_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    #[arg(long, global = true, env = "STRAVA_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    #[arg(long, global = true, env = "STRAVA_REFRESH_TOKEN", hide_env_values = true)]
    refresh_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the consent URL to open in a browser
    AuthorizeUrl,
    /// Exchange the `code` from the redirect for tokens
    Exchange {
        #[arg(long)]
        code: String,
    },
    /// Trade the refresh token (--refresh-token) for a fresh access token
    Refresh,
    /// Show the athlete owning the access token
    Athlete,
    /// Fetch activities as JSON or CSV
    Activities {
        /// Follow pagination to the last page
        #[arg(long)]
        all: bool,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        per_page: Option<u32>,
        /// Strip bulky fields and convert to miles/feet/mph
        #[arg(long)]
        clean: bool,
        /// CSV output is always cleaned
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Summarize activities read from a file or stdin
    Summarize {
        /// JSON array of activities; `-` reads stdin
        #[arg(long, default_value = "-")]
        input: String,
        /// Only the overall statistics
        #[arg(long)]
        no_weekly: bool,
        /// Only the most recent N weeks
        #[arg(long)]
        weeks: Option<u32>,
        /// Count weeks back from today instead of from the latest activity
        #[arg(long)]
        calendar: bool,
        /// Keep only these activity types (repeatable)
        #[arg(long = "type")]
        types: Vec<String>,
    },
    /// Print the JSON schemas of the tool parameters
    Schemas,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Csv,
}

enum Output {
    Json(Value),
    Text(String),
}

#[tokio::main]
async fn main() -> ExitCode {
    // `STRAVA_LOG_LEVEL` wins over `RUST_LOG`; default `info`.
    let log_env = std::env::var("STRAVA_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(format!("{log_env},hyper=warn"))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper=warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(Output::Json(value)) => {
            print_json(&value);
            ExitCode::SUCCESS
        }
        Ok(Output::Text(text)) => {
            print!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            print_json(&json!({ "error": format!("{e:#}") }));
            ExitCode::FAILURE
        }
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(_) => println!("{value}"),
    }
}

fn secret(value: Option<String>) -> Option<SecretString> {
    value
        .filter(|s| !s.trim().is_empty())
        .map(|s| SecretString::new(s.into()))
}

fn load_config(cli: &mut Cli) -> anyhow::Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(id) = cli.client_id.take().filter(|s| !s.trim().is_empty()) {
        config.client_id = Some(id);
    }
    if let Some(s) = secret(cli.client_secret.take()) {
        config.client_secret = Some(s);
    }
    if let Some(s) = secret(cli.access_token.take()) {
        config.access_token = Some(s);
    }
    if let Some(s) = secret(cli.refresh_token.take()) {
        config.refresh_token = Some(s);
    }
    Ok(config)
}

async fn run(mut cli: Cli) -> anyhow::Result<Output> {
    let config = load_config(&mut cli)?;

    let value = match cli.command {
        Command::AuthorizeUrl => {
            let client = ReqwestStravaClient::new(&config)?;
            json!({ "authorization_url": client.authorization_url()? })
        }
        Command::Exchange { code } => {
            let client = ReqwestStravaClient::new(&config)?;
            let credential = client.exchange_code(&code).await?;
            tracing::info!(expires_at = credential.expires_at, "authorization code exchanged");
            credential.to_exposed_json()
        }
        Command::Refresh => {
            let client = ReqwestStravaClient::new(&config)?;
            let refresh_token = config
                .refresh_token
                .as_ref()
                .ok_or(StravaError::MissingCredentials(vec!["refresh_token"]))?;
            let credential = client.refresh(refresh_token).await?;
            credential.to_exposed_json()
        }
        Command::Athlete => {
            config.require(&["access_token"])?;
            let client = ReqwestStravaClient::new(&config)?;
            let token = config
                .access_token
                .as_ref()
                .context("access token not configured")?;
            client.get_athlete(token).await?
        }
        Command::Activities {
            all,
            page,
            per_page,
            clean,
            format,
        } => {
            let per_page = per_page.unwrap_or(config.per_page);
            let activities = fetch_activities(&config, all, page, per_page).await?;
            if format == Format::Csv {
                return Ok(Output::Text(to_csv(&normalize_all(activities))?));
            }
            if clean {
                serde_json::to_value(normalize_all(activities))?
            } else {
                serde_json::to_value(activities)?
            }
        }
        Command::Summarize {
            input,
            no_weekly,
            weeks,
            calendar,
            types,
        } => {
            let activities = read_activities(&input)?;
            let params = SummarizeParams {
                activities,
                include_weekly: Some(!no_weekly),
                window_weeks: weeks,
                window_basis: Some(if calendar {
                    WindowBasisParam::Calendar
                } else {
                    WindowBasisParam::Data
                }),
                activity_types: (!types.is_empty()).then_some(types),
            };
            let today = chrono::Local::now().date_naive();
            serde_json::to_value(build_summary(params, today)?)?
        }
        Command::Schemas => tool_schemas(),
    };
    Ok(Output::Json(value))
}

/// Fetch with transient-failure retries, refreshing the access token once if
/// it was rejected and a refresh token is configured.
async fn fetch_activities(
    config: &Config,
    all: bool,
    page: u32,
    per_page: u32,
) -> anyhow::Result<Vec<strava_activity_client::RawActivity>> {
    config.require(&["client_id", "client_secret", "access_token"])?;
    let access_token = config
        .access_token
        .as_ref()
        .context("access token not configured")?;

    let client = ReqwestStravaClient::new(config)?;
    let url = client.activities_url();
    let policy = RetryPolicy::default();

    let (client, url, policy) = (&client, url.as_str(), &policy);
    let op = move |credential: Credential| async move {
        let token = &credential.access_token;
        policy
            .retry_transient(|| async move {
                if all {
                    client.fetch_all(token, url, per_page).await
                } else {
                    client.fetch_page(token, url, page, per_page).await
                }
            })
            .await
    };

    match &config.refresh_token {
        Some(refresh_token) => {
            let mut credential = Credential::new(
                access_token.expose_secret(),
                refresh_token.expose_secret(),
                0,
            );
            let before = credential.expires_at;
            let activities = with_token_refresh(client, &mut credential, op).await?;
            if credential.expires_at != before {
                tracing::warn!(
                    expires_at = ?credential.expires_at_iso(),
                    "access token was refreshed; run `refresh` to obtain the new tokens"
                );
            }
            Ok(activities)
        }
        None => Ok(op(Credential::new(access_token.expose_secret(), "", 0)).await?),
    }
}

fn read_activities(input: &str) -> anyhow::Result<Vec<Value>> {
    let text = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading activities from stdin")?;
        buf
    } else {
        let path = PathBuf::from(input);
        std::fs::read_to_string(&path)
            .with_context(|| format!("reading activities from {}", path.display()))?
    };
    serde_json::from_str(&text).context("activities input must be a JSON array")
}
