mod config;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, EnvFilter};

use livecheck_core::{fetch_streams, CheckerConfig, ReqwestClient, StreamList, StreamRecord};

use config::{AppConfig, OutputFormat};

fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");

    if GIT_HASH.is_empty() {
        // Called once; lives for the program's lifetime.
        Box::leak(VERSION.to_string().into_boxed_str())
    } else {
        Box::leak(format!("{VERSION} ({GIT_HASH})").into_boxed_str())
    }
}

/// Check which channels are streaming right now.
#[derive(Parser)]
#[command(name = "livecheck", version = version_string(), about)]
struct Cli {
    /// Channel logins to check. Falls back to `channels` in the config file.
    channels: Vec<String>,

    /// Path to TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API root, e.g. https://api.twitch.tv/kraken. Overrides config and environment.
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Output format. Overrides config file.
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let app_config = match cli.config {
        Some(ref path) => match AppConfig::load(path) {
            Ok(c) => {
                init_tracing(&c.output.log_format);
                tracing::debug!(path = %path.display(), "Loaded config file");
                c
            }
            Err(e) => {
                init_tracing("pretty");
                fail(&e);
            }
        },
        None => {
            init_tracing("pretty");
            AppConfig::default()
        }
    };

    if let Err(e) = run(cli, app_config).await {
        fail(&e);
    }
}

async fn run(cli: Cli, app_config: AppConfig) -> Result<(), String> {
    let checker_config = resolve_checker_config(&cli, &app_config)?;
    let channels = if cli.channels.is_empty() {
        app_config.channels.clone()
    } else {
        cli.channels.clone()
    };
    if channels.is_empty() {
        return Err("No channels given; pass them as arguments or set `channels` in the config file".into());
    }
    if let Some(i) = channels.iter().position(|c| c.trim().is_empty()) {
        return Err(format!("Channel name at index {} is empty", i));
    }
    let format = cli.format.unwrap_or(app_config.output.format);

    tracing::debug!(config = ?checker_config, channels = channels.len(), "Checking channels");

    let client = ReqwestClient::from_config(&checker_config).map_err(|e| e.to_string())?;

    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message(format!("Checking {} channel(s)...", channels.len()));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = fetch_streams(&client, &checker_config, &channels).await;
    spinner.finish_and_clear();

    let streams = result.map_err(|e| e.to_string())?;

    match format {
        OutputFormat::Json => {
            let out = serde_json::to_string_pretty(&streams).map_err(|e| e.to_string())?;
            println!("{}", out);
        }
        OutputFormat::Text => {
            for line in summarize(&channels, &streams) {
                println!("{}", render(&line));
            }
        }
    }

    Ok(())
}

/// Flag > environment > config file > defaults.
fn resolve_checker_config(cli: &Cli, app_config: &AppConfig) -> Result<CheckerConfig, String> {
    let mut c = app_config.to_checker_config(|key| std::env::var(key).ok())?;
    if let Some(ref base_url) = cli.base_url {
        c = c.with_base_url(base_url).map_err(|e| e.to_string())?;
    }
    if let Some(ms) = cli.timeout_ms {
        if ms == 0 {
            return Err("--timeout-ms must be greater than zero".into());
        }
        c = c.with_request_timeout(ms);
    }
    Ok(c)
}

#[derive(Debug, Clone, PartialEq)]
struct ChannelLine {
    name: String,
    live: bool,
    viewers: Option<u64>,
    game: Option<String>,
}

/// One line per requested channel, in request order, plus any live record the
/// API returned under a name we did not ask for.
fn summarize(channels: &[String], streams: &StreamList) -> Vec<ChannelLine> {
    let mut matched = vec![false; streams.len()];
    let mut lines = Vec::with_capacity(channels.len());

    for channel in channels {
        let hit = streams.iter().enumerate().find(|(i, s)| {
            !matched[*i]
                && s.login()
                    .is_some_and(|login| login.eq_ignore_ascii_case(channel))
        });
        match hit {
            Some((i, record)) => {
                matched[i] = true;
                lines.push(live_line(channel.clone(), record));
            }
            None => lines.push(ChannelLine {
                name: channel.clone(),
                live: false,
                viewers: None,
                game: None,
            }),
        }
    }

    for (i, record) in streams.iter().enumerate() {
        if !matched[i] {
            let name = record.login().unwrap_or("(unknown)").to_string();
            lines.push(live_line(name, record));
        }
    }

    lines
}

fn live_line(name: String, record: &StreamRecord) -> ChannelLine {
    ChannelLine {
        name,
        live: true,
        viewers: record.get("viewers").and_then(|v| v.as_u64()),
        game: record
            .get("game")
            .and_then(|v| v.as_str())
            .filter(|g| !g.is_empty())
            .map(str::to_string),
    }
}

fn render(line: &ChannelLine) -> String {
    if !line.live {
        return format!(
            "  {} {:<24} {}",
            style("○").dim(),
            line.name,
            style("offline").dim()
        );
    }

    let mut details = Vec::new();
    if let Some(viewers) = line.viewers {
        details.push(format!("{} viewers", viewers));
    }
    if let Some(ref game) = line.game {
        details.push(game.clone());
    }
    format!(
        "  {} {} {}  {}",
        style("●").red().bold(),
        style(format!("{:<24}", line.name)).bold(),
        style("LIVE").red().bold(),
        style(details.join(", ")).dim()
    )
}

fn fail(message: &str) -> ! {
    tracing::debug!(error = %message, "livecheck failed");
    eprintln!("{} {}", style("error:").red().bold(), message);
    std::process::exit(1);
}

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_format {
        "json" => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn record(value: serde_json::Value) -> StreamRecord {
        StreamRecord::try_from(value).unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn summarize_marks_live_and_offline_in_request_order() {
        let streams = vec![record(json!({
            "viewers": 310,
            "game": "Dota 2",
            "channel": { "name": "bob" }
        }))];
        let lines = summarize(&names(&["alice", "bob"]), &streams);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "alice");
        assert!(!lines[0].live);
        assert_eq!(lines[1].name, "bob");
        assert!(lines[1].live);
        assert_eq!(lines[1].viewers, Some(310));
        assert_eq!(lines[1].game.as_deref(), Some("Dota 2"));
    }

    #[test]
    fn summarize_matches_case_insensitively() {
        let streams = vec![record(json!({ "login": "EslTV_Dota" }))];
        let lines = summarize(&names(&["esltv_dota"]), &streams);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].live);
    }

    #[test]
    fn summarize_keeps_unrequested_records() {
        let streams = vec![record(json!({ "viewers": 3 }))];
        let lines = summarize(&names(&["alice"]), &streams);
        assert_eq!(lines.len(), 2);
        assert!(!lines[0].live);
        assert_eq!(lines[1].name, "(unknown)");
        assert!(lines[1].live);
    }

    #[test]
    fn cli_flag_overrides_config() {
        let cli = Cli::parse_from([
            "livecheck",
            "--base-url",
            "http://127.0.0.1:9999/api",
            "--timeout-ms",
            "1500",
            "alice",
        ]);
        let app_config: AppConfig = toml::from_str(
            r#"
[api]
base_url = "http://example.com/kraken"
timeout_ms = 5000
"#,
        )
        .unwrap();

        let c = resolve_checker_config(&cli, &app_config).unwrap();
        assert_eq!(c.base_url.as_str(), "http://127.0.0.1:9999/api");
        assert_eq!(c.request_timeout, Duration::from_millis(1500));
        assert_eq!(cli.channels, vec!["alice"]);
    }

    #[test]
    fn cli_rejects_zero_timeout() {
        let cli = Cli::parse_from(["livecheck", "--timeout-ms", "0", "alice"]);
        let err = resolve_checker_config(&cli, &AppConfig::default()).unwrap_err();
        assert!(err.contains("--timeout-ms"), "{}", err);
    }

    #[test]
    fn cli_parses_format() {
        let cli = Cli::parse_from(["livecheck", "-f", "json", "a", "b"]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.channels, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn run_reports_malformed_body_with_raw_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/streams"))
            .and(query_param("channel", "alice"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>error</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let cli = Cli::parse_from(["livecheck", "--base-url", &server.uri(), "alice"]);
        let err = run(cli, AppConfig::default()).await.unwrap_err();
        assert!(err.contains("<html>error</html>"), "{}", err);
    }

    #[tokio::test]
    async fn run_without_channels_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"streams":[]}"#))
            .expect(0)
            .mount(&server)
            .await;

        let cli = Cli::parse_from(["livecheck", "--base-url", &server.uri()]);
        let err = run(cli, AppConfig::default()).await.unwrap_err();
        assert!(err.contains("No channels given"), "{}", err);
    }

    #[tokio::test]
    async fn run_rejects_blank_channel_argument() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"streams":[]}"#))
            .expect(0)
            .mount(&server)
            .await;

        let cli = Cli::parse_from(["livecheck", "--base-url", &server.uri(), "alice", ""]);
        let err = run(cli, AppConfig::default()).await.unwrap_err();
        assert!(err.contains("index 1 is empty"), "{}", err);
    }
}
