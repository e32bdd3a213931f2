use std::{
    io::{self, Write},
    path::PathBuf,
    time::Duration,
};

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};
use url::Url;

#[macro_use]
extern crate tracing;

use coordbot::{
    bot::{self, RunOptions},
    kml,
    mail::HttpRelay,
    report::{self, Destination},
    wm::Client,
};

/// Get the version returned by `git describe` (see `build.rs`),
/// or the crate version if not available.
fn version() -> &'static str {
    option_env!("CARGO_GIT_VERSION")
        .or(option_env!("CARGO_PKG_VERSION"))
        .unwrap_or("unknown")
}

/// Add `{{coord}}` annotations to wiki articles from a KML placemark file.
///
/// Each placemark's name is the article title. Pages that already have coordinates
/// or opt out of bots are skipped. A report is posted to the wiki and mailed at the end.
#[derive(Parser)]
#[command(version = crate::version())]
struct Args {
    /// KML file with a `name` and `Point` for each article.
    #[arg(value_name = "FILE.kml")]
    kml: PathBuf,

    /// Don't print progress for each article.
    #[arg(short, long)]
    silent: bool,

    /// Don't post the report to the wiki; it is still mailed.
    #[arg(long)]
    no_report: bool,

    /// Don't save any edits; show what would be changed.
    #[arg(long)]
    dry_run: bool,

    /// Stop after this many edits.
    #[arg(long, env = "COORDBOT_EDIT_LIMIT", value_name = "N")]
    edit_limit: Option<usize>,

    /// MediaWiki `api.php` endpoint.
    #[arg(
        long,
        env = "COORDBOT_API_URL",
        default_value = "https://en.wikipedia.org/w/api.php"
    )]
    api_url: Url,

    /// Bot account, optionally as a bot password login (`Name@label`).
    #[arg(long, env = "COORDBOT_USERNAME", help_heading = "ACCOUNT")]
    username: String,

    /// Required unless `--dry-run` is set.
    #[arg(
        long,
        env = "COORDBOT_PASSWORD",
        hide_env_values = true,
        help_heading = "ACCOUNT"
    )]
    password: Option<String>,

    /// Page to add the report to as a new section (defaults to `User:<bot>/Reports`).
    #[arg(long, env = "COORDBOT_REPORT_PAGE", value_name = "TITLE")]
    report_page: Option<String>,

    /// HTTP mail relay endpoint that accepts `from`, `to`, `subject` and `text` form fields.
    #[arg(long, env = "COORDBOT_MAIL_RELAY", help_heading = "MAIL")]
    mail_relay: Url,

    /// Bearer token for the mail relay.
    #[arg(
        long,
        env = "COORDBOT_MAIL_TOKEN",
        hide_env_values = true,
        help_heading = "MAIL"
    )]
    mail_token: Option<String>,

    /// Sender address of the report mail.
    #[arg(long, env = "COORDBOT_MAIL_FROM", help_heading = "MAIL")]
    mail_from: String,

    /// Operator address the report is sent to.
    #[arg(long, env = "COORDBOT_MAIL_TO", help_heading = "MAIL")]
    mail_to: String,

    /// Timeout for each HTTP request.
    #[arg(long, default_value_t = 30, value_name = "SECONDS")]
    timeout: u64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if !args.dry_run && args.password.is_none() {
        let mut cmd = Args::command();
        cmd.error(
            clap::error::ErrorKind::MissingRequiredArgument,
            "--password is required unless --dry-run is set",
        )
        .exit()
    }

    // Use info level by default (warn when silenced), load overrides from `RUST_LOG` env variable.
    let default_level = if args.silent {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with(tracing_logfmt::builder().layer().with_writer(io::stderr))
        .try_init()?;

    info!("{} {}", Args::command().get_name(), version());

    info!("Loading placemarks from {:?}", args.kml);
    let locations = kml::parse_kml_file(&args.kml)
        .with_context(|| format!("reading placemarks from {:?}", args.kml))?;
    info!("Found {} locations", locations.len());

    // Bot passwords log in as `Name@label` but edit as `Name`.
    let bot_name = args
        .username
        .split_once('@')
        .map_or(args.username.as_str(), |(name, _)| name)
        .to_owned();

    let timeout = Duration::from_secs(args.timeout);
    let mut wiki = Client::new(args.api_url.clone(), timeout);
    if let Some(password) = &args.password {
        wiki.login(&args.username, password)
            .with_context(|| format!("logging in to {} as {:?}", args.api_url, args.username))?;
    }

    let options = RunOptions {
        bot_name: bot_name.clone(),
        edit_limit: args.edit_limit,
        dry_run: args.dry_run,
    };

    let mut console: Box<dyn Write> = if args.silent {
        Box::new(io::sink())
    } else {
        Box::new(io::stdout())
    };
    let (report, summary) = bot::run(&mut wiki, &locations, &options, &mut console);

    let file_name = args
        .kml
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.kml.display().to_string());
    let destination = Destination {
        post_to_wiki: !args.no_report,
        dry_run: args.dry_run,
        page: args
            .report_page
            .unwrap_or_else(|| format!("User:{bot_name}/Reports")),
        section_title: format!("Coordinates from {file_name}"),
        mail_from: args.mail_from,
        mail_to: args.mail_to,
    };
    let mut mailer = HttpRelay::new(args.mail_relay, args.mail_token, timeout);
    report::dispatch(report, &mut wiki, &mut mailer, &destination)
        .context("mailing report")?;

    info!(
        "Done: {} edited, {} skipped, {} failed{}",
        summary.edited,
        summary.skipped,
        summary.failed,
        if summary.aborted {
            " (stopped at edit limit)"
        } else {
            ""
        }
    );

    Ok(())
}
