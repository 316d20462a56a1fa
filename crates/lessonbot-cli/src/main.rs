use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lessonbot_client::{LaunchOptions, acquire};
use lessonbot_core::config::{self, Overrides, SETTINGS_FILE};
use lessonbot_core::{Browser, LoginMethod};

/// Page fetched once per run to prove the session works end to end.
const TARGET_URL: &str = "https://api.perytron.ch/ARES.php?x=10000&y=10000";

#[derive(Parser)]
#[command(
    name = "lessonbot",
    version,
    about = "Headless browser bootstrap for lesson enrolment"
)]
struct Cli {
    /// Enrolment username
    #[arg(short, long, env = "LESSONBOT_USERNAME")]
    username: Option<String>,

    /// Enrolment password
    #[arg(short, long, env = "LESSONBOT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Browser to try first (brave, chromium, chrome, firefox, edge)
    #[arg(short, long, value_parser = Browser::from_str)]
    browser: Option<Browser>,

    /// Login method (sso, local)
    #[arg(short = 'm', long, value_parser = LoginMethod::from_str)]
    login_method: Option<LoginMethod>,

    /// Numeric lesson identifier
    #[arg(short, long)]
    lesson_id: Option<u32>,

    /// Do not persist the password in the settings file
    #[arg(long, default_value_t = false)]
    stealth: bool,

    /// Show the browser window instead of running headless
    #[arg(long, default_value_t = false)]
    headed: bool,

    /// Settings file location
    #[arg(long, default_value = SETTINGS_FILE)]
    settings: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Log to stderr so stdout carries nothing but the fetched HTML.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("lessonbot_cli=info".parse()?)
                .add_directive("lessonbot_core=info".parse()?)
                .add_directive("lessonbot_client=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let overrides = Overrides {
        username: cli.username,
        password: cli.password,
        browser: cli.browser,
        login_method: cli.login_method,
        lesson_id: cli.lesson_id,
        stealth: cli.stealth,
    };
    let settings = config::resolve(&overrides, &cli.settings)?;
    tracing::info!(
        "settings resolved: user {} via {}, lesson {}",
        settings.username,
        settings.login_method,
        settings.lesson_id
    );

    let options = LaunchOptions {
        headless: !cli.headed,
        ..LaunchOptions::default()
    };
    let session = acquire(Some(settings.browser), &options).await?;

    // The session is released even when the fetch fails.
    let fetched = session.fetch(TARGET_URL).await;
    session.quit().await;

    match fetched {
        Ok(html) => println!("{html}"),
        Err(err) => tracing::error!("page fetch failed: {err}"),
    }

    Ok(())
}
