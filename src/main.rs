use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quizgate::api::{DEMO_VIDEO_ID, DemoLessonApi, LessonApi, LessonApiClient};
use quizgate::app::TerminalApp;
use quizgate::config::Config;
use quizgate::models::VideoId;
use quizgate::player::SimulatedBackendFactory;
use quizgate::session::{self, HeadlessFullscreen};

const USAGE: &str = "usage: quizgate [--config PATH] [--demo] [VIDEO_ID]";

struct Args {
    config_path: Option<PathBuf>,
    demo: bool,
    video_id: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        println!("{}", USAGE);
        std::process::exit(0);
    }

    let config_path = args
        .opt_value_from_os_str("--config", |s| Ok::<_, std::convert::Infallible>(PathBuf::from(s)))
        .context("Invalid --config value")?;
    let demo = args.contains("--demo");
    let video_id = args
        .finish()
        .into_iter()
        .next()
        .and_then(|s| s.into_string().ok());

    Ok(Args {
        config_path,
        demo,
        video_id,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quizgate=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;

    let config = match &args.config_path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };

    let demo = args.demo || args.video_id.is_none();
    let api: Arc<dyn LessonApi> = if demo {
        info!("Running the built-in demo lesson");
        Arc::new(DemoLessonApi::new())
    } else {
        Arc::new(LessonApiClient::new(&config.api).context("Failed to create API client")?)
    };
    let video_id = VideoId::from(args.video_id.as_deref().unwrap_or(DEMO_VIDEO_ID));

    info!("Starting quizgate for video {}", video_id);

    let factory = SimulatedBackendFactory::new(config.playback.poll_interval());
    let (handle, task) = session::open(
        api,
        config,
        &video_id,
        &factory,
        Box::new(HeadlessFullscreen),
    )
    .await
    .with_context(|| format!("Failed to open lesson {}", video_id))?;

    let stdin = BufReader::new(tokio::io::stdin());
    TerminalApp::new(handle)
        .run(stdin, tokio::io::stdout())
        .await?;

    task.await.context("Session task failed")?;
    info!("Goodbye");
    Ok(())
}
