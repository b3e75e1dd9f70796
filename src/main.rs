//! Binary entrypoint: a headless infinite-scroll gallery over a Pexels-compatible API.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use rust_photo_gallery::config::Configuration;
use rust_photo_gallery::events::{BatchRendered, InputEvent, LoadMore, TriggerSource, ViewEvent};
use rust_photo_gallery::feed::{GalleryFeed, PexelsClient};
use rust_photo_gallery::pagination::{CuratedPages, PageStrategy, PaginationController, SearchPages};
use rust_photo_gallery::tasks;
use rust_photo_gallery::tasks::viewer::{ConsoleSurface, ViewerOptions};

#[derive(Debug, Parser)]
#[command(
    name = "photo-gallery",
    version,
    about = "infinite-scroll photo gallery client"
)]
struct Args {
    /// Path to YAML config (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
    /// Stop after this long (e.g. "30s"); runs until ctrl-c otherwise
    #[arg(long = "run-for", value_name = "DURATION", value_parser = humantime::parse_duration)]
    run_for: Option<Duration>,
    /// Pixels scrolled per synthetic scroll event
    #[arg(long = "scroll-step", value_name = "PIXELS", default_value_t = 400.0)]
    scroll_step: f32,
    /// Delay between synthetic scroll events
    #[arg(
        long = "scroll-interval",
        value_name = "DURATION",
        value_parser = humantime::parse_duration,
        default_value = "500ms"
    )]
    scroll_interval: Duration,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Browse the curated feed
    Browse,
    /// Browse search results for TERM
    Search {
        #[arg(value_name = "TERM")]
        term: Option<String>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rust_photo_gallery={level},warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        config,
        verbose,
        run_for,
        scroll_step,
        scroll_interval,
        command,
    } = Args::parse();
    init_tracing(verbose);

    let cfg = match &config {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Configuration::default(),
    }
    .validated()
    .context("invalid configuration values")?;
    tracing::debug!("configuration: {cfg:#?}");

    let api_key = cfg.api.resolve_api_key()?;
    let client = PexelsClient::new(&cfg.api, api_key).context("failed to build http client")?;
    let feed = Arc::new(GalleryFeed::new(client, cfg.api.image_size));

    // Channels
    let (trigger_tx, trigger_rx) = mpsc::channel::<LoadMore>(1); // Viewer -> Pagination
    let (rendered_tx, rendered_rx) = mpsc::unbounded_channel::<BatchRendered>(); // Viewer -> Pagination (render acks)
    let (view_tx, view_rx) = mpsc::unbounded_channel::<ViewEvent>(); // Pagination -> Viewer
    let (input_tx, input_rx) = mpsc::channel::<InputEvent>(16); // Host -> Viewer

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }
    if let Some(limit) = run_for {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            tracing::info!("run-for elapsed; initiating shutdown");
            cancel.cancel();
        });
    }

    let mut tasks = JoinSet::new();

    // Pagination
    let pagination = Pagination {
        feed,
        page_size: cfg.page_size,
        triggers: trigger_rx,
        rendered: rendered_rx,
        to_viewer: view_tx,
        cancel: cancel.clone(),
    };
    let searching = match command.unwrap_or(Command::Browse) {
        Command::Browse => {
            pagination.spawn(&mut tasks, CuratedPages, None);
            false
        }
        Command::Search { term } => {
            pagination.spawn(&mut tasks, SearchPages, term);
            true
        }
    };

    // Viewer
    tasks.spawn({
        let opts = ViewerOptions::from_config(&cfg);
        let to_pagination = trigger_tx.clone();
        let cancel = cancel.clone();
        async move {
            tasks::viewer::run(
                opts,
                ConsoleSurface,
                view_rx,
                input_rx,
                to_pagination,
                rendered_tx,
                cancel,
            )
            .await
            .context("viewer task failed")
        }
    });

    // Synthetic scrolling
    tasks.spawn({
        let input_tx = input_tx.clone();
        let cancel = cancel.clone();
        async move {
            tasks::autoscroll::run(scroll_step, scroll_interval, input_tx, cancel)
                .await
                .context("autoscroll task failed")
        }
    });

    // First page on startup; a search goes through the viewer like a submitted form
    if searching {
        input_tx
            .send(InputEvent::SubmitSearch)
            .await
            .context("viewer task exited before the search was submitted")?;
    } else {
        trigger_tx
            .send(LoadMore::new(TriggerSource::Initial))
            .await
            .context("pagination task exited before the first page")?;
    }
    drop(trigger_tx);
    drop(input_tx);

    cancel.cancelled().await;

    // Drain JoinSet (wait for other tasks to complete)
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }

    Ok(())
}

struct Pagination {
    feed: Arc<GalleryFeed<PexelsClient>>,
    page_size: u32,
    triggers: mpsc::Receiver<LoadMore>,
    rendered: mpsc::UnboundedReceiver<BatchRendered>,
    to_viewer: mpsc::UnboundedSender<ViewEvent>,
    cancel: CancellationToken,
}

impl Pagination {
    fn spawn<S>(self, tasks: &mut JoinSet<Result<()>>, strategy: S, term: Option<String>)
    where
        S: PageStrategy + 'static,
    {
        let controller = PaginationController::new(strategy, self.page_size);
        tasks.spawn(async move {
            tasks::pagination::run(
                controller,
                self.feed,
                term,
                self.triggers,
                self.rendered,
                self.to_viewer,
                self.cancel,
            )
            .await
            .context("pagination task failed")
        });
    }
}
