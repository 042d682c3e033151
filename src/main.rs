use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    terminal::{disable_raw_mode, enable_raw_mode},
    tty::IsTty,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Arc,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use typesto::{
    api::ApiClient,
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    difficulty::Difficulty,
    leaderboard::{format_standings, Leaderboard, LocalLeaderboard},
    lifecycle::Lifecycle,
    runtime::{spawn_terminal_events, Runner, RunnerUpdate},
    throttle::{Throttle, ThrottledSource},
    words::{WordPools, WordSupply},
};

/// Name scores are filed under when playing without a server
const LOCAL_USERNAME: &str = "you";

#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing speed test with difficulty tiers, adaptive word lists and per-difficulty leaderboards. Esc quits, Tab refreshes, F1-F4 switch difficulty."
)]
pub struct Cli {
    /// difficulty tier to draw words from
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// number of words per session
    #[clap(short = 'w', long, value_parser = clap::value_parser!(u16).range(25..=70))]
    word_count: Option<u16>,

    /// typing server base url, e.g. http://localhost:5000
    #[clap(short = 's', long)]
    server: Option<String>,

    /// session token sent to the typing server
    #[clap(long)]
    token: Option<String>,

    /// name used for leaderboard submissions
    #[clap(short = 'u', long)]
    username: Option<String>,

    /// config file to use instead of the per-user default
    #[clap(long)]
    config: Option<PathBuf>,

    /// persist the given options as new defaults
    #[clap(long)]
    save: bool,

    /// print the leaderboard and exit
    #[clap(long)]
    leaderboard: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(count) = self.word_count {
            config.word_count = Some(count as usize);
        }
        if let Some(server) = &self.server {
            config.server_url = Some(server.clone());
        }
        if let Some(token) = &self.token {
            config.auth_token = Some(token.clone());
        }
        if let Some(username) = &self.username {
            config.username = Some(username.clone());
        }
    }
}

fn api_client(config: &Config) -> Result<Option<Arc<ApiClient>>, Box<dyn Error>> {
    let Some(url) = &config.server_url else {
        return Ok(None);
    };
    let client = ApiClient::new(url)?;
    let client = match &config.auth_token {
        Some(token) => client.with_token(token)?,
        None => client,
    };
    Ok(Some(Arc::new(client)))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let mut config = store.load();
    cli.apply(&mut config);
    if cli.save {
        store.save(&config)?;
    }

    let client = api_client(&config)?;

    if cli.leaderboard {
        let standings = match &client {
            Some(client) => client.fetch_leaderboard().await?,
            None => Leaderboard::new().standings(),
        };
        println!("{}", format_standings(&standings));
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut supply = WordSupply::new(WordPools::embedded()?);
    let mut lifecycle = match config.chosen_word_count() {
        Some(count) => Lifecycle::new(config.difficulty, count),
        None => Lifecycle::for_difficulty(config.difficulty),
    };
    if let Some(username) = &config.username {
        lifecycle.set_username(username.clone());
    }

    let local = Arc::new(LocalLeaderboard::new());
    let runner = match &client {
        Some(client) => {
            let throttle = Arc::new(Throttle::new(
                config.generation_interval(),
                Arc::new(SystemClock),
            ));
            supply = supply.with_remote(Arc::new(ThrottledSource::new(client.clone(), throttle)));
            Runner::new(lifecycle, supply)
                .with_scores(client.clone())
                .with_profile(client.clone())
        }
        None => {
            if lifecycle.username().is_none() {
                lifecycle.set_username(LOCAL_USERNAME);
            }
            Runner::new(lifecycle, supply).with_scores(local.clone())
        }
    };

    let (updates_tx, updates_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let runner = runner
        .with_restart_delay(config.restart_delay())
        .with_updates(updates_tx);

    enable_raw_mode()?;
    let reader = spawn_terminal_events(events_tx);
    let printer = tokio::spawn(print_updates(updates_rx));
    let lifecycle = runner.run(events_rx).await;
    let _ = printer.await;
    let _ = reader.join();
    disable_raw_mode()?;

    if let Some(last) = lifecycle.last_metrics() {
        println!(
            "last session: {} wpm, {}% accuracy. best: {} wpm",
            last.wpm,
            last.accuracy,
            lifecycle.best_wpm()
        );
    }
    if client.is_none() {
        println!("{}", format_standings(&local.standings()));
    }

    Ok(())
}

async fn print_updates(mut updates: UnboundedReceiver<RunnerUpdate>) {
    let mut out = io::stdout();
    while let Some(update) = updates.recv().await {
        if let Err(e) = render_update(&mut out, &update) {
            log::warn!("unable to write to terminal: {e}");
            break;
        }
    }
}

fn render_update<W: Write>(out: &mut W, update: &RunnerUpdate) -> io::Result<()> {
    match update {
        RunnerUpdate::Ready {
            difficulty, words, ..
        } => write!(out, "\r\n[{difficulty}] {}\r\n", words.join(" "))?,
        RunnerUpdate::Key {
            word_index,
            total_words,
            live_wpm,
            ..
        } => write!(
            out,
            "\r{word_index}/{total_words} words  {live_wpm} wpm    "
        )?,
        RunnerUpdate::Completed(done) => write!(
            out,
            "\r\n{} wpm  {}% accuracy{}\r\n",
            done.metrics.wpm,
            done.metrics.accuracy,
            if done.new_best { "  new best!" } else { "" }
        )?,
        RunnerUpdate::Submitted { accepted: false, .. } => {
            write!(out, "\r\nscore not submitted\r\n")?
        }
        RunnerUpdate::Submitted { .. } => {}
    }
    out.flush()
}
