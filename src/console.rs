use crate::api::{DeviceLookup, FilterChoices};
use crate::domain::DeviceDirectory;
use crate::extensions::unsigned_ints_ext::Uptime;
use crate::feed::{Command, CommandError, ConnectionState, FeedUpdate, HELP, LiveFeed, render_table};
use chrono::Utc;
use futures::{Stream, StreamExt};
use std::future::Future;
use std::io::{self, Write};
use std::pin::pin;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval, interval_at};
use tracing::{debug, info, instrument, warn};

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

/// Terminal front end of the live feed.
#[derive(Debug)]
pub struct Console<W: Write> {
    out: W,
    clear_screen: bool,
    directory: DeviceDirectory,
    directory_refresh: Option<(DeviceLookup, Duration)>,
    choices: FilterChoices,
}

enum Input {
    Update(Option<FeedUpdate>),
    Line(Option<String>),
    Refresh,
    ReloadDirectory,
    Shutdown,
}

impl<W: Write> Console<W> {
    pub fn new(out: W, clear_screen: bool, directory: DeviceDirectory, choices: FilterChoices) -> Self {
        Console {
            out,
            clear_screen,
            directory,
            directory_refresh: None,
            choices,
        }
    }

    /// Reloads the device list through `lookup` every `every` while the feed runs.
    pub fn with_directory_refresh(mut self, lookup: DeviceLookup, every: Duration) -> Self {
        self.directory_refresh = Some((lookup, every));
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Redraws the status line and the table of buffered events.
    pub fn draw(&mut self, feed: &LiveFeed) -> io::Result<()> {
        let now = Utc::now();
        let connection = match (feed.state(), feed.open_since()) {
            (ConnectionState::Open, Some(since)) => {
                format!("🟢 open for {}", (now - since).num_seconds().max(0).unsigned_abs().to_uptime())
            }
            (ConnectionState::Open, None) => "🟢 open".to_string(),
            (ConnectionState::Connecting, _) => "🟡 connecting".to_string(),
            (ConnectionState::Idle, _) => "⚪ idle".to_string(),
            (ConnectionState::Closed, _) => "🟠 closed, reconnecting".to_string(),
            (ConnectionState::Errored, _) => "🔴 disconnected, reconnecting".to_string(),
        };
        let filter = match feed.filter().to_query_string() {
            query if query.is_empty() => "none".to_string(),
            query => query,
        };
        let rows = feed.rows(&self.directory, now);

        if self.clear_screen {
            write!(self.out, "{}", CLEAR_SCREEN)?;
        }
        let expanded = if feed.projection().expanded_by_default() { "expanded" } else { "collapsed" };
        writeln!(self.out, "{} | filter: {} | {} event(s), {}", connection, filter, rows.len(), expanded)?;
        write!(self.out, "{}", render_table(&rows))?;
        self.out.flush()
    }

    /// Replaces the device directory and redraws. A failed reload keeps the current directory.
    pub async fn reload_directory(&mut self, feed: &LiveFeed) -> io::Result<()> {
        let Some((lookup, _)) = &self.directory_refresh else {
            return Ok(());
        };

        match lookup.fetch_directory().await {
            Ok(directory) => {
                debug!("Reloaded {} device name(s)", directory.len());
                self.directory = directory;
                self.draw(feed)
            }
            Err(e) => {
                warn!("⚠️ Unable to reload devices, keeping {} known device name(s): {}", self.directory.len(), e);
                Ok(())
            }
        }
    }

    pub fn message(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", message)?;
        self.out.flush()
    }

    /// Applies a command. Filter changes resubscribe the feed.
    pub async fn execute(&mut self, feed: &mut LiveFeed, command: Command) -> io::Result<()> {
        match command {
            Command::DeviceIds(ids) => feed.set_device_ids(ids).await,
            Command::Codes(codes) => feed.set_codes(codes).await,
            Command::Actions(actions) => feed.set_actions(actions).await,
            Command::Filter(filter) => feed.set_filter(filter).await,
            Command::Expand => feed.set_all_expanded(true),
            Command::Collapse => feed.set_all_expanded(false),
            Command::Toggle(seq) => {
                if feed.toggle_row(seq).is_none() {
                    return self.message(&format!("No row {}", seq));
                }
            }
            Command::Share => return self.message(&feed.filter().to_query_string()),
            Command::Choices => {
                let choices = format!("codes: {}\nactions: {}", self.choices.codes.join(", "), self.choices.actions.join(", "));
                return self.message(&choices);
            }
            Command::Help => return self.message(HELP),
            Command::Quit => return Ok(()),
        }
        self.draw(feed)
    }
}

/// Runs the feed until `commands` ends, `quit` is entered or `shutdown` completes.
#[instrument(skip_all)]
pub async fn run<W, S, F>(feed: &mut LiveFeed, commands: S, console: &mut Console<W>, refresh_interval: Duration, shutdown: F) -> io::Result<()>
where
    W: Write,
    S: Stream<Item = String>,
    F: Future<Output = ()>,
{
    let mut commands = pin!(commands);
    let mut shutdown = pin!(shutdown);
    let mut refresh = interval(refresh_interval);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut directory_refresh = console.directory_refresh.as_ref().map(|(_, every)| {
        let mut directory_refresh = interval_at(Instant::now() + *every, *every);
        directory_refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        directory_refresh
    });

    feed.subscribe().await;
    console.draw(feed)?;

    loop {
        let input = tokio::select! {
            update = feed.recv() => Input::Update(update),
            line = commands.next() => Input::Line(line),
            _ = refresh.tick() => Input::Refresh,
            _ = next_tick(&mut directory_refresh) => Input::ReloadDirectory,
            _ = &mut shutdown => Input::Shutdown,
        };

        match input {
            Input::Update(Some(_)) | Input::Refresh => console.draw(feed)?,
            Input::ReloadDirectory => console.reload_directory(feed).await?,
            Input::Update(None) => break,
            Input::Line(None) => {
                info!("Console input closed");
                break;
            }
            Input::Line(Some(line)) => match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => console.execute(feed, command).await?,
                Err(CommandError::Empty) => {}
                Err(e) => console.message(&e.to_string())?,
            },
            Input::Shutdown => break,
        }
    }

    feed.shutdown().await;
    Ok(())
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
