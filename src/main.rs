// setlist - command line front end
// Scans the music directories, loads the saved catalog, runs one command

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use setlist::{
    audio::AudioConfig, AudioPlayer, Catalog, CatalogStore, Config, Library, MusicScanner,
    Orchestrator, PlayOutcome,
};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt::writer::MakeWriterExt, EnvFilter};

#[derive(Parser)]
#[command(name = "setlist")]
#[command(about = "Playlists, queues and playback for your local music")]
struct Args {
    /// Use this config file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable developer logging (stderr + debug output)
    #[arg(long)]
    dev: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List scanned songs with library statistics
    Library {
        #[arg(long)]
        search: Option<String>,
    },
    /// List saved playlists
    Playlists,
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Fill the playlist with the first N library songs
        /// (library.default_playlist_size when N is left out)
        #[arg(long, value_name = "N")]
        from_library: Option<Option<usize>>,
    },
    Delete {
        name: String,
    },
    Show {
        name: String,
    },
    /// Append the first library song matching QUERY
    Add {
        name: String,
        query: String,
    },
    Remove {
        name: String,
        title: String,
    },
    Shuffle {
        name: String,
    },
    Reverse {
        name: String,
    },
    /// Play a playlist until it runs out. Type `help` while it plays for
    /// the queue, party and history controls.
    Play {
        name: String,
    },
}

impl Command {
    fn mutates_catalog(&self) -> bool {
        matches!(
            self,
            Command::Create { .. }
                | Command::Delete { .. }
                | Command::Add { .. }
                | Command::Remove { .. }
                | Command::Shuffle { .. }
                | Command::Reverse { .. }
        )
    }
}

fn init_logging(log_dir: &Path, dev: bool) -> Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    // Daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(log_dir, "setlist.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let base_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,setlist=debug"));

    let builder = tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(base_filter);

    if dev {
        let subscriber = builder.with_writer(file_writer.and(std::io::stderr)).finish();
        tracing::subscriber::set_global_default(subscriber)?;
        eprintln!("Dev mode: debug output goes to stderr and {}", log_dir.display());
    } else {
        let subscriber = builder.with_writer(file_writer).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    // Keep the writer alive for the whole process
    std::mem::forget(guard);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    init_logging(&config.log_directory, args.dev)?;
    info!("setlist starting up");

    let library = MusicScanner::new()
        .recursive(config.library.recursive)
        .scan_library(&config.music_directories);
    let store = CatalogStore::new(config.catalog_path.clone());
    let mut catalog = store.load(&library);

    let mutates = args.command.mutates_catalog();
    run_command(args.command, &config, &library, &mut catalog).await?;

    if mutates {
        store.save(&catalog)?;
    }
    Ok(())
}

async fn run_command(
    command: Command,
    config: &Config,
    library: &Library,
    catalog: &mut Catalog,
) -> Result<()> {
    match command {
        Command::Library { search } => {
            let songs = match &search {
                Some(query) => library.search(query),
                None => library.songs().iter().collect(),
            };
            for song in &songs {
                println!("{}  [{}]", song.display_line(), song.file_type());
            }

            let stats = library.statistics();
            println!(
                "\n{} songs, {} artists, {:.1} MB",
                stats.total_songs,
                stats.unique_artists,
                stats.total_size_mb()
            );
            for (file_type, count) in &stats.file_type_counts {
                println!("  {}: {}", file_type, count);
            }
        }
        Command::Playlists => {
            if catalog.is_empty() {
                println!("No playlists yet");
            }
            let current = catalog.current_name().map(str::to_string);
            for (name, entry) in catalog.iter() {
                let marker = if current.as_deref() == Some(name) { "*" } else { " " };
                println!(
                    "{} {} ({} songs) {}",
                    marker,
                    name,
                    entry.playlist.len(),
                    entry.description
                );
            }
        }
        Command::Create {
            name,
            description,
            from_library,
        } => match from_library {
            Some(count) => {
                let count = count.unwrap_or(config.library.default_playlist_size);
                let added = catalog.create_from_library(&name, library.songs(), count, &description)?;
                println!("Created '{}' with {} songs", name, added);
            }
            None => {
                catalog.create(&name, &description)?;
                println!("Created '{}'", name);
            }
        },
        Command::Delete { name } => {
            catalog.delete(&name)?;
            println!("Deleted '{}'", name);
        }
        Command::Show { name } => {
            let playlist = catalog
                .get(&name)
                .with_context(|| format!("No playlist named '{}'", name))?;
            if let Some(description) = catalog.description(&name).filter(|d| !d.is_empty()) {
                println!("{}", description);
            }
            for (index, song) in playlist.iter().enumerate() {
                println!("{:>3}. {}  {}", index + 1, song.display_line(), song.duration_string());
            }
        }
        Command::Add { name, query } => {
            let song = library
                .search(&query)
                .into_iter()
                .next()
                .cloned()
                .with_context(|| format!("Nothing in the library matches '{}'", query))?;
            let playlist = catalog
                .get_mut(&name)
                .with_context(|| format!("No playlist named '{}'", name))?;
            println!("Added {} to '{}'", song.display_line(), name);
            playlist.add_at_end(song);
        }
        Command::Remove { name, title } => {
            let playlist = catalog
                .get_mut(&name)
                .with_context(|| format!("No playlist named '{}'", name))?;
            let song = playlist.remove(&title)?;
            println!("Removed {} from '{}'", song.display_line(), name);
        }
        Command::Shuffle { name } => {
            catalog
                .get_mut(&name)
                .with_context(|| format!("No playlist named '{}'", name))?
                .shuffle();
            println!("Shuffled '{}'", name);
        }
        Command::Reverse { name } => {
            catalog
                .get_mut(&name)
                .with_context(|| format!("No playlist named '{}'", name))?
                .reverse();
            println!("Reversed '{}'", name);
        }
        Command::Play { name } => play(config, library, catalog, &name).await?,
    }

    Ok(())
}

async fn play(config: &Config, library: &Library, catalog: &mut Catalog, name: &str) -> Result<()> {
    let player = AudioPlayer::new(AudioConfig::from(config))?;
    let mut orchestrator = Orchestrator::new(player);

    let outcome = orchestrator.play_playlist(catalog, name)?;
    report(&mut orchestrator, catalog, outcome, name);

    let mut ticker = tokio::time::interval(Duration::from_millis(config.playback.poll_interval_ms.max(10)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut input = spawn_input_reader();
    let mut input_open = true;

    while orchestrator.attached_playlist().is_some() || orchestrator.now_playing().is_some() {
        tokio::select! {
            _ = ticker.tick() => {
                if !orchestrator.backend_mut().take_finished() {
                    continue;
                }
                let outcome = after_track(&mut orchestrator, catalog);
                report(&mut orchestrator, catalog, outcome, name);
            }
            line = input.recv(), if input_open => {
                let Some(line) = line else {
                    input_open = false;
                    continue;
                };
                match Control::parse(&line) {
                    Ok(Control::Stop) => break,
                    Ok(control) => control.apply(&mut orchestrator, library, catalog, name),
                    Err(e) => println!("{}", e),
                }
            }
            _ = &mut ctrl_c => {
                info!("Interrupted, stopping playback");
                break;
            }
        }
    }

    orchestrator.stop();
    println!("Played {} songs", orchestrator.history().len());
    Ok(())
}

/// Lines typed on stdin. A plain thread does the blocking reads so the
/// runtime never waits on the terminal at shutdown.
fn spawn_input_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Where the next song comes from: play-next queue, then the party queue,
/// then the attached playlist.
fn after_track(orchestrator: &mut Orchestrator<AudioPlayer>, catalog: &mut Catalog) -> PlayOutcome {
    if !orchestrator.play_next_queue().is_empty() {
        orchestrator.play_next_from_queue()
    } else if !orchestrator.party_queue().is_empty() {
        orchestrator.play_from_party_queue()
    } else {
        orchestrator.on_track_finished(catalog)
    }
}

/// Same order as a finished track, but the playlist is skipped explicitly
fn skip(orchestrator: &mut Orchestrator<AudioPlayer>, catalog: &mut Catalog) -> PlayOutcome {
    if orchestrator.play_next_queue().is_empty() && orchestrator.party_queue().is_empty() {
        orchestrator.skip_forward(catalog)
    } else {
        after_track(orchestrator, catalog)
    }
}

/// Print what happened; broken files are skipped so the loop never stalls on one
fn report(
    orchestrator: &mut Orchestrator<AudioPlayer>,
    catalog: &mut Catalog,
    mut outcome: PlayOutcome,
    name: &str,
) {
    loop {
        match outcome {
            PlayOutcome::Started(song) => println!("Now playing: {}", song.display_line()),
            PlayOutcome::Failed { song, reason } => {
                error!("Could not play {}: {}", song.display_line(), reason);
                println!("Skipping {}: {}", song.display_line(), reason);
                outcome = skip(orchestrator, catalog);
                continue;
            }
            PlayOutcome::Detached => println!("End of '{}'", name),
            other => debug!("Nothing to report for {:?}", other),
        }
        return;
    }
}

const CONTROLS_HELP: &str = "\
next | prev | pause | vol LEVEL | queue QUERY | party QUERY [#PRIORITY]
upvote TITLE | queues | history [QUERY] | stop";

/// A line typed while a playlist plays
#[derive(Debug, PartialEq)]
enum Control {
    Next,
    Prev,
    Pause,
    Volume(f32),
    /// Library search, first hit goes to the play-next queue
    Queue(String),
    Party { query: String, priority: i64 },
    Upvote(String),
    Queues,
    History(Option<String>),
    Help,
    Stop,
}

impl Control {
    fn parse(line: &str) -> std::result::Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let needs_arg = |what: &str| {
            if rest.is_empty() {
                Err(format!("'{}' needs {}", word, what))
            } else {
                Ok(rest.to_string())
            }
        };

        match word.to_lowercase().as_str() {
            "n" | "next" => Ok(Control::Next),
            "p" | "prev" => Ok(Control::Prev),
            "" | "pause" => Ok(Control::Pause),
            "vol" | "volume" => rest
                .parse::<f32>()
                .map(Control::Volume)
                .map_err(|_| format!("'{}' is not a volume between 0 and 1", rest)),
            "queue" => needs_arg("a search").map(Control::Queue),
            "party" => {
                let query = needs_arg("a search")?;
                // a trailing "#N" sets the priority
                match query.rsplit_once(" #") {
                    Some((title, priority)) => match priority.trim().parse::<i64>() {
                        Ok(priority) => Ok(Control::Party {
                            query: title.trim().to_string(),
                            priority,
                        }),
                        Err(_) => Ok(Control::Party { query, priority: 0 }),
                    },
                    None => Ok(Control::Party { query, priority: 0 }),
                }
            }
            "up" | "upvote" => needs_arg("a title").map(Control::Upvote),
            "queues" => Ok(Control::Queues),
            "history" => Ok(Control::History((!rest.is_empty()).then(|| rest.to_string()))),
            "help" | "?" => Ok(Control::Help),
            "q" | "quit" | "stop" => Ok(Control::Stop),
            _ => Err(format!("Unknown command '{}'. Try 'help'.", word)),
        }
    }

    fn apply(
        self,
        orchestrator: &mut Orchestrator<AudioPlayer>,
        library: &Library,
        catalog: &mut Catalog,
        name: &str,
    ) {
        match self {
            Control::Next => {
                let outcome = skip(orchestrator, catalog);
                report(orchestrator, catalog, outcome, name);
            }
            Control::Prev => {
                let outcome = orchestrator.skip_back(catalog);
                report(orchestrator, catalog, outcome, name);
            }
            Control::Pause => {
                if orchestrator.toggle_pause() {
                    println!("Paused");
                } else {
                    println!("Playing");
                }
            }
            Control::Volume(level) => {
                orchestrator.set_volume(level);
                println!("Volume {:.0}%", orchestrator.backend().volume() * 100.0);
            }
            Control::Queue(query) => match library.search(&query).first() {
                Some(&song) => {
                    println!("Up next: {}", song.display_line());
                    orchestrator.add_to_play_next(song.clone());
                }
                None => println!("Nothing in the library matches '{}'", query),
            },
            Control::Party { query, priority } => match library.search(&query).first() {
                Some(&song) => {
                    println!("Party queue: {} ({})", song.display_line(), priority);
                    orchestrator.add_to_party(song.clone(), priority);
                }
                None => println!("Nothing in the library matches '{}'", query),
            },
            Control::Upvote(title) => match orchestrator.upvote(&title) {
                Ok(priority) => println!("'{}' now has {} votes", title, priority),
                Err(e) => {
                    warn!("Upvote failed: {}", e);
                    println!("No '{}' in the party queue", title);
                }
            },
            Control::Queues => {
                println!("Play next:");
                for song in orchestrator.play_next_queue().iter() {
                    println!("  {}", song.display_line());
                }
                println!("Party:");
                for entry in orchestrator.party_queue().iter() {
                    println!("  [{}] {}", entry.priority, entry.song.display_line());
                }
            }
            Control::History(query) => {
                let songs = match &query {
                    Some(query) => orchestrator.history().search(query),
                    None => orchestrator.history().recent(10),
                };
                for song in songs {
                    println!("  {}", song.display_line());
                }
            }
            Control::Help => println!("{}", CONTROLS_HELP),
            // handled by the loop
            Control::Stop => {}
        }
    }
}
