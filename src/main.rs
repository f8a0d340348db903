use ampire::app::{self, App};
use ampire::audio::{AudioDevice, NullDevice, RodioDevice};
use ampire::clock::MonotonicClock;
use ampire::config;
use ampire::library;
use ampire::model::{Playlist, Settings};
use ampire::notify::StatusNotifier;
use ampire::player::Player;
use ampire::registry::Registry;
use ampire::store::PlaylistStore;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const NULL_AUDIO_ENV: &str = "AMPIRE_NULL_AUDIO";
const LOG_ENV: &str = "AMPIRE_LOG";

#[derive(Debug, Default)]
struct CliArgs {
    dirs: Vec<PathBuf>,
    help: bool,
    recursive: bool,
    clear: bool,
    notify: bool,
    list_saves: bool,
    no_logo: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = parse_args(env::args().skip(1).collect())?;
    if args.help {
        print_help();
        return Ok(());
    }

    let root = config::ensure_config_dir()?;
    let _log_guard = init_logging(&config::log_dir(&root));
    let store = PlaylistStore::new(config::playlists_path(&root));

    if args.clear {
        store.clear()?;
        if args.dirs.is_empty() {
            println!("cleared saved playlists");
            return Ok(());
        }
    }

    if args.list_saves {
        for playlist in store.read_all_playlists()? {
            println!("{} ({} tracks)", playlist.name, playlist.tracks.len());
        }
        return Ok(());
    }

    let stored_settings = config::load_settings_from(&root).unwrap_or_else(|err| {
        warn!("ignoring unreadable settings: {err:#}");
        Settings::default()
    });
    let mut settings = stored_settings.clone();
    settings.recursive |= args.recursive;
    settings.notify_on_change |= args.notify;
    settings.show_logo &= !args.no_logo;

    let mut playlists = Vec::new();
    if !args.dirs.is_empty() {
        let paths = library::collect_tracks(&args.dirs, settings.recursive);
        playlists.push(Playlist::from_cli(paths));
    }
    playlists.extend(store.read_all_playlists()?);
    info!(
        playlists = playlists.len(),
        tracks = playlists.iter().map(|playlist| playlist.tracks.len()).sum::<usize>(),
        "starting ampire"
    );

    let device: Box<dyn AudioDevice> = if env::var_os(NULL_AUDIO_ENV).is_some() {
        Box::new(NullDevice::new())
    } else {
        Box::new(RodioDevice::new().context("failed to open audio output")?)
    };

    let registry = Registry::new(playlists, settings.page_size);
    let player = Player::new(
        registry,
        device,
        Box::new(MonotonicClock::new()),
        Box::new(StatusNotifier::new()),
        settings,
    )
    .with_store(store);

    let final_settings = app::run(App::new(player))?;
    let to_save = Settings {
        volume: final_settings.volume,
        ..stored_settings
    };
    if let Err(err) = config::save_settings_to(&root, &to_save) {
        warn!("failed to save settings: {err:#}");
    }
    Ok(())
}

fn init_logging(log_dir: &Path) -> Option<WorkerGuard> {
    std::fs::create_dir_all(log_dir).ok()?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "ampire.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .ok()?;
    Some(guard)
}

fn parse_args(args: Vec<String>) -> Result<CliArgs> {
    let mut out = CliArgs::default();
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => out.help = true,
            "-r" | "--recursive" => out.recursive = true,
            "-c" | "--clear" => out.clear = true,
            "--notif" => out.notify = true,
            "-s" | "--saves" => out.list_saves = true,
            "--no-logo" => out.no_logo = true,
            flag if flag.starts_with('-') => anyhow::bail!("invalid flag: {flag}"),
            dir => out.dirs.push(PathBuf::from(dir)),
        }
    }
    Ok(out)
}

fn print_help() {
    println!("ampire [dirs...] [options]");
    println!("  -h, --help        Show this help");
    println!("  -r, --recursive   Descend into subdirectories");
    println!("  -c, --clear       Clear saved playlists");
    println!("      --notif       Notify on track change");
    println!("  -s, --saves       List saved playlists");
    println!("      --no-logo     Hide the logo");
}
