//! speedtracker cli - Live speed statistics and the Telegram mini app launcher

use std::env;
use std::fs::{self, File};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use argopt::{cmd_group, subcmd};
use csv::Reader;
use serde::Deserialize;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use speedtracker::bot::{BotRunner, TelegramApi};
use speedtracker::config::{BotConfig, BotOptions, TrackerOptions};
use speedtracker::sources::{CsvSource, GpxSource, ReplaySource};
use speedtracker::{FieldsConfiguration, SpeedSnapshot, SpeedTracker, WatchOptions};

/// CLI of speedtracker - Speed statistics from your positions and the Telegram bot launching the tracker
#[cmd_group(commands = [bot, csv, gpx])]
fn main() -> Result<(), String> {}

/// Run the Telegram bot replying with the speed tracker mini app
#[subcmd]
fn bot(
    /// Tracker and bot configuration. Default: .speedtracker.yaml, ~/.speedtracker.yaml
    #[opt(long)]
    config: Option<String>,
) -> Result<(), String> {
    init_logging();

    let conf = load_configs(config);
    let bot_config = BotConfig::from_env().map_err(|e| e.to_string())?;

    let api = TelegramApi::new(&bot_config.token, conf.bot.poll_timeout_secs)
        .map_err(|e| e.to_string())?;

    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .map_err(|e| format!("Failed on set the signal handler: {}", e))?;

    let mut runner = BotRunner::new(api, &bot_config, &conf.bot);
    runner.run(&stop).map_err(|e| e.to_string())
}

/// Replay the positions of a CSV file through the speed tracker
#[subcmd]
fn csv(
    /// CSV file source
    csv_path: String,
    /// Tracker and fields configuration. Default: .speedtracker.yaml, ~/.speedtracker.yaml
    #[opt(long)]
    config: Option<String>,
    /// Print each update as JSON
    #[opt(long)]
    json: bool,
) -> Result<(), String> {
    init_logging();

    let csv = File::open(csv_path)
        .map_err(|e| format!("Failed on open the CSV file: {}", e))?;
    let rdr = Reader::from_reader(csv);

    let conf = load_configs(config);

    let source = CsvSource::new(rdr, Some(conf.fields.clone())).into_replay()?;

    replay(source, &conf, json)
}

/// Replay the track points of a GPX file through the speed tracker
#[subcmd]
fn gpx(
    /// GPX file source
    gpx_path: String,
    /// Tracker configuration. Default: .speedtracker.yaml, ~/.speedtracker.yaml
    #[opt(long)]
    config: Option<String>,
    /// Print each update as JSON
    #[opt(long)]
    json: bool,
) -> Result<(), String> {
    init_logging();

    let file = File::open(gpx_path)
        .map_err(|e| format!("Failed on open the GPX file: {}", e))?;

    let conf = load_configs(config);

    let source = GpxSource::read(file)?.into_replay();

    replay(source, &conf, json)
}

/// Run one tracking session over the whole source
fn replay(source: ReplaySource, conf: &Configs, json: bool) -> Result<(), String> {
    let mut tracker = SpeedTracker::new(source, conf.watch.clone(), conf.tracker.session());
    tracker.on_update(move |snapshot| print_snapshot(snapshot, json));

    tracker.start().map_err(|e| e.to_string())?;
    tracker.source_mut().replay();
    tracker.stop();

    tracker.check().map_err(|e| e.to_string())
}

fn print_snapshot(snapshot: &SpeedSnapshot, json: bool) {
    if json {
        match serde_json::to_string(snapshot) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed on serialize the update: {}", e),
        }
        return;
    }

    if let Some(error) = &snapshot.error_message {
        println!("error: {}", error);
        return;
    }

    if !snapshot.tracking_active {
        println!("tracking stopped, {} points collected", snapshot.sample_count);
        return;
    }

    let last_update = snapshot
        .last_update_timestamp
        .map(format_time)
        .unwrap_or_else(|| "-".to_string());

    println!(
        "{:>7.1} km/h | max {:.1} km/h | avg {:.1} km/h | {} points | last update {}",
        snapshot.current_speed_kph,
        snapshot.max_speed_kph,
        snapshot.average_speed_kph,
        snapshot.sample_count,
        last_update
    );
}

fn format_time(millis: i64) -> String {
    let format = format_description!("[hour]:[minute]:[second]");

    OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000)
        .ok()
        .and_then(|t| t.format(format).ok())
        .unwrap_or_else(|| millis.to_string())
}

fn init_logging() {
    let directives =
        env::var("RUST_LOG").unwrap_or_else(|_| "speedtracker=debug,info".to_owned());
    let env_filter = EnvFilter::builder().parse_lossy(directives);
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the current config
fn load_configs(provided: Option<String>) -> Configs {
    let mut options = vec![];

    if let Some(sprovided) = provided {
        options.push(sprovided);
    }

    options.push(".speedtracker.yaml".to_string());

    if let Some(home) = dirs::home_dir() {
        if let Some(shome) = home.to_str() {
            options.push(format!("{}/.speedtracker.yaml", shome));
        }
    }

    for fi in options {
        if let Ok(s) = fs::read_to_string(&fi) {
            match serde_yaml::from_str::<Configs>(&s) {
                Ok(conf) => return conf,
                Err(e) => {
                    warn!("Ignoring the invalid config {}: {}", fi, e);
                    break;
                }
            }
        }
    }

    Configs::default()
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct Configs {
    pub tracker: TrackerOptions,
    pub watch: WatchOptions,
    pub fields: FieldsConfiguration,
    pub bot: BotOptions,
}

#[test]
fn parse_configs() -> Result<(), String> {
    use std::time::Duration;

    use speedtracker::MaxSpeedPolicy;

    let yaml = "\ntracker:\n  window_size: 20\n";

    let conf: Configs = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;

    assert_eq!(
        Configs {
            tracker: TrackerOptions {
                window_size: 20,
                max_speed: MaxSpeedPolicy::ResetOnStart,
            },
            watch: WatchOptions {
                enable_high_accuracy: true,
                timeout: Duration::from_millis(5000),
                maximum_age: Duration::ZERO,
            },
            fields: FieldsConfiguration {
                time: "time".to_string(),
                coordinates: "coordinates".to_string(),
                speed: "speed".to_string(),
                flip_coordinates: false,
            },
            bot: BotOptions {
                poll_timeout_secs: 10,
            },
        },
        conf
    );

    let yaml = "\ntracker:\n  max_speed: keep_across_sessions\nwatch:\n  enable_high_accuracy: false\n  timeout_ms: 1000\n  maximum_age_ms: 250\nfields:\n  time: ts\n  flip_coordinates: true\nbot:\n  poll_timeout_secs: 30";

    let conf: Configs = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;

    assert_eq!(100, conf.tracker.window_size);
    assert_eq!(MaxSpeedPolicy::KeepAcrossSessions, conf.tracker.max_speed);
    assert!(!conf.watch.enable_high_accuracy);
    assert_eq!(Duration::from_millis(1000), conf.watch.timeout);
    assert_eq!(Duration::from_millis(250), conf.watch.maximum_age);
    assert_eq!("ts", conf.fields.time);
    assert_eq!("coordinates", conf.fields.coordinates);
    assert!(conf.fields.flip_coordinates);
    assert_eq!(30, conf.bot.poll_timeout_secs);

    Ok(())
}

#[test]
fn formats_update_time() {
    assert_eq!("00:05:00", format_time(1621814700000));
}
