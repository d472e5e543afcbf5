//! # Teleop Input
//!
//! Keyboard, gamepad and SpaceMouse input for teleoperation stations.
//!
//! This application polls evdev controllers once per frame and dispatches the
//! actions configured in a TOML file. Actions either log or publish the
//! triggering device's state as JSON Lines Joy messages on stdout.

use anyhow::{Context as _, Result};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use teleop_input::config::{Config, Effect, LoggingConfig};
use teleop_input::devices::evdev_host::EvdevGamepads;
use teleop_input::devices::keyboard::spawn_keyboard_readers;
use teleop_input::input::frame_clock::{frame_interval, FrameClock};
use teleop_input::input::host::HostEvents;
use teleop_input::input::{Action, Context, InputPoller, PollerState};
use teleop_input::joy::JoyPublisher;

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Number of frames between status log messages
const LOG_INTERVAL_FRAMES: u64 = 3600;

/// Name of the rotated log file
const LOG_FILE_PREFIX: &str = "teleop-input.log";

type SharedPublisher<W> = Arc<Mutex<JoyPublisher<W>>>;

/// Initialize logging to stderr and, if configured, a daily-rotated file
///
/// The returned guard flushes the file writer when dropped.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    let console = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .init();
            None
        }
    }
}

/// One-line description of a dispatch context for the log
fn context_summary(context: &Context) -> String {
    match context {
        Context::None => "triggered directly".to_string(),
        Context::Keyboard => "keyboard".to_string(),
        Context::Gamepad { slot, id, .. } => format!("gamepad {} ({})", slot, id),
        Context::GamepadButton { slot, id, index } => {
            format!("button {} on gamepad {} ({})", index, slot, id)
        }
        Context::GamepadAxis {
            slot,
            id,
            index,
            value,
        } => format!("axis {} = {:.3} on gamepad {} ({})", index, value, slot, id),
        Context::Spacemouse { slot, id, .. } => format!("spacemouse {} ({})", slot, id),
    }
}

/// Build poller actions from the `[[actions]]` entries
fn build_actions<W>(config: &Config, publisher: &SharedPublisher<W>) -> Result<Vec<Action>>
where
    W: Write + Send + 'static,
{
    config
        .actions
        .iter()
        .map(|entry| {
            let name = entry.name.clone();
            let action = match entry.effect {
                Effect::Log => Action::new(&entry.name, entry.bindings.clone(), move |ctx| {
                    info!("Action '{}': {}", name, context_summary(ctx));
                }),
                Effect::PublishJoy => {
                    let publisher = Arc::clone(publisher);
                    Action::new(&entry.name, entry.bindings.clone(), move |ctx| {
                        let Ok(mut publisher) = publisher.lock() else {
                            warn!("Joy publisher unavailable for action '{}'", name);
                            return;
                        };
                        match publisher.publish_context(ctx) {
                            Ok(true) => {}
                            Ok(false) => debug!(
                                "Action '{}' has no Joy state for {}",
                                name,
                                context_summary(ctx)
                            ),
                            Err(e) => warn!("Failed to publish Joy message for '{}': {}", name, e),
                        }
                    })
                }
            };
            action.with_context(|| format!("invalid action '{}'", entry.name))
        })
        .collect()
}

/// Main entry point for Teleop Input
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, or `config/default.toml`)
///    - Set up logging with tracing subscriber
///    - Check evdev support, subscribe to host events, spawn keyboard readers
///
/// 2. **Main Loop**
///    - Run one poller frame per tick when a frame was requested
///    - Dispatch key and hot-plug events as they arrive
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if the configuration cannot be loaded or an action is
/// invalid. A host without controller support is not an error.
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let _log_guard = init_logging(&config.logging);

    info!("Teleop Input v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from {}", config_path.display());

    let publisher = Arc::new(Mutex::new(JoyPublisher::new(
        std::io::stdout(),
        config.output.frame_id.clone(),
        config.input.button_threshold,
    )));
    let actions = build_actions(&config, &publisher)?;

    let (events, mut event_rx) = HostEvents::channel();
    let clock = FrameClock::new();
    let gamepads = EvdevGamepads::new(&config.devices.input_dir, events.clone())
        .with_rescan_interval(config.devices.rescan_interval());

    let mut poller = InputPoller::new(
        actions,
        config.input.poller_settings(),
        Box::new(gamepads),
        Box::new(events.clone()),
        Box::new(clock.clone()),
    );

    if poller.state() == PollerState::Unsupported {
        warn!("No input devices available, exiting");
        return Ok(());
    }

    let readers = if config.devices.keyboard {
        spawn_keyboard_readers(&config.devices.input_dir, events.clone()).unwrap_or_else(|e| {
            warn!("Keyboard input disabled: {}", e);
            Vec::new()
        })
    } else {
        Vec::new()
    };

    poller.start();

    let settings = poller.settings();
    debug!(
        "Button threshold {}, SpaceMouse markers {:?}, ignored markers {:?}",
        settings.button_threshold, settings.spacemouse_markers, settings.ignored_markers
    );

    let mut ticker = frame_interval(config.input.frame_rate_hz);
    info!(
        "Polling at {}Hz with actions: {}",
        config.input.frame_rate_hz,
        poller.action_names().join(", ")
    );
    info!("Press Ctrl+C to exit");

    let mut frame_count: u64 = 0;
    let mut dispatch_count: u64 = 0;

    // Main control loop
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !clock.take_request() {
                    continue;
                }

                dispatch_count += poller.on_frame() as u64;
                frame_count += 1;

                if frame_count % LOG_INTERVAL_FRAMES == 0 {
                    info!("Processed {} frames, {} dispatches", frame_count, dispatch_count);
                }
            }

            Some(event) = event_rx.recv() => {
                poller.handle_host_event(event);
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                poller.stop();
                break;
            }
        }
    }

    for reader in readers {
        reader.abort();
    }

    let published = publisher.lock().map(|p| p.published()).unwrap_or(0);
    info!(
        "Total frames: {}, dispatches: {}, Joy messages: {}",
        frame_count, dispatch_count, published
    );

    Ok(())
}
