use std::path::PathBuf;
use std::process::Stdio;
use std::sync::mpsc::{self, Sender};

use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::{info, trace, warn};

mod app;
mod config;
mod ui;

use app::{ControlRequest, EngineEvent, InspectorApp};
use config::{load_settings, InspectorSettings, RECOMMENDED_MIN_SLEEP_MS};

#[derive(Clone)]
struct ChannelWriter {
    sender: Sender<String>,
}

impl std::io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = String::from_utf8(buf.to_vec()) {
            let _ = self.sender.send(text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal spectator for Halite engine games", long_about = None)]
struct Cli {
    /// Settings file. Defaults to $HALITE_INSPECTOR_SETTINGS, then ./settings.json.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Engine executable, overriding the settings file.
    #[arg(long)]
    engine: Option<PathBuf>,
    /// Arguments handed to the engine, typically the bot commands.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    engine_args: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let (log_tx, log_rx) = mpsc::channel::<String>();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .with_ansi(false)
        .with_writer(move || ChannelWriter {
            sender: log_tx.clone(),
        })
        .init();

    let cli = Cli::parse();
    let (mut settings, source) =
        load_settings(cli.settings.as_deref()).wrap_err("could not load inspector settings")?;
    if let Some(engine) = cli.engine {
        settings.engine = engine;
    }
    info!(?source, engine = %settings.engine.display(), "settings.loaded");

    let sleep = settings.sleep_ms();
    if sleep < RECOMMENDED_MIN_SLEEP_MS {
        warn!(
            sleep,
            "Engine sleep below {}ms; the viewer may fall behind", RECOMMENDED_MIN_SLEEP_MS
        );
    }

    let (event_tx, event_rx) = unbounded_channel::<EngineEvent>();
    let (control_tx, mut control_rx) = unbounded_channel::<ControlRequest>();

    let mut child = spawn_engine(&settings, &cli.engine_args)?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| eyre!("engine stdout was not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| eyre!("engine stderr was not captured"))?;
    tokio::spawn(pump_lines(stdout, event_tx.clone(), EngineEvent::Stdout));
    tokio::spawn(pump_lines(stderr, event_tx.clone(), EngineEvent::Stderr));

    let prefs = settings.prefs;
    let quit_tx = control_tx.clone();
    let ui_handle = std::thread::spawn(move || -> Result<()> {
        let result =
            InspectorApp::new(event_rx, control_tx, log_rx, prefs).and_then(|app| app.run());
        let _ = quit_tx.send(ControlRequest::Quit);
        result
    });

    let mut engine_running = true;
    loop {
        tokio::select! {
            request = control_rx.recv() => match request {
                Some(ControlRequest::StopEngine) => {
                    if engine_running {
                        stop_engine(&mut child);
                    }
                }
                Some(ControlRequest::Quit) | None => {
                    if engine_running {
                        stop_engine(&mut child);
                    }
                    break;
                }
            },
            status = child.wait(), if engine_running => {
                engine_running = false;
                let code = match status {
                    Ok(status) => status.code(),
                    Err(err) => {
                        warn!("Failed to wait on engine: {}", err);
                        None
                    }
                };
                let _ = event_tx.send(EngineEvent::Exited(code));
            }
        }
    }

    ui_handle
        .join()
        .map_err(|_| eyre!("inspector UI thread panicked"))??;
    Ok(())
}

fn spawn_engine(settings: &InspectorSettings, user_args: &[String]) -> Result<Child> {
    let args = settings.engine_command_args(user_args);
    info!(engine = %settings.engine.display(), ?args, "engine.spawn");
    Command::new(&settings.engine)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .wrap_err_with(|| format!("failed to launch engine {}", settings.engine.display()))
}

fn stop_engine(child: &mut Child) {
    match child.start_kill() {
        Ok(()) => info!("engine.stop"),
        Err(err) => warn!("Failed to stop engine: {}", err),
    }
}

async fn pump_lines<R>(
    reader: R,
    sender: UnboundedSender<EngineEvent>,
    wrap: fn(String) -> EngineEvent,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                trace!(bytes = line.len(), "engine.line");
                if sender.send(wrap(line)).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                warn!("Engine stream error: {}", err);
                break;
            }
        }
    }
}
