use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use polar_core::{
    ArtNetSink, AudioDevice, ColorProgramEngine, ConfigManager, CrossfadeTransport, LinkMonitor,
    MemoryChannel, PlaybackChannel, SerialDeviceProbe, ShowCommand, ShowRunner,
    ShowSettings, ShowState, SystemClock,
};
use tokio::sync::{mpsc, watch};

mod input;
mod terminal_sink;

use input::{spawn_input_thread, KeyMap};
use terminal_sink::TerminalSink;

/// Plays the show's cues and drives the fixture strip in time with them.
#[derive(Parser, Debug)]
#[command(name = "polar")]
#[command(about = "Synchronized audio and lighting show controller")]
struct Args {
    /// Path to the config file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Art-Net destination IP address (optional - if not provided, broadcast mode will be used)
    #[arg(long, value_parser = parse_ip)]
    dest_ip: Option<IpAddr>,

    /// Disable Art-Net output
    #[arg(long)]
    no_artnet: bool,

    /// Do not open the lighting link device
    #[arg(long)]
    offline: bool,

    /// Run on the virtual clock only, without an audio device
    #[arg(long)]
    silent: bool,

    /// Start the first cue as soon as the show is up
    #[arg(long)]
    autoplay: bool,

    /// Do not draw the fixture strip or read keys
    #[arg(long)]
    headless: bool,
}

fn parse_ip(s: &str) -> Result<IpAddr, String> {
    s.parse().map_err(|e| format!("Invalid IP address: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = ConfigManager::new(Some(args.config.clone()));
    let mut settings = config.load_or_default();
    if let Some(ip) = args.dest_ip {
        settings.artnet_dest_ip = Some(ip);
    }
    settings.artnet_enabled &= !args.no_artnet;
    settings.online_mode &= !args.offline;
    settings.ensure_dirs();

    log::info!(
        "{} fixtures at {}Hz, music in {}",
        settings.fixture_count,
        settings.tick_hz,
        settings.music_dir.display()
    );

    let device = if args.silent {
        None
    } else {
        match AudioDevice::open_default() {
            Ok(device) => Some(device),
            Err(e) => {
                log::warn!("{}, running silent", e);
                None
            }
        }
    };

    match &device {
        Some(device) => run_show(device.channel(), device.channel(), &settings, &args).await,
        None => run_show(MemoryChannel::new(), MemoryChannel::new(), &settings, &args).await,
    }
}

async fn run_show<C: PlaybackChannel>(
    primary: C,
    overlay: C,
    settings: &ShowSettings,
    args: &Args,
) -> anyhow::Result<()> {
    let (monitor, link_rx) = LinkMonitor::new(
        SerialDeviceProbe::new(&settings.link_device),
        settings.online_mode,
    );
    let online = monitor.online_switch();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let link_task = tokio::spawn(monitor.run(shutdown_rx));

    let transport = CrossfadeTransport::new(primary, overlay, Arc::new(SystemClock));
    let engine =
        ColorProgramEngine::new(settings.fixture_count).with_rockin_source(settings.rockin_source);
    let mut state = ShowState::new(transport, settings.cue_assets(), engine);
    state.initialize();
    if args.autoplay {
        state.play();
    }
    let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());

    let mut runner = ShowRunner::new(state, settings.tick_hz);
    if settings.artnet_enabled {
        match ArtNetSink::new(settings.artnet_mode(), settings.artnet_universe) {
            Ok(sink) => {
                log::info!("Art-Net output to {}", sink.destination());
                runner.add_sink(Box::new(sink));
            }
            Err(e) => log::warn!("Art-Net output disabled: {}", e),
        }
    }

    let (command_tx, command_rx) = mpsc::channel(32);
    let input = if args.headless {
        None
    } else {
        runner.add_sink(Box::new(TerminalSink::new(snapshot_rx.clone())));
        let keymap = KeyMap {
            fade_out_ms: settings.fade_out_ms,
        };
        match spawn_input_thread(keymap, command_tx.clone(), snapshot_rx.clone(), online) {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Key input unavailable: {}", e);
                None
            }
        }
    };

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = command_tx.send(ShowCommand::Shutdown).await;
        }
    });

    let runner = runner.run(command_rx, link_rx, snapshot_tx).await;
    log::info!(
        "Show stopped on {:?} after {} ticks",
        runner.state().current_cue(),
        runner.ticks()
    );

    let _ = shutdown_tx.send(true);
    if let Err(e) = link_task.await {
        log::warn!("Link monitor ended abnormally: {}", e);
    }
    if let Some(handle) = input {
        let _ = handle.join();
    }
    if !args.headless {
        println!();
    }
    Ok(())
}
