//! petal-arena-client binary
//!
//! Headless terminal client: connects to an arena server, runs the frame
//! loop at `frame_rate_hz` against a recording renderer, and reads player
//! commands from stdin.
//!
//! ## Configuration (TOML / env via `config` crate, then CLI flags)
//!
//! | Key                        | Default               | Description                  |
//! |----------------------------|-----------------------|------------------------------|
//! | `ARENA_ENDPOINT`           | `ws://localhost:8080` | Server WebSocket URL         |
//! | `ARENA_PLAYER_NAME`        | `Anonymous`           | Name sent with `join`        |
//! | `ARENA_MOVEMENT_MODE`      | `intent`              | `intent` or `predicted`      |
//! | `ARENA_PICKUP_RADIUS`      | `30`                  | Ground item pickup radius    |
//! | `ARENA_FRAME_RATE_HZ`      | `60`                  | Frame loop rate              |
//!
//! ## Commands
//!
//! ```text
//! hold <w|a|s|d|r>       press a key        release <key>   let go of a key
//! stop                   release everything
//! drag <inv|hot> <n> <inv|hot> <m>
//! select <inv|hot> <n>   combine
//! name <text>            say <text>
//! status                 quit
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use petal_arena::{
    bridge::{self, BridgeConfig},
    config,
    input::{InputEvent, Key, SlotRef},
    ArenaClient, DrawList, MovementMode,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "petal-arena-client", about = "Petal Arena terminal client", version)]
struct Args {
    /// TOML config file
    #[arg(long, env = "ARENA_CONFIG")]
    config: Option<PathBuf>,

    /// Server WebSocket URL (overrides config)
    #[arg(long)]
    endpoint: Option<String>,

    /// Player name (overrides config)
    #[arg(long)]
    name: Option<String>,

    /// Report predicted positions instead of movement intents
    #[arg(long)]
    predicted: bool,

    /// Seconds between HUD log lines
    #[arg(long, env = "ARENA_HUD_INTERVAL", default_value_t = 5)]
    hud_interval: u64,
}

// ---------------------------------------------------------------------------
// Console commands
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
enum Command {
    Input(Vec<InputEvent>),
    Status,
    Quit,
}

fn parse_slot(container: &str, slot: &str) -> Option<SlotRef> {
    let slot = slot.parse().ok()?;
    match container {
        "inv" | "inventory" => Some(SlotRef::inventory(slot)),
        "hot" | "hotbar" => Some(SlotRef::hotbar(slot)),
        _ => None,
    }
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let args: Vec<&str> = rest.split_whitespace().collect();
    let cmd = match (verb, args.as_slice()) {
        ("hold", [k]) => Command::Input(vec![InputEvent::KeyDown(Key::from_name(k)?)]),
        ("release", [k]) => Command::Input(vec![InputEvent::KeyUp(Key::from_name(k)?)]),
        ("stop", []) => Command::Input(
            [Key::Up, Key::Down, Key::Left, Key::Right, Key::Retract]
                .into_iter()
                .map(InputEvent::KeyUp)
                .collect(),
        ),
        ("drag", [fc, fs, tc, ts]) => Command::Input(vec![
            InputEvent::DragStart(parse_slot(fc, fs)?),
            InputEvent::Drop(parse_slot(tc, ts)?),
        ]),
        ("select", [c, s]) => Command::Input(vec![InputEvent::Select(parse_slot(c, s)?)]),
        ("combine", []) => Command::Input(vec![InputEvent::Combine]),
        ("name", _) if !rest.trim().is_empty() => {
            Command::Input(vec![InputEvent::SetName(rest.to_string())])
        }
        ("say", _) if !rest.trim().is_empty() => {
            Command::Input(vec![InputEvent::Chat(rest.to_string())])
        }
        ("status", []) => Command::Status,
        ("quit" | "exit", []) => Command::Quit,
        _ => return None,
    };
    Some(cmd)
}

async fn read_console(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match parse_command(&line) {
                Some(cmd) => {
                    if tx.send(cmd).await.is_err() {
                        return;
                    }
                }
                None => log::warn!("unrecognised command: {}", line.trim()),
            },
            Ok(None) => return,
            Err(e) => {
                log::warn!("stdin closed: {}", e);
                return;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("petal_arena=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut cfg = config::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(endpoint) = args.endpoint {
        cfg.endpoint = endpoint;
    }
    if let Some(name) = args.name {
        cfg.player_name = name;
    }
    if args.predicted {
        cfg.movement_mode = MovementMode::Predicted;
    }

    log::info!(
        "Starting petal-arena-client (endpoint='{}', name='{}', mode={:?}, {} Hz)",
        cfg.endpoint,
        cfg.player_name,
        cfg.movement_mode,
        cfg.frame_rate_hz,
    );

    let handle = bridge::spawn(BridgeConfig::from(&cfg)).context("spawning bridge thread")?;
    let frame_period = Duration::from_secs_f32(1.0 / cfg.frame_rate_hz);
    let mut client = ArenaClient::new(cfg, handle);

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(32);
    tokio::spawn(read_console(cmd_tx));

    let mut ticker = tokio::time::interval(frame_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let hud_every = Duration::from_secs(args.hud_interval.max(1));
    let mut last_frame = Instant::now();
    let mut last_hud = Instant::now();
    let mut last_notice: Option<String> = None;
    let mut renderer = DrawList::new();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                let dt = now.duration_since(last_frame).as_secs_f32();
                last_frame = now;

                let report = client.frame(dt, &mut renderer);
                if !report.picked_up.is_empty() {
                    log::info!("picked up {:?}", report.picked_up);
                }
                if client.take_respawn_notice() {
                    last_notice = client.notice().map(str::to_owned);
                    log::info!("{}", petal_arena::client::RESPAWN_NOTICE);
                } else if client.notice().map(str::to_owned) != last_notice {
                    last_notice = client.notice().map(str::to_owned);
                    if let Some(n) = &last_notice {
                        log::info!("{}", n);
                    }
                }
                if now.duration_since(last_hud) >= hud_every {
                    last_hud = now;
                    log_status(&client, &renderer);
                }
            }
            cmd = cmd_rx.recv() => match cmd {
                Some(Command::Input(events)) => {
                    for ev in events {
                        client.queue_input(ev);
                    }
                }
                Some(Command::Status) => log_status(&client, &renderer),
                Some(Command::Quit) | None => break,
            },
            _ = &mut shutdown => {
                log::info!("Shutting down");
                break;
            }
        }
    }

    let stats = client.stats();
    log::info!(
        "frames={} snapshots={} (discarded {}) sent={} pickups={}",
        stats.frames,
        stats.snapshots_applied,
        stats.snapshots_discarded,
        stats.messages_sent,
        stats.pickups,
    );
    Ok(())
}

fn log_status<C: petal_arena::Connection>(client: &ArenaClient<C>, renderer: &DrawList) {
    let world = client.world();
    log::info!(
        "[{}] {} | players={} hostiles={} ground={} draw_cmds={}",
        client.status().label(),
        client.hud_line().unwrap_or_else(|| "waiting for spawn".into()),
        world.player_count(),
        world.hostile_count(),
        world.ground_item_count(),
        renderer.len(),
    );
    let chat: Vec<_> = client.chat_history().collect();
    for line in &chat[chat.len().saturating_sub(3)..] {
        log::info!("<{}> {}", line.from, line.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_drag_into_drag_and_drop() {
        assert_eq!(
            parse_command("drag inv 2 hot 1"),
            Some(Command::Input(vec![
                InputEvent::DragStart(SlotRef::inventory(2)),
                InputEvent::Drop(SlotRef::hotbar(1)),
            ]))
        );
    }

    #[test]
    fn parses_free_text_commands() {
        assert_eq!(
            parse_command("say hello there"),
            Some(Command::Input(vec![InputEvent::Chat("hello there".into())]))
        );
        assert_eq!(parse_command("say"), None);
        assert_eq!(parse_command("hold q"), None);
        assert_eq!(parse_command("status"), Some(Command::Status));
    }
}
