/// Entry point and frame loop.

mod cli;
mod config;
mod domain;
mod error;
mod logging;
mod net;
mod sim;
mod ui;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};

use cli::Cli;
use config::ClientConfig;
use net::client::{server_url, ConnectionClient};
use net::envelope::Intent;
use sim::event::SessionEvent;
use sim::session::SessionState;
use ui::gamepad::GamepadState;
use ui::hud::{self, Layout};
use ui::input::{drain_terminal_events, Command, InputRouter, TermEvent};
use ui::renderer;
use ui::screen::{MapSurface, Screen};
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(10);

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (mut config, warnings) = ClientConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    logging::init(&config.log).context("could not start logging")?;
    config::report(&warnings);

    let url = server_url(&config.server.host, &config.server.path)
        .with_context(|| format!("bad server address {:?}", config.server.host))?;
    info!(%url, name = %config.server.name, "starting client");

    let sound = if config.sound_enabled { SoundEngine::new() } else { None };

    let mut screen = Screen::new();
    screen.init().context("terminal init failed")?;

    let client = ConnectionClient::connect(&url, &config.server.name);
    let result = client_loop(client, &mut screen, sound.as_ref(), &config);

    if let Err(e) = screen.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    result
}

fn client_loop(
    mut client: ConnectionClient,
    screen: &mut Screen,
    sound: Option<&SoundEngine>,
    config: &ClientConfig,
) -> anyhow::Result<()> {
    let mut session = SessionState::new();
    let mut router = InputRouter::from_overrides(&config.keys);
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let mut dirty = true;

    loop {
        // ── Network ──
        for received in client.poll() {
            let events = session.apply(received);
            dirty |= events.contains(&SessionEvent::Redraw);
            process_sound_events(sound, &events);
        }

        // ── Keyboard / terminal ──
        for event in drain_terminal_events() {
            match event {
                TermEvent::Key(key) => {
                    let Some(command) = router.handle_key(&key) else { continue };
                    match command {
                        Command::Quit => return Ok(()),
                        Command::Send(intent) => submit(&client, &session, config, &intent),
                        Command::FocusChanged(_) | Command::ChatEdited => {}
                    }
                    dirty = true;
                }
                TermEvent::Resize(w, h) => {
                    screen.resize(w as usize, h as usize)?;
                    dirty = true;
                }
            }
        }

        // ── Gamepad ──
        gp.update();
        if gp.focus_game_pressed() && router.focus_game().is_some() {
            dirty = true;
        }
        if let Some(intent) = gp.intent(router.focus()) {
            submit(&client, &session, config, &intent);
        }

        if dirty {
            draw(screen, &session, &router, &client, config)?;
            dirty = false;
        }

        std::thread::sleep(FRAME_SLEEP);
    }
}

/// Send an intent unless turn gating holds it back.
fn submit(client: &ConnectionClient, session: &SessionState, config: &ClientConfig, intent: &Intent) {
    if config.gate_turns && matches!(intent, Intent::Move { .. }) && session.awaiting_others() {
        debug!(?intent, "waiting for other players, move dropped");
        return;
    }
    if let Err(err) = client.send(intent) {
        warn!(%err, ?intent, "not sent");
    }
}

fn draw(
    screen: &mut Screen,
    session: &SessionState,
    router: &InputRouter,
    client: &ConnectionClient,
    config: &ClientConfig,
) -> anyhow::Result<()> {
    let (w, h) = screen.size();
    let layout = Layout::compute(w, h, config.display.panel_width);
    let frame = session.frame(config.display.autotile);

    let buf = screen.begin_frame();
    renderer::render(&frame, &mut MapSurface::new(&mut *buf, layout.map, config.display.glyph_columns));
    hud::compose(buf, &layout, session, router, client.state());
    screen.present()?;
    Ok(())
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[SessionEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            SessionEvent::TurnReady => sfx.play_turn_ready(),
            SessionEvent::ChatReceived => sfx.play_message(),
            SessionEvent::Disconnected => sfx.play_disconnect(),
            SessionEvent::Redraw | SessionEvent::Warning => {}
        }
    }
}
