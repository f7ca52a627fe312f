use anyhow::{Context, Result};
use console::{style, Key, Term};
use keypoint_config::{Config, EngineConfig, PlayerConfig};
use keypoint_core::BookSummary;
use keypoint_engine::{NearDoubleSpeed, PlaybackEngine, SimulatedEngine};
use keypoint_player::{
    Intent, PlayerHandle, PlayerNotice, PlayerSession, PlayerSettings, PlayerState, PlayerView,
};
use keypoint_store::{
    GateHandle, GateNotice, GateSession, GateSettings, GateState, InMemoryStore, Product,
    StoreClient,
};
use std::sync::Arc;
use tokio::sync::mpsc;

const BAR_WIDTH: usize = 40;

/// What a key press asks for
#[derive(Debug, Clone, PartialEq)]
enum KeyAction {
    TogglePlay,
    Player(Intent),
    Buy,
    Retry,
    Quit,
}

fn key_action(key: &Key) -> Option<KeyAction> {
    let action = match key {
        Key::Char(' ') => KeyAction::TogglePlay,
        Key::Char('l') | Key::ArrowRight => KeyAction::Player(Intent::SkipForward),
        Key::Char('h') | Key::ArrowLeft => KeyAction::Player(Intent::SkipBackward),
        Key::Char('n') => KeyAction::Player(Intent::NextChapter),
        Key::Char('p') => KeyAction::Player(Intent::PreviousChapter),
        Key::Char('s') => KeyAction::Player(Intent::CycleSpeed),
        Key::Char('b') => KeyAction::Buy,
        Key::Char('r') => KeyAction::Retry,
        Key::Char('q') | Key::Escape => KeyAction::Quit,
        _ => return None,
    };
    Some(action)
}

fn toggle_intent(view: &PlayerView) -> Intent {
    if view.is_playing {
        Intent::Pause
    } else {
        Intent::Play
    }
}

fn player_settings(config: &PlayerConfig) -> PlayerSettings {
    PlayerSettings {
        skip_forward: config.skip_forward(),
        skip_backward: config.skip_backward(),
        event_buffer: config.event_buffer,
    }
}

fn build_engine(config: &EngineConfig) -> Arc<dyn PlaybackEngine> {
    let engine = SimulatedEngine::new(config.tick_interval());
    if config.clamp_double_speed {
        Arc::new(NearDoubleSpeed::with_substitute(
            engine,
            config.double_speed_multiplier,
        ))
    } else {
        Arc::new(engine)
    }
}

fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "=".repeat(filled), " ".repeat(width - filled))
}

/// Reads keys on a plain thread, since the terminal read blocks
fn spawn_key_reader(term: Term) -> mpsc::Receiver<Key> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || loop {
        match term.read_key() {
            Ok(key) => {
                if tx.blocking_send(key).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::debug!("Key reader stopped: {}", e);
                break;
            }
        }
    });
    rx
}

/// Runs the entitlement gate and then the player for one book
pub async fn start_playback(
    book: BookSummary,
    product: Product,
    config: &Config,
    purchased: bool,
) -> Result<()> {
    let mut store = InMemoryStore::new().with_product(product);
    if purchased {
        store = store.with_active(book.purchase_id.clone());
    }
    let store: Arc<dyn StoreClient> = Arc::new(store);

    let gate_settings = GateSettings {
        fetch_timeout: config.store.fetch_timeout(),
    };
    let (gate, gate_handle, mut gate_notices) =
        GateSession::new(book.clone(), store, gate_settings);
    let gate_task = tokio::spawn(gate.run());

    let term = Term::stdout();
    if term.hide_cursor().is_err() {
        eprintln!("Warning: Failed to hide cursor");
    }
    let mut keys = spawn_key_reader(term.clone());

    let result = match wait_for_player(&term, &mut keys, &gate_handle, &mut gate_notices).await
    {
        Ok(true) => {
            let state = PlayerState::with_speed(book, config.player.default_speed());
            let (session, handle, mut notices) = PlayerSession::with_state(
                state,
                build_engine(&config.engine),
                player_settings(&config.player),
            );
            let player_task = tokio::spawn(session.run());

            let result = player_loop(
                &term,
                &mut keys,
                &handle,
                &mut notices,
                &gate_handle,
                &mut gate_notices,
            )
            .await;

            let _ = handle.shutdown().await;
            match player_task.await {
                Ok(state) => log::info!(
                    "Left {} at key point {}",
                    state.book().title,
                    state.current_chapter_index() + 1
                ),
                Err(e) => log::warn!("Player session ended abnormally: {}", e),
            }
            result
        }
        Ok(false) => Ok(()),
        Err(e) => Err(e),
    };

    let _ = gate_handle.shutdown().await;
    if let Err(e) = gate_task.await {
        log::warn!("Gate session ended abnormally: {}", e);
    }
    let _ = term.show_cursor();

    result
}

/// Shows the gate until the player may open. Returns false if the listener
/// quit first.
async fn wait_for_player(
    term: &Term,
    keys: &mut mpsc::Receiver<Key>,
    gate: &GateHandle,
    notices: &mut mpsc::UnboundedReceiver<GateNotice>,
) -> Result<bool> {
    loop {
        draw_gate(term, &gate.state())?;

        tokio::select! {
            notice = notices.recv() => match notice {
                Some(GateNotice::PlayerReady) => return Ok(true),
                Some(notice) => log::debug!("Gate notice before player: {:?}", notice),
                None => anyhow::bail!("Entitlement gate stopped unexpectedly"),
            },
            key = keys.recv() => match key.as_ref().and_then(key_action) {
                Some(KeyAction::Retry) => gate.retry().await?,
                Some(KeyAction::Quit) => return Ok(false),
                Some(_) => {}
                None if key.is_none() => return Ok(false),
                None => {}
            },
        }
    }
}

async fn player_loop(
    term: &Term,
    keys: &mut mpsc::Receiver<Key>,
    player: &PlayerHandle,
    player_notices: &mut mpsc::UnboundedReceiver<PlayerNotice>,
    gate: &GateHandle,
    gate_notices: &mut mpsc::UnboundedReceiver<GateNotice>,
) -> Result<()> {
    let mut views = player.subscribe();
    let mut gate_states = gate.subscribe();
    let mut status: Option<String> = None;

    loop {
        let view = views.borrow_and_update().clone();
        let gate_state = gate_states.borrow_and_update().clone();
        draw_player(term, &view, &gate_state, status.as_deref())?;

        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = gate_states.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            Some(notice) = player_notices.recv() => {
                status = Some(match notice {
                    PlayerNotice::ChapterChanged { index, title } => {
                        format!("Now playing key point {}: {}", index + 1, title)
                    }
                    PlayerNotice::Error(e) => e.user_message(),
                });
            }
            Some(notice) = gate_notices.recv() => {
                status = match notice {
                    GateNotice::PaywallDismissed => Some("Thanks for subscribing!".to_string()),
                    GateNotice::Error(e) => Some(e.user_message()),
                    GateNotice::PlayerReady => status,
                };
            }
            key = keys.recv() => {
                let Some(key) = key else { break };
                let unlocked = gate.state().is_unlocked();
                match key_action(&key) {
                    Some(KeyAction::Quit) => break,
                    Some(KeyAction::Buy) => gate.purchase().await?,
                    Some(KeyAction::Retry) => gate.retry().await?,
                    Some(KeyAction::TogglePlay) if unlocked => {
                        player.send(toggle_intent(&player.view())).await?
                    }
                    Some(KeyAction::Player(intent)) if unlocked => player.send(intent).await?,
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

fn draw_gate(term: &Term, gate: &GateState) -> Result<()> {
    term.clear_screen().context("Failed to clear screen")?;
    term.write_line(&format!("\n  {}", style(&gate.book().title).bold().cyan()))
        .context("Failed to write title")?;
    term.write_line("").context("Failed to write blank line")?;

    if let Some(message) = gate.error_message() {
        term.write_line(&format!("  {}", style(message).red()))
            .context("Failed to write error")?;
        term.write_line("    R       - Retry")
            .context("Failed to write control")?;
    } else {
        term.write_line(&format!("  {}", style("Checking your subscription...").dim()))
            .context("Failed to write status")?;
    }
    term.write_line("    Q/Esc   - Quit")
        .context("Failed to write control")?;

    Ok(())
}

fn draw_player(
    term: &Term,
    view: &PlayerView,
    gate: &GateState,
    status: Option<&str>,
) -> Result<()> {
    term.clear_screen().context("Failed to clear screen")?;
    term.write_line(&format!("\n  {}", style(&view.book_title).bold().cyan()))
        .context("Failed to write title")?;

    if let Some(paywall) = gate.paywall() {
        term.write_line("").context("Failed to write blank line")?;
        term.write_line(&format!("  {}", style(paywall.title()).bold()))
            .context("Failed to write paywall")?;
        if !paywall.description().is_empty() {
            term.write_line(&format!("  {}", paywall.description()))
                .context("Failed to write paywall")?;
        }
        term.write_line(&format!("    B       - {}", paywall.action_text()))
            .context("Failed to write control")?;
        term.write_line("    Q/Esc   - Quit")
            .context("Failed to write control")?;
        return Ok(());
    }

    if let Some(message) = gate.error_message() {
        term.write_line(&format!("\n  {}", style(message).red()))
            .context("Failed to write error")?;
        term.write_line("    R       - Retry")
            .context("Failed to write control")?;
        return Ok(());
    }

    if view.chapter_count == 0 {
        term.write_line(&format!("\n  {}", style("This book has no key points yet").dim()))
            .context("Failed to write empty state")?;
        term.write_line("    Q/Esc   - Quit")
            .context("Failed to write control")?;
        return Ok(());
    }

    term.write_line(&format!("  {}", style(view.headline()).dim()))
        .context("Failed to write headline")?;
    if let Some(title) = &view.chapter_title {
        term.write_line(&format!("  {}", style(title).bold()))
            .context("Failed to write chapter title")?;
    }
    term.write_line("").context("Failed to write blank line")?;

    term.write_line(&format!(
        "  {} {} -{}",
        view.elapsed,
        progress_bar(view.progress, BAR_WIDTH),
        view.remaining
    ))
    .context("Failed to write progress bar")?;

    let state = if view.is_playing {
        style("Playing").green()
    } else {
        style("Paused").yellow()
    };
    term.write_line(&format!("  {}   Speed {}", state, view.speed_label))
        .context("Failed to write status")?;

    if let Some(status) = status {
        term.write_line(&format!("  {}", style(status).dim()))
            .context("Failed to write notice")?;
    }

    term.write_line("").context("Failed to write blank line")?;
    term.write_line("  Controls:")
        .context("Failed to write controls header")?;
    term.write_line("    Space   - Play/Pause")
        .context("Failed to write control")?;
    term.write_line("    H/L     - Back/Forward")
        .context("Failed to write control")?;
    term.write_line("    P/N     - Previous/Next key point")
        .context("Failed to write control")?;
    term.write_line("    S       - Change speed")
        .context("Failed to write control")?;
    term.write_line("    Q/Esc   - Quit")
        .context("Failed to write control")?;

    Ok(())
}
