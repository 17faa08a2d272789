//! Session commands for CLI.

use std::io::Write;
use std::sync::Arc;

use clap::Subcommand;
use breathwork_core::cue::AnimationTarget;
use breathwork_core::session::{preview, SessionDriver, SessionSnapshot};
use breathwork_core::{
    CatalogError, Config, Cue, CueDispatcher, CueError, CueKind, Event, HapticDevice, HapticSink,
    Pattern, SessionState,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::patterns::open_catalog;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Run a guided session in real time (p = pause/resume, r = restart, q = quit)
    Run {
        /// Pattern ID
        id: String,
        /// Number of sets (1-300); defaults to session.default_sets_override, then the pattern's own
        #[arg(long, allow_negative_numbers = true)]
        sets: Option<i64>,
    },
    /// Print when each phase of a session would begin, without waiting
    Preview {
        /// Pattern ID
        id: String,
        /// Number of sets (1-300); defaults to session.default_sets_override, then the pattern's own
        #[arg(long, allow_negative_numbers = true)]
        sets: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Rings the terminal bell once per pulse.
struct TerminalBell;

impl HapticDevice for TerminalBell {
    fn vibrate(&mut self, pattern_ms: &[u32]) -> Result<(), CueError> {
        let pulses = pattern_ms.len().div_ceil(2);
        let mut err = std::io::stderr();
        err.write_all("\x07".repeat(pulses).as_bytes())
            .and_then(|_| err.flush())
            .map_err(|e| CueError::DeviceUnavailable(e.to_string()))
    }
}

fn find_pattern(id: &str) -> Result<Arc<Pattern>, CatalogError> {
    let catalog = open_catalog()?;
    catalog.get(id).ok_or_else(|| CatalogError::NotFound(id.to_string()))
}

/// `--sets`, else the configured override, else the pattern default.
fn session_sets(sets: Option<i64>, config: &Config) -> Option<i64> {
    sets.or(config.session.default_sets_override.map(i64::from))
}

fn clock_face(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub fn run(action: SessionAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SessionAction::Run { id, sets } => {
            let pattern = find_pattern(&id)?;
            let sets = session_sets(sets, config);
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_live(config, pattern, sets))
        }
        SessionAction::Preview { id, sets, json } => {
            let pattern = find_pattern(&id)?;
            let timeline = preview(Arc::clone(&pattern), session_sets(sets, config))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&timeline)?);
                return Ok(());
            }
            println!(
                "{} x{} sets ({} total)",
                pattern.name,
                timeline.target_sets,
                clock_face(timeline.finished_at_secs)
            );
            for entry in &timeline.entries {
                println!(
                    "  {:>6}  set {:<3} {:<12} {}s",
                    clock_face(entry.at_secs),
                    entry.set,
                    entry.phase.label(),
                    entry.duration_secs
                );
            }
            println!("  {:>6}  done", clock_face(timeline.finished_at_secs));
            Ok(())
        }
    }
}

fn print_cue(cue: &Cue) {
    match (cue.kind, cue.phase, cue.animation) {
        (CueKind::SessionStarted, _, _) => println!("Session started."),
        (CueKind::SessionCompleted, _, _) => println!("Session complete."),
        (CueKind::PhaseEntered, Some(phase), Some(anim)) => {
            let motion = match (anim.target, anim.held) {
                (_, true) => "hold",
                (AnimationTarget::Expanded, false) => "expand",
                (AnimationTarget::Contracted, false) => "contract",
            };
            println!("{} for {}s ({motion})", phase.label(), anim.duration_secs);
        }
        (CueKind::AnimationFrozen, Some(phase), _) => println!("[paused during {}]", phase.label()),
        (CueKind::PhaseResumed, Some(phase), Some(anim)) => {
            println!("[resumed {} with {}s left]", phase.label(), anim.duration_secs)
        }
        _ => {}
    }
}

fn print_event(event: &Event) {
    match event {
        Event::SessionPaused { .. } => println!("Paused. Press p to resume."),
        Event::SessionRestarted { total_secs, .. } => {
            println!("Restarted ({} total).", clock_face(*total_secs))
        }
        Event::SessionCancelled { was_running: true, .. } => println!("Session cancelled."),
        _ => {}
    }
}

fn print_status(snap: &SessionSnapshot) {
    println!(
        "  {:>2}s   set {}/{}   {} left",
        snap.step_countdown,
        snap.current_set,
        snap.target_sets,
        clock_face(snap.total_time_remaining)
    );
}

async fn run_live(
    config: &Config,
    pattern: Arc<Pattern>,
    sets: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let cues = CueDispatcher::new().with_sink(HapticSink::new(TerminalBell, config.haptics.enabled));
    let (handle, task) = SessionDriver::spawn(config.driver_config(), cues);
    let mut cue_rx = handle.subscribe_cues();
    let mut event_rx = handle.subscribe_events();
    let mut snapshots = handle.watch();

    handle.select_pattern(pattern).await?;
    if let Some(sets) = sets {
        handle.set_target_sets(sets).await?;
    }
    handle.start().await?;
    println!("Controls: p = pause/resume, r = restart, q = quit");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut last_countdown = None;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = snapshots.borrow_and_update().clone();
                match snap.state {
                    SessionState::Active => {
                        let key = (snap.current_set, snap.current_step_index, snap.step_countdown);
                        if config.cues.show_countdown && last_countdown != Some(key) {
                            print_status(&snap);
                        }
                        last_countdown = Some(key);
                    }
                    SessionState::Finished | SessionState::Selecting => break,
                    SessionState::Ready | SessionState::Paused => {}
                }
            }
            Ok(cue) = cue_rx.recv() => print_cue(&cue),
            Ok(event) = event_rx.recv() => print_event(&event),
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match line.trim() {
                    "p" => {
                        handle.toggle_pause().await?;
                    }
                    "r" => {
                        last_countdown = None;
                        handle.restart().await?;
                    }
                    "q" => {
                        handle.exit().await?;
                    }
                    "" => {}
                    other => tracing::debug!(input = other, "ignoring unknown control"),
                },
                _ => stdin_open = false,
            },
            _ = tokio::signal::ctrl_c() => {
                handle.exit().await?;
            }
        }
    }

    while let Ok(cue) = cue_rx.try_recv() {
        print_cue(&cue);
    }
    while let Ok(event) = event_rx.try_recv() {
        print_event(&event);
    }
    handle.shutdown();
    task.await?;
    Ok(())
}
