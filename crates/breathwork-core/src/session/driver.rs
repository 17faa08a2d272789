//! Async session driver.
//!
//! A single tokio task owns the [`SessionEngine`] and its [`TokioClock`].
//! User commands and clock ticks arrive on channels and are handled one at
//! a time, so no tick can interleave with a command. After each message the
//! task publishes the latest snapshot (watch) and any lifecycle event
//! (broadcast). Cues go out on their own broadcast channel.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::clock::{Tick, TokioClock, DEFAULT_TICK_PERIOD};
use super::engine::{SessionEngine, SessionSnapshot};
use crate::cue::{Cue, CueDispatcher, CueSink};
use crate::error::{CoreError, CueError, SessionError};
use crate::events::Event;
use crate::pattern::Pattern;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub tick_period: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_period: DEFAULT_TICK_PERIOD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Start,
    TogglePause,
    Restart,
    Exit,
}

enum Command {
    Select(Arc<Pattern>, oneshot::Sender<Result<Event, SessionError>>),
    SetTargetSets(i64, oneshot::Sender<Option<u32>>),
    Control(Control, oneshot::Sender<Option<Event>>),
    Shutdown,
}

/// Publishes cues on a broadcast channel. Having no subscribers is fine.
pub struct BroadcastCueSink {
    tx: broadcast::Sender<Cue>,
}

impl BroadcastCueSink {
    pub fn new(tx: broadcast::Sender<Cue>) -> Self {
        Self { tx }
    }
}

impl CueSink for BroadcastCueSink {
    fn name(&self) -> &str {
        "broadcast"
    }

    fn deliver(&mut self, cue: &Cue) -> Result<(), CueError> {
        let _ = self.tx.send(cue.clone());
        Ok(())
    }
}

/// Cloneable front end to a running driver task.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    events: broadcast::Sender<Event>,
    cues: broadcast::Sender<Cue>,
}

impl SessionHandle {
    pub async fn select_pattern(&self, pattern: Arc<Pattern>) -> Result<Event, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Select(pattern, reply))?;
        let result = rx.await.map_err(|_| CoreError::DriverStopped)?;
        Ok(result?)
    }

    pub async fn set_target_sets(&self, sets: i64) -> Result<Option<u32>, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SetTargetSets(sets, reply))?;
        rx.await.map_err(|_| CoreError::DriverStopped)
    }

    pub async fn start(&self) -> Result<Option<Event>, CoreError> {
        self.control(Control::Start).await
    }

    pub async fn toggle_pause(&self) -> Result<Option<Event>, CoreError> {
        self.control(Control::TogglePause).await
    }

    pub async fn restart(&self) -> Result<Option<Event>, CoreError> {
        self.control(Control::Restart).await
    }

    pub async fn exit(&self) -> Result<Option<Event>, CoreError> {
        self.control(Control::Exit).await
    }

    /// Ask the driver task to stop. The clock is disarmed on the way out.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn subscribe_cues(&self) -> broadcast::Receiver<Cue> {
        self.cues.subscribe()
    }

    async fn control(&self, control: Control) -> Result<Option<Event>, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Control(control, reply))?;
        rx.await.map_err(|_| CoreError::DriverStopped)
    }

    fn send(&self, command: Command) -> Result<(), CoreError> {
        self.commands.send(command).map_err(|_| CoreError::DriverStopped)
    }
}

pub struct SessionDriver;

impl SessionDriver {
    /// Spawn the driver task on the current tokio runtime.
    ///
    /// `cues` receives every cue in addition to the handle's cue channel.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn(config: DriverConfig, cues: CueDispatcher) -> (SessionHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::idle());
        let (event_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (cue_tx, _) = broadcast::channel(CHANNEL_CAPACITY);

        let (clock, ticks) = TokioClock::channel(config.tick_period);
        let cues = cues.with_sink(BroadcastCueSink::new(cue_tx.clone()));
        let engine = SessionEngine::new(clock, cues);

        let task = tokio::spawn(run(engine, command_rx, ticks, snapshot_tx, event_tx.clone()));
        let handle = SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            events: event_tx,
            cues: cue_tx,
        };
        (handle, task)
    }
}

async fn run(
    mut engine: SessionEngine<TokioClock>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut ticks: mpsc::UnboundedReceiver<Tick>,
    snapshots: watch::Sender<SessionSnapshot>,
    events: broadcast::Sender<Event>,
) {
    tracing::debug!("Session driver started");
    loop {
        tokio::select! {
            biased;
            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    Command::Shutdown => break,
                    Command::Select(pattern, reply) => {
                        let result = engine.select_pattern(pattern);
                        if let Ok(event) = &result {
                            let _ = events.send(event.clone());
                        }
                        snapshots.send_replace(engine.snapshot());
                        let _ = reply.send(result);
                    }
                    Command::SetTargetSets(sets, reply) => {
                        let applied = engine.set_target_sets(sets);
                        snapshots.send_replace(engine.snapshot());
                        let _ = reply.send(applied);
                    }
                    Command::Control(control, reply) => {
                        let event = match control {
                            Control::Start => engine.start(),
                            Control::TogglePause => engine.toggle_pause(),
                            Control::Restart => engine.restart(),
                            Control::Exit => engine.exit(),
                        };
                        if let Some(event) = &event {
                            let _ = events.send(event.clone());
                        }
                        snapshots.send_replace(engine.snapshot());
                        let _ = reply.send(event);
                    }
                }
            }
            Some(tick) = ticks.recv() => {
                if let Some(event) = engine.on_tick(tick) {
                    let _ = events.send(event);
                }
                snapshots.send_replace(engine.snapshot());
            }
        }
    }
    engine.exit();
    snapshots.send_replace(engine.snapshot());
    tracing::debug!("Session driver stopped");
}
