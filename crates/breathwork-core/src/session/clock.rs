//! The session clock: one logical 1 Hz tick source.
//!
//! Every arming gets a new generation and each tick carries the generation
//! of the arming that produced it. The engine only acts on ticks from the
//! arming it currently holds, so a tick that was already queued when the
//! clock was disarmed can never mutate a paused or discarded session.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tick {
    generation: u64,
}

impl Tick {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub trait Clock: Send {
    /// Start ticking. Re-arming an armed clock disarms the old arming first.
    fn arm(&mut self) -> Tick;
    /// Stop ticking. No-op when not armed.
    fn disarm(&mut self);
    fn is_armed(&self) -> bool;
}

/// A clock with no timer behind it. The owner delivers ticks by hand.
#[derive(Debug, Default)]
pub struct ManualClock {
    generation: u64,
    armed: bool,
    arm_count: u32,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tick of the live arming, if armed.
    pub fn current(&self) -> Option<Tick> {
        self.armed.then_some(Tick {
            generation: self.generation,
        })
    }

    pub fn arm_count(&self) -> u32 {
        self.arm_count
    }
}

impl Clock for ManualClock {
    fn arm(&mut self) -> Tick {
        self.generation += 1;
        self.armed = true;
        self.arm_count += 1;
        Tick {
            generation: self.generation,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }

    fn is_armed(&self) -> bool {
        self.armed
    }
}

/// Real-time clock backed by a tokio interval task.
///
/// Ticks are sent over an unbounded channel so the receiving loop can
/// handle them on the same task as user commands.
pub struct TokioClock {
    period: Duration,
    ticks: mpsc::UnboundedSender<Tick>,
    runtime: Handle,
    task: Option<JoinHandle<()>>,
    generation: u64,
}

impl TokioClock {
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(period: Duration, ticks: mpsc::UnboundedSender<Tick>) -> Self {
        Self {
            period,
            ticks,
            runtime: Handle::current(),
            task: None,
            generation: 0,
        }
    }

    /// Build a clock together with the receiving end of its tick channel.
    pub fn channel(period: Duration) -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(period, tx), rx)
    }
}

impl Clock for TokioClock {
    fn arm(&mut self) -> Tick {
        self.disarm();
        self.generation += 1;
        let tick = Tick {
            generation: self.generation,
        };
        let period = self.period;
        let tx = self.ticks.clone();
        self.task = Some(self.runtime.spawn(async move {
            // First tick lands one full period after arming.
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(tick).is_err() {
                    break;
                }
            }
        }));
        tracing::trace!(generation = tick.generation, "Clock armed");
        tick
    }

    fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::trace!(generation = self.generation, "Clock disarmed");
        }
    }

    fn is_armed(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for TokioClock {
    fn drop(&mut self) {
        self.disarm();
    }
}
