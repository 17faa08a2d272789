//! Guided-breathing sessions: the clock, the state machine and the async
//! driver that ties them to a tokio runtime.

mod clock;
mod driver;
mod engine;
mod preview;

pub use clock::{Clock, ManualClock, Tick, TokioClock, DEFAULT_TICK_PERIOD};
pub use driver::{BroadcastCueSink, DriverConfig, SessionDriver, SessionHandle};
pub use engine::{Session, SessionEngine, SessionOutcome, SessionSnapshot, SessionState};
pub use preview::{preview, Timeline, TimelineEntry};
