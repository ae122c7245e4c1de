//! Generic mini-game session framework
//!
//! Shared by every mini-game:
//! - Phases and the transition graph
//! - Clock, countdown timer and pause accounting
//! - Score, streak and reward ladder
//! - Cancellable delayed actions tied to the session generation
//! - The orchestrator that drives the lifecycle and reports the result

pub mod clock;
pub mod context;
pub mod events;
pub mod orchestrator;
pub mod phase;
pub mod result;
pub mod scheduler;
pub mod score;

pub use clock::{SessionClock, Timer, TimerState};
pub use context::{DelayedAction, FinishPlan, SessionCore};
pub use events::{EffectKind, Entity, PresentCommand, SessionEvent};
pub use orchestrator::{MiniGame, SessionOrchestrator};
pub use phase::{GameStateMachine, SessionPhase};
pub use result::{CompletionReason, SessionReport, SessionResult};
pub use scheduler::{DueTask, Scheduler, TaskHandle};
pub use score::{DEFAULT_SUCCESS_RATIO, RewardLadder, ScoreTracker};
