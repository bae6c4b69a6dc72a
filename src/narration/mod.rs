//! Narration orchestration
//!
//! Each refresh runs one cycle: get a location fix, reverse-geocode it to a
//! place, ask the proxy for something interesting to say about the place,
//! synthesize it and play it. A periodic timer starts a new cycle; it is
//! frozen while narration audio is being fetched or played. Places already
//! narrated this session are not narrated again.
//!
//! - [`engine`]: the single-threaded state machine
//! - [`orchestrator`]: the owner thread, command/event channels and handle
//! - [`timer`]: tick-driven periodic timers
//! - [`presenter`]: display callbacks and status text

pub mod config;
pub mod engine;
pub mod orchestrator;
pub mod presenter;
pub mod state;
pub mod timer;

pub use self::config::NarrationConfig;
pub use engine::{Collaborators, Completion, NarrationCore};
pub use orchestrator::{
    ChannelPresenter, NarrationCommand, NarrationEvent, Orchestrator, OrchestratorBuilder,
    OrchestratorHandle,
};
pub use presenter::{progress_percent, status_text, NullPresenter, Presenter};
pub use state::{
    Generation, NarratedSet, NarrationOutcome, NarrationSnapshot, OrchestratorState,
    SharedNarrationState,
};
pub use timer::{PeriodicTimer, TimerMode};
