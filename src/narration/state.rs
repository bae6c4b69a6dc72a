//! State owned by the narration orchestrator
//!
//! The orchestrator is the only writer. Everything else (presenters, the
//! orchestrator handle, tests) reads snapshots.

use crate::location::Place;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Where the narration cycle currently is
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OrchestratorState {
    /// Nothing happening, no place known
    #[default]
    Idle,
    /// Waiting for a location fix and its reverse-geocode
    AcquiringLocation,
    /// A place is known and nothing is in flight for it
    HaveLocation(Place),
    /// Fetching the summary or synthesizing audio for the place
    ComposingNarration(Place),
    /// Audio for the place is playing
    Narrating(Place),
    /// The current cycle failed; the next refresh recovers
    Failed(String),
}

impl OrchestratorState {
    /// The place this state refers to, if any
    pub fn place(&self) -> Option<&Place> {
        match self {
            OrchestratorState::HaveLocation(place)
            | OrchestratorState::ComposingNarration(place)
            | OrchestratorState::Narrating(place) => Some(place),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, OrchestratorState::Idle)
    }

    pub fn is_narrating(&self) -> bool {
        matches!(self, OrchestratorState::Narrating(_))
    }

    pub fn is_composing(&self) -> bool {
        matches!(self, OrchestratorState::ComposingNarration(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, OrchestratorState::Failed(_))
    }

    /// Whether a request or playback is outstanding
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            OrchestratorState::AcquiringLocation
                | OrchestratorState::ComposingNarration(_)
                | OrchestratorState::Narrating(_)
        )
    }
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorState::Idle => write!(f, "Idle"),
            OrchestratorState::AcquiringLocation => write!(f, "AcquiringLocation"),
            OrchestratorState::HaveLocation(place) => write!(f, "HaveLocation({})", place),
            OrchestratorState::ComposingNarration(place) => write!(f, "ComposingNarration({})", place),
            OrchestratorState::Narrating(place) => write!(f, "Narrating({})", place),
            OrchestratorState::Failed(reason) => write!(f, "Failed({})", reason),
        }
    }
}

/// How the last narration attempt for the current place ended
///
/// Display-only; cleared whenever the resolved place changes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum NarrationOutcome {
    #[default]
    None,
    /// Audio for this place finished playing
    JustPlayed(Place),
    /// This place was already narrated, so nothing was played
    StillHere(Place),
}

impl NarrationOutcome {
    pub fn place(&self) -> Option<&Place> {
        match self {
            NarrationOutcome::None => None,
            NarrationOutcome::JustPlayed(place) | NarrationOutcome::StillHere(place) => Some(place),
        }
    }
}

/// Places narrated during this session
///
/// Insert-only; lives as long as the orchestrator.
#[derive(Clone, Debug, Default)]
pub struct NarratedSet {
    places: HashSet<Place>,
}

impl NarratedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, place: &Place) -> bool {
        self.places.contains(place)
    }

    /// Record a place; returns false if it was already present
    pub fn insert(&mut self, place: Place) -> bool {
        self.places.insert(place)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

/// Tag distinguishing successive refresh cycles
///
/// Completions carrying an older generation than the orchestrator's
/// current one are stale and get dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Point-in-time view of the orchestrator, as handed to presenters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NarrationSnapshot {
    pub state: OrchestratorState,
    pub outcome: NarrationOutcome,
    /// Ticks until the next automatic refresh; `None` while disarmed
    pub refresh_in: Option<u32>,
    /// The refresh countdown is frozen during playback
    pub refresh_paused: bool,
    /// Number of distinct places narrated so far
    pub narrated_places: usize,
}

/// Thread-safe latest snapshot, readable from any thread
#[derive(Clone, Default)]
pub struct SharedNarrationState {
    inner: Arc<RwLock<NarrationSnapshot>>,
}

impl SharedNarrationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the latest snapshot (no lock held after return)
    pub fn snapshot(&self) -> NarrationSnapshot {
        self.inner.read().clone()
    }

    pub fn state(&self) -> OrchestratorState {
        self.inner.read().state.clone()
    }

    pub fn is_narrating(&self) -> bool {
        self.inner.read().state.is_narrating()
    }

    pub(crate) fn replace(&self, snapshot: NarrationSnapshot) {
        *self.inner.write() = snapshot;
    }

    pub(crate) fn set_refresh_in(&self, remaining: Option<u32>) {
        self.inner.write().refresh_in = remaining;
    }
}
