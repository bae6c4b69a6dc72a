//! The locate → summarize → narrate state machine
//!
//! [`NarrationCore`] owns all narration state and is driven from a single
//! owner thread: external calls (`request_refresh`, `cancel_narration`,
//! `tick`) and collaborator completions (`apply`) must never run
//! concurrently. Collaborator calls run as tasks on a tokio runtime and
//! report back through a completion channel; every completion is tagged
//! with the generation of the refresh that issued it, and stale ones are
//! dropped.

use super::config::NarrationConfig;
use super::presenter::{progress_percent, Presenter};
use super::state::{
    Generation, NarratedSet, NarrationOutcome, NarrationSnapshot, OrchestratorState,
};
use super::timer::PeriodicTimer;
use crate::error::{GeocodeError, NarrationError, PlaybackError};
use crate::location::{Geocoder, LocationSource, Place};
use crate::speech::{AudioBytes, AudioPlayer, PlaybackCallback, SpeechService};
use crate::summary::{narration_prompt, SummaryService};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Services a narration cycle calls out to
#[derive(Clone)]
pub struct Collaborators {
    pub location: Arc<dyn LocationSource>,
    pub geocoder: Arc<dyn Geocoder>,
    pub summary: Arc<dyn SummaryService>,
    pub speech: Arc<dyn SpeechService>,
}

/// Outcome of an asynchronous step, routed back to the owner thread
#[derive(Debug)]
pub enum Completion {
    /// Location fix and reverse-geocode finished
    Location {
        generation: Generation,
        result: Result<Place, NarrationError>,
    },

    /// Summary text for `place` arrived (or failed)
    Summary {
        generation: Generation,
        place: Place,
        result: Result<String, NarrationError>,
    },

    /// Synthesized audio for `place` arrived (or failed)
    Speech {
        generation: Generation,
        place: Place,
        result: Result<AudioBytes, NarrationError>,
    },

    /// The player finished (or gave up on) the current clip
    Playback {
        generation: Generation,
        result: Result<(), PlaybackError>,
    },
}

impl Completion {
    pub fn generation(&self) -> Generation {
        match self {
            Completion::Location { generation, .. }
            | Completion::Summary { generation, .. }
            | Completion::Speech { generation, .. }
            | Completion::Playback { generation, .. } => *generation,
        }
    }
}

/// An in-flight collaborator call; aborted when dropped
struct RequestTask(JoinHandle<()>);

impl Drop for RequestTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Narration orchestrator state machine
pub struct NarrationCore {
    collaborators: Collaborators,
    player: Box<dyn AudioPlayer>,
    presenter: Box<dyn Presenter>,
    runtime: Handle,

    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,

    state: OrchestratorState,
    current_place: Option<Place>,
    outcome: NarrationOutcome,
    narrated: NarratedSet,
    refresh_timer: PeriodicTimer,
    progress_timer: PeriodicTimer,
    generation: Generation,
    cancelled: bool,
    started: bool,

    location_task: Option<RequestTask>,
    summary_task: Option<RequestTask>,
    speech_task: Option<RequestTask>,
}

impl NarrationCore {
    /// Create a core; nothing happens until [`start`](Self::start)
    pub fn new(
        config: &NarrationConfig,
        collaborators: Collaborators,
        player: Box<dyn AudioPlayer>,
        presenter: Box<dyn Presenter>,
        runtime: Handle,
    ) -> Self {
        let (completion_tx, completion_rx) = unbounded();

        Self {
            collaborators,
            player,
            presenter,
            runtime,
            completion_tx,
            completion_rx,
            state: OrchestratorState::Idle,
            current_place: None,
            outcome: NarrationOutcome::None,
            narrated: NarratedSet::new(),
            refresh_timer: PeriodicTimer::new(config.refresh_interval_ticks),
            progress_timer: PeriodicTimer::new(config.progress_interval_ticks),
            generation: Generation::default(),
            cancelled: false,
            started: false,
            location_task: None,
            summary_task: None,
            speech_task: None,
        }
    }

    /// Enter `Idle`, arm the refresh timer and run the first cycle
    pub fn start(&mut self) {
        if self.started {
            warn!("Narration already started");
            return;
        }
        self.started = true;

        info!(
            "Starting narration (refresh every {} ticks)",
            self.refresh_timer.period()
        );
        self.set_state(OrchestratorState::Idle);
        self.refresh_timer.arm();
        self.request_refresh(false);
    }

    /// Begin a new cycle, superseding anything still in flight
    pub fn request_refresh(&mut self, manual: bool) {
        self.generation = self.generation.next();
        self.cancelled = false;

        // Dropping the handles aborts the requests
        self.location_task = None;
        self.summary_task = None;
        self.speech_task = None;

        if self.progress_timer.is_armed() {
            self.player.stop();
            self.progress_timer.disarm();
        }
        self.resume_refresh_timer();
        if manual {
            self.refresh_timer.reset();
        }

        info!(
            "Refresh {} ({})",
            self.generation,
            if manual { "manual" } else { "automatic" }
        );
        self.set_state(OrchestratorState::AcquiringLocation);

        let location = Arc::clone(&self.collaborators.location);
        let geocoder = Arc::clone(&self.collaborators.geocoder);
        let generation = self.generation;
        self.location_task = Some(self.spawn(async move {
            let result = locate(location.as_ref(), geocoder.as_ref()).await;
            Completion::Location { generation, result }
        }));
    }

    /// Stop narration for the current cycle
    ///
    /// Audio already fetched is never played, active playback stops, and
    /// the refresh timer resumes.
    pub fn cancel_narration(&mut self) {
        info!("Narration cancelled");
        self.cancelled = true;
        self.summary_task = None;
        self.speech_task = None;

        self.player.stop();
        self.progress_timer.disarm();
        self.resume_refresh_timer();

        let next = match &self.current_place {
            Some(place) => OrchestratorState::HaveLocation(place.clone()),
            None => OrchestratorState::Idle,
        };
        self.set_state(next);
    }

    /// Advance both timers by one tick
    pub fn tick(&mut self) {
        if self.refresh_timer.tick() {
            debug!("Refresh timer fired");
            self.request_refresh(false);
        } else if self.refresh_timer.is_armed() {
            if let Some(remaining) = self.refresh_timer.remaining() {
                self.presenter.refresh_countdown(remaining);
            }
        }

        if self.progress_timer.tick() {
            if let (OrchestratorState::Narrating(place), Some(fraction)) =
                (&self.state, self.player.progress())
            {
                self.presenter
                    .playback_progress(place, progress_percent(fraction));
            }
        }
    }

    /// Feed a collaborator completion into the state machine
    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Location {
                generation,
                result: Ok(place),
            } => self.on_location_resolved(generation, place),
            Completion::Location {
                generation,
                result: Err(error),
            } => self.on_location_failed(generation, error),
            Completion::Summary {
                generation,
                place,
                result,
            } => self.on_summary(generation, place, result),
            Completion::Speech {
                generation,
                place,
                result,
            } => self.on_speech(generation, place, result),
            Completion::Playback { generation, result } => {
                self.on_playback_finished(generation, result)
            }
        }
    }

    /// A location fix was reverse-geocoded into `place`
    pub fn on_location_resolved(&mut self, generation: Generation, place: Place) {
        if self.is_stale(generation, "location") {
            return;
        }
        self.location_task = None;

        if self.current_place.as_ref() != Some(&place) {
            self.outcome = NarrationOutcome::None;
        }
        self.current_place = Some(place.clone());
        self.set_state(OrchestratorState::HaveLocation(place.clone()));

        if self.cancelled {
            debug!("Cancelled before summarizing {}", place);
            return;
        }
        self.fetch_summary(place);
    }

    /// The location or geocode step failed
    pub fn on_location_failed(&mut self, generation: Generation, error: NarrationError) {
        if self.is_stale(generation, "location") {
            return;
        }
        self.location_task = None;
        self.fail(error);
    }

    fn fetch_summary(&mut self, place: Place) {
        self.set_state(OrchestratorState::ComposingNarration(place.clone()));

        let prompt = narration_prompt(&place);
        let summary = Arc::clone(&self.collaborators.summary);
        let generation = self.generation;
        self.summary_task = Some(self.spawn(async move {
            let result = summary
                .summarize(&prompt)
                .await
                .map_err(NarrationError::from_summary);
            Completion::Summary {
                generation,
                place,
                result,
            }
        }));
    }

    fn on_summary(&mut self, generation: Generation, place: Place, result: Result<String, NarrationError>) {
        if self.is_stale(generation, "summary") {
            return;
        }
        self.summary_task = None;

        if self.cancelled {
            self.fail(NarrationError::Cancelled);
            return;
        }

        match result {
            Ok(text) if !text.trim().is_empty() => {
                debug!("Summary for {}: {} chars", place, text.len());
                self.fetch_narration(place, text);
            }
            Ok(_) => self.fail(NarrationError::NoSummary),
            Err(error) => self.fail(error),
        }
    }

    fn fetch_narration(&mut self, place: Place, text: String) {
        if self.narrated.contains(&place) {
            info!("Still in {}, not narrating again", place);
            self.outcome = NarrationOutcome::StillHere(place.clone());
            self.set_state(OrchestratorState::HaveLocation(place));
            return;
        }

        self.set_state(OrchestratorState::ComposingNarration(place.clone()));
        self.refresh_timer.pause();

        let speech = Arc::clone(&self.collaborators.speech);
        let generation = self.generation;
        self.speech_task = Some(self.spawn(async move {
            let result = speech
                .synthesize(&text)
                .await
                .map_err(NarrationError::from_speech);
            Completion::Speech {
                generation,
                place,
                result,
            }
        }));
    }

    fn on_speech(&mut self, generation: Generation, place: Place, result: Result<AudioBytes, NarrationError>) {
        if self.is_stale(generation, "speech") {
            return;
        }
        self.speech_task = None;

        if self.cancelled {
            debug!("Dropping audio for {}: narration was cancelled", place);
            return;
        }

        match result {
            Ok(audio) => self.begin_playback(place, audio),
            Err(error) => {
                self.resume_refresh_timer();
                self.fail(error);
            }
        }
    }

    fn begin_playback(&mut self, place: Place, audio: AudioBytes) {
        let completion_tx = self.completion_tx.clone();
        let generation = self.generation;
        let on_finish: PlaybackCallback = Box::new(move |result| {
            let _ = completion_tx.send(Completion::Playback { generation, result });
        });

        debug!("Playing {} bytes of narration for {}", audio.len(), place);
        match self.player.play(audio, on_finish) {
            Ok(()) => {
                // Insert only after the player accepts the clip, so a failed
                // synthesis or decode leaves the place eligible next cycle
                self.narrated.insert(place.clone());
                self.progress_timer.arm();
                self.set_state(OrchestratorState::Narrating(place));
            }
            Err(error) => {
                self.resume_refresh_timer();
                self.fail(error.into());
            }
        }
    }

    fn on_playback_finished(&mut self, generation: Generation, result: Result<(), PlaybackError>) {
        if self.is_stale(generation, "playback") {
            return;
        }

        let place = match &self.state {
            OrchestratorState::Narrating(place) => place.clone(),
            other => {
                debug!("Ignoring playback completion in state {}", other);
                return;
            }
        };

        if let Err(error) = &result {
            warn!("Playback of {} ended early: {}", place, error);
        }

        self.progress_timer.disarm();
        self.resume_refresh_timer();
        self.outcome = NarrationOutcome::JustPlayed(place.clone());
        self.set_state(OrchestratorState::HaveLocation(place));
    }

    /// Stop both timers, abort requests and playback; later completions are stale
    pub fn shutdown(&mut self) {
        info!("Narration shutting down");
        self.generation = self.generation.next();
        self.cancelled = true;
        self.started = false;
        self.refresh_timer.disarm();
        self.progress_timer.disarm();
        self.location_task = None;
        self.summary_task = None;
        self.speech_task = None;
        self.player.stop();
    }

    /// Receiver side of the completion channel, for `select!` loops
    pub fn completions(&self) -> Receiver<Completion> {
        self.completion_rx.clone()
    }

    /// Wait up to `timeout` for the next completion
    pub fn next_completion(&self, timeout: Duration) -> Option<Completion> {
        self.completion_rx.recv_timeout(timeout).ok()
    }

    /// Apply completions until none arrives within `timeout`; returns how many were applied
    pub fn process_pending(&mut self, timeout: Duration) -> usize {
        let mut applied = 0;
        while let Some(completion) = self.next_completion(timeout) {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    pub fn snapshot(&self) -> NarrationSnapshot {
        NarrationSnapshot {
            state: self.state.clone(),
            outcome: self.outcome.clone(),
            refresh_in: self.refresh_timer.remaining(),
            refresh_paused: self.refresh_timer.is_paused(),
            narrated_places: self.narrated.len(),
        }
    }

    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    pub fn outcome(&self) -> &NarrationOutcome {
        &self.outcome
    }

    pub fn current_place(&self) -> Option<&Place> {
        self.current_place.as_ref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn narrated(&self) -> &NarratedSet {
        &self.narrated
    }

    pub fn refresh_timer(&self) -> &PeriodicTimer {
        &self.refresh_timer
    }

    pub fn progress_timer(&self) -> &PeriodicTimer {
        &self.progress_timer
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn is_stale(&self, generation: Generation, step: &str) -> bool {
        if generation != self.generation {
            debug!(
                "Discarding stale {} completion {} (current {})",
                step, generation, self.generation
            );
            true
        } else {
            false
        }
    }

    /// Undo a narration pause, restarting the countdown from the full interval
    fn resume_refresh_timer(&mut self) {
        if self.refresh_timer.is_paused() {
            self.refresh_timer.resume();
            self.refresh_timer.reset();
        }
    }

    fn fail(&mut self, error: NarrationError) {
        warn!("Narration cycle {} failed: {}", self.generation, error);
        self.set_state(OrchestratorState::Failed(error.to_string()));
    }

    fn set_state(&mut self, state: OrchestratorState) {
        if self.state != state {
            info!("{} -> {}", self.state, state);
        }
        self.state = state;

        let snapshot = self.snapshot();
        self.presenter.state_changed(&snapshot);
    }

    fn spawn<F>(&self, request: F) -> RequestTask
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let completion_tx = self.completion_tx.clone();
        RequestTask(self.runtime.spawn(async move {
            let completion = request.await;
            if completion_tx.send(completion).is_err() {
                debug!("Completion dropped: orchestrator is gone");
            }
        }))
    }
}

/// One-shot fix followed by reverse-geocode
async fn locate(location: &dyn LocationSource, geocoder: &dyn Geocoder) -> Result<Place, NarrationError> {
    let coordinates = location.request_one_shot_location().await?;
    debug!(
        "Location fix: {:.5}, {:.5}",
        coordinates.latitude, coordinates.longitude
    );
    let descriptor = geocoder.reverse_geocode(coordinates).await?;
    Place::from_descriptor(&descriptor).ok_or(NarrationError::Geocode(GeocodeError::NoResult))
}
