//! Fake collaborators and a single-threaded harness for narration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use youarehere::error::{GeocodeError, LocationError, NetworkError, PlaybackError};
use youarehere::location::{Coordinates, Geocoder, LocationSource, PlaceDescriptor};
use youarehere::narration::{
    Collaborators, NarrationConfig, NarrationCore, NarrationSnapshot, Presenter,
};
use youarehere::speech::{AudioBytes, AudioPlayer, PlaybackCallback, SpeechService};
use youarehere::summary::SummaryService;
use youarehere::Place;

/// How long `settle` waits for another completion before giving up
pub const SETTLE_TIMEOUT: Duration = Duration::from_millis(200);

pub fn paris() -> PlaceDescriptor {
    PlaceDescriptor::new().with_locality("Paris").with_country("France")
}

pub fn lyon() -> PlaceDescriptor {
    PlaceDescriptor::new().with_locality("Lyon").with_country("France")
}

pub fn place(joined: &str) -> Place {
    Place::new(joined)
}

pub struct FakeLocation {
    result: Mutex<Result<Coordinates, LocationError>>,
    calls: AtomicUsize,
}

impl FakeLocation {
    pub fn new() -> Self {
        Self {
            result: Mutex::new(Ok(Coordinates::new(48.8584, 2.2945))),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, result: Result<Coordinates, LocationError>) {
        *self.result.lock() = result;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationSource for FakeLocation {
    async fn request_one_shot_location(&self) -> Result<Coordinates, LocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.lock().clone()
    }
}

pub struct FakeGeocoder {
    result: Mutex<Result<PlaceDescriptor, GeocodeError>>,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        Self {
            result: Mutex::new(Ok(paris())),
        }
    }

    pub fn set(&self, result: Result<PlaceDescriptor, GeocodeError>) {
        *self.result.lock() = result;
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn reverse_geocode(&self, _coordinates: Coordinates) -> Result<PlaceDescriptor, GeocodeError> {
        self.result.lock().clone()
    }
}

pub struct FakeSummary {
    result: Mutex<Result<String, NetworkError>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeSummary {
    pub fn new() -> Self {
        Self {
            result: Mutex::new(Ok("Paris has a tower.".to_string())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn set(&self, result: Result<String, NetworkError>) {
        *self.result.lock() = result;
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl SummaryService for FakeSummary {
    async fn summarize(&self, prompt: &str) -> Result<String, NetworkError> {
        self.prompts.lock().push(prompt.to_string());
        self.result.lock().clone()
    }
}

/// Speech fake that can be held open until the test releases it
pub struct FakeSpeech {
    result: Mutex<Result<AudioBytes, NetworkError>>,
    calls: AtomicUsize,
    gated: AtomicBool,
    gate: Semaphore,
}

impl FakeSpeech {
    pub fn new() -> Self {
        Self {
            result: Mutex::new(Ok(AudioBytes::new(vec![1, 2, 3, 4]))),
            calls: AtomicUsize::new(0),
            gated: AtomicBool::new(false),
            gate: Semaphore::new(0),
        }
    }

    pub fn set(&self, result: Result<AudioBytes, NetworkError>) {
        *self.result.lock() = result;
    }

    /// Block subsequent requests until `release`
    pub fn hold(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.gated.store(false, Ordering::SeqCst);
        self.gate.add_permits(1024);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechService for FakeSpeech {
    async fn synthesize(&self, _text: &str) -> Result<AudioBytes, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.gated.load(Ordering::SeqCst) {
            let _permit = self.gate.acquire().await;
        }
        self.result.lock().clone()
    }
}

#[derive(Default)]
struct PlayerState {
    played: usize,
    stops: usize,
    on_finish: Option<PlaybackCallback>,
    progress: Option<f32>,
    fail_next: Option<PlaybackError>,
}

/// Player fake; finishing is driven by the test through [`PlayerControl`]
pub struct FakePlayer {
    state: Arc<Mutex<PlayerState>>,
}

impl AudioPlayer for FakePlayer {
    fn play(&mut self, _audio: AudioBytes, on_finish: PlaybackCallback) -> Result<(), PlaybackError> {
        let mut state = self.state.lock();
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        state.played += 1;
        state.on_finish = Some(on_finish);
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        if state.on_finish.take().is_some() {
            state.stops += 1;
        }
        state.progress = None;
    }

    fn progress(&self) -> Option<f32> {
        self.state.lock().progress
    }
}

#[derive(Clone)]
pub struct PlayerControl {
    state: Arc<Mutex<PlayerState>>,
}

impl PlayerControl {
    pub fn new() -> (Self, FakePlayer) {
        let state = Arc::new(Mutex::new(PlayerState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            FakePlayer { state },
        )
    }

    /// Complete the current clip, as the device would at end of audio
    pub fn finish(&self) {
        let on_finish = self.state.lock().on_finish.take();
        if let Some(on_finish) = on_finish {
            on_finish(Ok(()));
        }
    }

    /// End the current clip with a device error
    pub fn fail(&self, error: PlaybackError) {
        let on_finish = self.state.lock().on_finish.take();
        if let Some(on_finish) = on_finish {
            on_finish(Err(error));
        }
    }

    pub fn set_progress(&self, fraction: f32) {
        self.state.lock().progress = Some(fraction);
    }

    pub fn fail_next(&self, error: PlaybackError) {
        self.state.lock().fail_next = Some(error);
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().on_finish.is_some()
    }

    pub fn played(&self) -> usize {
        self.state.lock().played
    }

    pub fn stops(&self) -> usize {
        self.state.lock().stops
    }
}

#[derive(Default)]
struct PresenterRecord {
    snapshots: Vec<NarrationSnapshot>,
    progress: Vec<u8>,
    countdowns: Vec<u32>,
}

pub struct RecordingPresenter {
    record: Arc<Mutex<PresenterRecord>>,
}

impl Presenter for RecordingPresenter {
    fn state_changed(&mut self, snapshot: &NarrationSnapshot) {
        self.record.lock().snapshots.push(snapshot.clone());
    }

    fn playback_progress(&mut self, _place: &Place, percent: u8) {
        self.record.lock().progress.push(percent);
    }

    fn refresh_countdown(&mut self, remaining: u32) {
        self.record.lock().countdowns.push(remaining);
    }
}

#[derive(Clone)]
pub struct PresenterLog {
    record: Arc<Mutex<PresenterRecord>>,
}

impl PresenterLog {
    pub fn new() -> (Self, RecordingPresenter) {
        let record = Arc::new(Mutex::new(PresenterRecord::default()));
        (
            Self {
                record: Arc::clone(&record),
            },
            RecordingPresenter { record },
        )
    }

    pub fn snapshots(&self) -> Vec<NarrationSnapshot> {
        self.record.lock().snapshots.clone()
    }

    pub fn progress(&self) -> Vec<u8> {
        self.record.lock().progress.clone()
    }

    pub fn countdowns(&self) -> Vec<u32> {
        self.record.lock().countdowns.clone()
    }
}

pub struct Fakes {
    pub location: Arc<FakeLocation>,
    pub geocoder: Arc<FakeGeocoder>,
    pub summary: Arc<FakeSummary>,
    pub speech: Arc<FakeSpeech>,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            location: Arc::new(FakeLocation::new()),
            geocoder: Arc::new(FakeGeocoder::new()),
            summary: Arc::new(FakeSummary::new()),
            speech: Arc::new(FakeSpeech::new()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            location: self.location.clone(),
            geocoder: self.geocoder.clone(),
            summary: self.summary.clone(),
            speech: self.speech.clone(),
        }
    }
}

/// A [`NarrationCore`] wired to fakes, driven by hand from the test thread
///
/// Ticks are explicit, so the test is the clock.
pub struct Harness {
    pub core: NarrationCore,
    pub fakes: Fakes,
    pub player: PlayerControl,
    pub presenter: PresenterLog,
    runtime: tokio::runtime::Runtime,
}

impl Harness {
    pub fn new(refresh_interval_ticks: u32) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let fakes = Fakes::new();
        let (player, fake_player) = PlayerControl::new();
        let (presenter, recording) = PresenterLog::new();
        let config = NarrationConfig::new().with_refresh_interval(refresh_interval_ticks);

        let core = NarrationCore::new(
            &config,
            fakes.collaborators(),
            Box::new(fake_player),
            Box::new(recording),
            runtime.handle().clone(),
        );

        Self {
            core,
            fakes,
            player,
            presenter,
            runtime,
        }
    }

    /// Start the core and run the first cycle as far as it goes
    pub fn start(&mut self) {
        self.core.start();
        self.settle();
    }

    /// Apply completions until the core goes quiet
    pub fn settle(&mut self) -> usize {
        self.core.process_pending(SETTLE_TIMEOUT)
    }

    pub fn ticks(&mut self, count: u32) {
        for _ in 0..count {
            self.core.tick();
        }
    }

    /// Finish the clip that is playing and apply the completion
    pub fn finish_playback(&mut self) {
        self.player.finish();
        self.settle();
    }
}
