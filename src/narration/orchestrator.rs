//! Threaded front end for [`NarrationCore`]
//!
//! The core runs on a dedicated owner thread that multiplexes user
//! commands, collaborator completions and the base tick. Callers talk to it
//! through an [`OrchestratorHandle`].

use super::config::NarrationConfig;
use super::engine::{Collaborators, NarrationCore};
use super::presenter::Presenter;
use super::state::{NarrationSnapshot, OrchestratorState, SharedNarrationState};
use crate::location::{Geocoder, LocationSource, Place};
use crate::speech::{AudioPlayer, SpeechService};
use crate::summary::SummaryService;
use crate::{Result, YouAreHereError};
use crossbeam_channel::{bounded, select, tick, Receiver, Sender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Commands that can be sent to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationCommand {
    /// Start a new locate → summarize → narrate cycle
    Refresh { manual: bool },

    /// Stop narrating the current place
    CancelNarration,

    /// Shut the orchestrator down
    Shutdown,
}

/// Events emitted by the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum NarrationEvent {
    /// The state machine moved
    StateChanged(NarrationSnapshot),

    /// Playback progress for the place being narrated
    Progress { place: Place, percent: u8 },

    /// Ticks left until the next automatic refresh
    Countdown(u32),

    /// The orchestrator thread has exited
    Shutdown,
}

/// Presenter that republishes notifications as [`NarrationEvent`]s
///
/// Events are dropped, not queued, when the receiver falls behind; the
/// shared snapshot always holds the latest state.
pub struct ChannelPresenter {
    shared: SharedNarrationState,
    event_tx: Sender<NarrationEvent>,
}

impl ChannelPresenter {
    pub fn new(shared: SharedNarrationState, event_tx: Sender<NarrationEvent>) -> Self {
        Self { shared, event_tx }
    }

    fn emit(&self, event: NarrationEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => debug!("Event channel full, dropping {:?}", event),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

impl Presenter for ChannelPresenter {
    fn state_changed(&mut self, snapshot: &NarrationSnapshot) {
        self.shared.replace(snapshot.clone());
        self.emit(NarrationEvent::StateChanged(snapshot.clone()));
    }

    fn playback_progress(&mut self, place: &Place, percent: u8) {
        self.emit(NarrationEvent::Progress {
            place: place.clone(),
            percent,
        });
    }

    fn refresh_countdown(&mut self, remaining: u32) {
        self.shared.set_refresh_in(Some(remaining));
        self.emit(NarrationEvent::Countdown(remaining));
    }
}

/// Handle for controlling the orchestrator from the CLI or another thread
#[derive(Clone)]
pub struct OrchestratorHandle {
    command_tx: Sender<NarrationCommand>,
    event_rx: Receiver<NarrationEvent>,
    shared: SharedNarrationState,
}

impl OrchestratorHandle {
    /// Send a command to the orchestrator
    pub fn send_command(&self, cmd: NarrationCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| YouAreHereError::ChannelError(format!("Failed to send command: {}", e)))
    }

    /// Ask for a new cycle now; resets the refresh countdown
    pub fn request_refresh(&self) -> Result<()> {
        self.send_command(NarrationCommand::Refresh { manual: true })
    }

    pub fn cancel_narration(&self) -> Result<()> {
        self.send_command(NarrationCommand::CancelNarration)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send_command(NarrationCommand::Shutdown)
    }

    /// Try to receive an event from the orchestrator
    pub fn try_recv_event(&self) -> Option<NarrationEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<NarrationEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    pub fn event_receiver(&self) -> Receiver<NarrationEvent> {
        self.event_rx.clone()
    }

    pub fn state(&self) -> OrchestratorState {
        self.shared.state()
    }

    pub fn snapshot(&self) -> NarrationSnapshot {
        self.shared.snapshot()
    }
}

/// Owns everything the narration thread needs until [`start`](Self::start)
pub struct Orchestrator {
    config: NarrationConfig,
    collaborators: Collaborators,
    player: Box<dyn AudioPlayer>,
    command_rx: Receiver<NarrationCommand>,
    event_tx: Sender<NarrationEvent>,
    shared: SharedNarrationState,
}

impl Orchestrator {
    /// Create a new orchestrator with the given configuration
    pub fn new(
        config: NarrationConfig,
        collaborators: Collaborators,
        player: Box<dyn AudioPlayer>,
    ) -> Result<(Self, OrchestratorHandle)> {
        config.validate().map_err(YouAreHereError::ConfigError)?;

        let (command_tx, command_rx) = bounded(config.channel_buffer_size);
        let (event_tx, event_rx) = bounded(config.channel_buffer_size);
        let shared = SharedNarrationState::new();

        let handle = OrchestratorHandle {
            command_tx,
            event_rx,
            shared: shared.clone(),
        };

        let orchestrator = Self {
            config,
            collaborators,
            player,
            command_rx,
            event_tx,
            shared,
        };

        Ok((orchestrator, handle))
    }

    /// Spawn the narration thread and run the first cycle
    ///
    /// The thread owns a tokio runtime for collaborator requests and exits
    /// on [`NarrationCommand::Shutdown`] or when every handle is dropped.
    pub fn start(self) -> Result<JoinHandle<()>> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("narration-io")
            .enable_all()
            .build()
            .map_err(|e| YouAreHereError::RuntimeError(format!("Failed to build runtime: {}", e)))?;

        let Self {
            config,
            collaborators,
            player,
            command_rx,
            event_tx,
            shared,
        } = self;

        let handle = thread::Builder::new()
            .name("narration".to_string())
            .spawn(move || {
                info!("Narration orchestrator started");

                let presenter = ChannelPresenter::new(shared, event_tx.clone());
                let mut core = NarrationCore::new(
                    &config,
                    collaborators,
                    player,
                    Box::new(presenter),
                    runtime.handle().clone(),
                );
                let completions = core.completions();
                let ticker = tick(config.tick_period());

                core.start();

                loop {
                    select! {
                        recv(command_rx) -> cmd => match cmd {
                            Ok(NarrationCommand::Refresh { manual }) => core.request_refresh(manual),
                            Ok(NarrationCommand::CancelNarration) => core.cancel_narration(),
                            Ok(NarrationCommand::Shutdown) => {
                                info!("Orchestrator shutdown requested");
                                break;
                            }
                            Err(_) => {
                                warn!("Command channel disconnected");
                                break;
                            }
                        },
                        recv(completions) -> completion => match completion {
                            Ok(completion) => core.apply(completion),
                            Err(_) => {
                                error!("Completion channel disconnected");
                                break;
                            }
                        },
                        recv(ticker) -> _ => core.tick(),
                    }
                }

                core.shutdown();
                drop(core);
                runtime.shutdown_timeout(Duration::from_secs(1));

                if event_tx
                    .send_timeout(NarrationEvent::Shutdown, Duration::from_millis(100))
                    .is_err()
                {
                    debug!("Nobody listening for shutdown event");
                }
                info!("Narration orchestrator stopped");
            })
            .map_err(|e| {
                YouAreHereError::RuntimeError(format!("Failed to spawn narration thread: {}", e))
            })?;

        Ok(handle)
    }
}

/// Builder for creating an orchestrator
#[derive(Default)]
pub struct OrchestratorBuilder {
    config: NarrationConfig,
    location: Option<Arc<dyn LocationSource>>,
    geocoder: Option<Arc<dyn Geocoder>>,
    summary: Option<Arc<dyn SummaryService>>,
    speech: Option<Arc<dyn SpeechService>>,
    player: Option<Box<dyn AudioPlayer>>,
}

impl OrchestratorBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the complete configuration
    pub fn with_config(mut self, config: NarrationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_location_source(mut self, location: Arc<dyn LocationSource>) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn with_summary_service(mut self, summary: Arc<dyn SummaryService>) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn with_speech_service(mut self, speech: Arc<dyn SpeechService>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn with_player(mut self, player: Box<dyn AudioPlayer>) -> Self {
        self.player = Some(player);
        self
    }

    /// Build the orchestrator; every collaborator must be set
    pub fn build(self) -> Result<(Orchestrator, OrchestratorHandle)> {
        fn required<T>(value: Option<T>, name: &str) -> Result<T> {
            value.ok_or_else(|| YouAreHereError::ConfigError(format!("No {} configured", name)))
        }

        let collaborators = Collaborators {
            location: required(self.location, "location source")?,
            geocoder: required(self.geocoder, "geocoder")?,
            summary: required(self.summary, "summary service")?,
            speech: required(self.speech, "speech service")?,
        };
        let player = required(self.player, "audio player")?;

        Orchestrator::new(self.config, collaborators, player)
    }
}
