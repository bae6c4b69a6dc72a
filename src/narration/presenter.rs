//! The display side of the orchestrator
//!
//! A [`Presenter`] is told about every state transition. It never mutates
//! orchestrator state; user actions go back through the orchestrator's
//! `request_refresh` / `cancel_narration`.

use super::state::{NarrationOutcome, NarrationSnapshot, OrchestratorState};
use crate::location::Place;

/// Consumer of orchestrator notifications
pub trait Presenter: Send {
    /// Called after every state transition
    fn state_changed(&mut self, snapshot: &NarrationSnapshot);

    /// Called periodically while narrating
    fn playback_progress(&mut self, _place: &Place, _percent: u8) {}

    /// Called on every tick while the refresh timer is counting down
    fn refresh_countdown(&mut self, _remaining: u32) {}
}

/// Presenter that ignores everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn state_changed(&mut self, _snapshot: &NarrationSnapshot) {}
}

/// One-line status for a snapshot, as shown under the "Get Location" item
///
/// `progress` is the playback percentage, shown instead of the place name
/// while narrating.
pub fn status_text(snapshot: &NarrationSnapshot, progress: Option<u8>) -> String {
    match &snapshot.state {
        OrchestratorState::Idle => "Ready".to_string(),
        OrchestratorState::AcquiringLocation => "Getting location…".to_string(),
        OrchestratorState::HaveLocation(place) => match &snapshot.outcome {
            NarrationOutcome::StillHere(p) if p == place => format!("Still in {}", place),
            NarrationOutcome::JustPlayed(p) if p == place => format!("{} (just played)", place),
            _ => place.to_string(),
        },
        OrchestratorState::ComposingNarration(place) => {
            format!("Thinking of what to say about {}", place)
        }
        OrchestratorState::Narrating(place) => match progress {
            Some(percent) => format!("{}%", percent),
            None => place.to_string(),
        },
        OrchestratorState::Failed(reason) => reason.clone(),
    }
}

/// Convert a playback fraction into a whole percentage
pub fn progress_percent(fraction: f32) -> u8 {
    (fraction.clamp(0.0, 1.0) * 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(state: OrchestratorState, outcome: NarrationOutcome) -> NarrationSnapshot {
        NarrationSnapshot {
            state,
            outcome,
            ..Default::default()
        }
    }

    #[test]
    fn test_status_text_for_each_state() {
        let paris = Place::new("Paris, France");

        let cases = [
            (OrchestratorState::Idle, "Ready".to_string()),
            (OrchestratorState::AcquiringLocation, "Getting location…".to_string()),
            (OrchestratorState::HaveLocation(paris.clone()), "Paris, France".to_string()),
            (
                OrchestratorState::ComposingNarration(paris.clone()),
                "Thinking of what to say about Paris, France".to_string(),
            ),
            (OrchestratorState::Narrating(paris.clone()), "Paris, France".to_string()),
            (OrchestratorState::Failed("No summary found.".into()), "No summary found.".to_string()),
        ];

        for (state, expected) in cases {
            assert_eq!(status_text(&snapshot(state, NarrationOutcome::None), None), expected);
        }
    }

    #[test]
    fn test_status_text_markers() {
        let paris = Place::new("Paris, France");
        let still = snapshot(
            OrchestratorState::HaveLocation(paris.clone()),
            NarrationOutcome::StillHere(paris.clone()),
        );
        assert_eq!(status_text(&still, None), "Still in Paris, France");

        let played = snapshot(
            OrchestratorState::HaveLocation(paris.clone()),
            NarrationOutcome::JustPlayed(paris),
        );
        assert_eq!(status_text(&played, None), "Paris, France (just played)");
    }

    #[test]
    fn test_status_text_progress() {
        let narrating = snapshot(
            OrchestratorState::Narrating(Place::new("Lyon, France")),
            NarrationOutcome::None,
        );
        assert_eq!(status_text(&narrating, Some(42)), "42%");
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0.0), 0);
        assert_eq!(progress_percent(0.425), 42);
        assert_eq!(progress_percent(1.5), 100);
    }
}
