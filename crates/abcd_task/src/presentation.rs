//! Headless presentation adapters.
//!
//! Neither adapter renders anything. They track what a camera rig would be
//! showing so front-ends and tests can observe it, and they narrate phase
//! changes on the operator log.

use abcd_core::{PresentationAdapter, PresentationMode};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "view")]
pub enum ViewState {
    /// Nothing started yet.
    Idle,
    /// Full-screen top-down replay of the sequence.
    Replay { config_index: usize },
    /// First person; `overview` is the corner mini-map.
    FirstPerson { config_index: usize, overview: bool },
    Ended,
}

/// Classic rig: replays each new layout from above, then switches to first
/// person with the mini-map until the participant starts moving.
#[derive(Debug)]
pub struct OverviewCamera {
    view: ViewState,
    replays_run: usize,
}

impl OverviewCamera {
    pub fn new() -> Self {
        Self {
            view: ViewState::Idle,
            replays_run: 0,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn replays_run(&self) -> usize {
        self.replays_run
    }
}

impl Default for OverviewCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl PresentationAdapter for OverviewCamera {
    fn plays_memorization_replay(&self) -> bool {
        true
    }

    fn suppress_overview(&mut self) {
        hide_overview(&mut self.view);
    }

    fn run_memorization_replay(&mut self, config_index: usize) {
        tracing::info!("Overview camera: replaying configuration {}", config_index);
        self.replays_run += 1;
        self.view = ViewState::Replay { config_index };
    }

    fn begin_free_play(&mut self, config_index: usize) {
        tracing::info!("Overview camera: first person for configuration {}", config_index);
        self.view = ViewState::FirstPerson {
            config_index,
            overview: true,
        };
    }

    fn session_end(&mut self) {
        tracing::info!("Overview camera: session ended");
        self.view = ViewState::Ended;
    }
}

/// First person from the start, mini-map included. Never replays.
#[derive(Debug)]
pub struct FreeNavigationCamera {
    view: ViewState,
}

impl FreeNavigationCamera {
    pub fn new() -> Self {
        Self {
            view: ViewState::Idle,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }
}

impl Default for FreeNavigationCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl PresentationAdapter for FreeNavigationCamera {
    fn plays_memorization_replay(&self) -> bool {
        false
    }

    fn suppress_overview(&mut self) {
        hide_overview(&mut self.view);
    }

    fn run_memorization_replay(&mut self, config_index: usize) {
        tracing::warn!(
            "Free navigation camera asked to replay configuration {}; ignoring",
            config_index
        );
    }

    fn begin_free_play(&mut self, config_index: usize) {
        tracing::info!("Free navigation: configuration {}", config_index);
        self.view = ViewState::FirstPerson {
            config_index,
            overview: true,
        };
    }

    fn session_end(&mut self) {
        tracing::info!("Free navigation: session ended");
        self.view = ViewState::Ended;
    }
}

fn hide_overview(view: &mut ViewState) {
    if let ViewState::FirstPerson { overview, .. } = view {
        if *overview {
            tracing::debug!("Hiding overview aid");
            *overview = false;
        }
    }
}

/// Build the adapter selected in configuration.
pub fn adapter_for(mode: PresentationMode) -> Box<dyn PresentationAdapter> {
    match mode {
        PresentationMode::Classic => Box::new(OverviewCamera::new()),
        PresentationMode::FreeNavigation => Box::new(FreeNavigationCamera::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_camera_phases() {
        let mut camera = OverviewCamera::new();
        assert!(camera.plays_memorization_replay());

        camera.run_memorization_replay(0);
        assert_eq!(camera.view(), ViewState::Replay { config_index: 0 });

        // No overview to hide during the replay itself.
        camera.suppress_overview();
        assert_eq!(camera.view(), ViewState::Replay { config_index: 0 });

        camera.begin_free_play(0);
        camera.suppress_overview();
        assert_eq!(
            camera.view(),
            ViewState::FirstPerson {
                config_index: 0,
                overview: false
            }
        );

        camera.session_end();
        assert_eq!(camera.view(), ViewState::Ended);
        assert_eq!(camera.replays_run(), 1);
    }

    #[test]
    fn test_free_navigation_never_replays() {
        let mut camera = FreeNavigationCamera::new();
        assert!(!camera.plays_memorization_replay());
        camera.run_memorization_replay(2);
        assert_eq!(camera.view(), ViewState::Idle);
    }

    #[test]
    fn test_adapter_for_mode() {
        assert!(adapter_for(PresentationMode::Classic).plays_memorization_replay());
        assert!(!adapter_for(PresentationMode::FreeNavigation).plays_memorization_replay());
    }
}
