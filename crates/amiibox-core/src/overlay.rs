//! Overlay input dispatch and per-frame update.
//!
//! Focus moves through three regions, top to bottom: the emulation toggle,
//! the active amiibo summary, and the listing. Up at the first listing row
//! moves into the summary, then the toggle.

use amiibox_platform::{ConnectionStatus, EmulationService, EmulationStatus};
use amiibox_types::config::OverlayConfig;
use amiibox_types::input::{Button, InputEvent, Trigger};
use amiibox_vfs::Vfs;

use crate::navigation::{Activation, NavigationController, NavigationLocation};
use crate::session::{SessionChanges, SessionState};
pub use crate::view::{FocusRegion, OverlayFrame};

/// Operations reachable from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayCommand {
    FocusUp,
    FocusDown,
    Activate,
    Back,
    ToggleConnection,
    SetEmulation(EmulationStatus),
    Quit,
}

/// Whether the host should keep the overlay open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    Quit,
}

/// Map a raw input event to an overlay command.
pub fn command_for(event: &InputEvent) -> OverlayCommand {
    match event {
        InputEvent::ButtonPress(Button::Up) => OverlayCommand::FocusUp,
        InputEvent::ButtonPress(Button::Down) => OverlayCommand::FocusDown,
        InputEvent::ButtonPress(Button::Confirm) => OverlayCommand::Activate,
        InputEvent::ButtonPress(Button::Cancel) => OverlayCommand::Back,
        InputEvent::ButtonPress(Button::StickPress) => OverlayCommand::ToggleConnection,
        InputEvent::TriggerPress(Trigger::Right) => {
            OverlayCommand::SetEmulation(EmulationStatus::On)
        },
        InputEvent::TriggerPress(Trigger::Left) => {
            OverlayCommand::SetEmulation(EmulationStatus::Off)
        },
        InputEvent::Quit => OverlayCommand::Quit,
    }
}

/// The overlay panel: session, navigation and focus.
pub struct Overlay {
    config: OverlayConfig,
    session: SessionState,
    nav: NavigationController,
    region: FocusRegion,
}

impl Overlay {
    pub fn new(config: OverlayConfig, service: Box<dyn EmulationService>) -> Self {
        let nav = NavigationController::new(&config);
        Self {
            config,
            session: SessionState::new(service),
            nav,
            region: FocusRegion::EmulationToggle,
        }
    }

    /// Connect to the service and open the top level. Returns whether the
    /// service is usable.
    pub fn start(&mut self, vfs: &dyn Vfs) -> bool {
        let ready = self.session.initialize();
        self.nav.enter(NavigationLocation::Root, vfs, &self.session);
        self.nav.refresh_active_thumbnail(vfs, &self.session);
        self.region = if self.nav.entries().is_empty() {
            FocusRegion::EmulationToggle
        } else {
            FocusRegion::Listing
        };
        ready
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.nav
    }

    pub fn region(&self) -> FocusRegion {
        self.region
    }

    pub fn handle_input(&mut self, event: &InputEvent, vfs: &dyn Vfs) -> InputResult {
        self.execute(command_for(event), vfs)
    }

    pub fn execute(&mut self, command: OverlayCommand, vfs: &dyn Vfs) -> InputResult {
        if !self.session.is_initialized() {
            return match command {
                OverlayCommand::Back | OverlayCommand::Quit => InputResult::Quit,
                _ => InputResult::Continue,
            };
        }
        match command {
            OverlayCommand::FocusUp => self.focus_up(vfs),
            OverlayCommand::FocusDown => self.focus_down(vfs),
            OverlayCommand::Activate => self.activate(vfs),
            OverlayCommand::Back => {
                if !self.nav.back(vfs, &self.session) {
                    return InputResult::Quit;
                }
                self.region = FocusRegion::Listing;
            },
            OverlayCommand::ToggleConnection => self.toggle_connection(),
            OverlayCommand::SetEmulation(status) => {
                self.session.set_emulation_status(status);
            },
            OverlayCommand::Quit => return InputResult::Quit,
        }
        InputResult::Continue
    }

    /// Per-frame poll of the session.
    pub fn update(&mut self, vfs: &dyn Vfs) -> SessionChanges {
        let changes = self.session.poll();
        if changes.selection {
            self.nav.refresh_active_thumbnail(vfs, &self.session);
        }
        changes
    }

    pub fn frame(&self) -> OverlayFrame<'_> {
        crate::view::build_frame(&self.config, &self.session, &self.nav, self.region)
    }

    fn focus_up(&mut self, vfs: &dyn Vfs) {
        self.region = match self.region {
            FocusRegion::Listing if self.nav.focus_prev(vfs) => FocusRegion::Listing,
            FocusRegion::Listing => FocusRegion::ActiveSummary,
            FocusRegion::ActiveSummary | FocusRegion::EmulationToggle => {
                FocusRegion::EmulationToggle
            },
        };
    }

    fn focus_down(&mut self, vfs: &dyn Vfs) {
        self.region = match self.region {
            FocusRegion::EmulationToggle => FocusRegion::ActiveSummary,
            FocusRegion::ActiveSummary if self.nav.entries().is_empty() => {
                FocusRegion::ActiveSummary
            },
            FocusRegion::ActiveSummary => FocusRegion::Listing,
            FocusRegion::Listing => {
                self.nav.focus_next(vfs);
                FocusRegion::Listing
            },
        };
    }

    fn activate(&mut self, vfs: &dyn Vfs) {
        match self.region {
            FocusRegion::EmulationToggle => {
                self.session.toggle_emulation_status();
            },
            FocusRegion::ActiveSummary => {
                if self.config.summary_row_toggles_connection {
                    self.toggle_connection();
                }
            },
            FocusRegion::Listing => {
                let outcome = self.nav.activate_focused(vfs, &mut self.session);
                log::debug!("Activated row {}: {outcome:?}", self.nav.focus());
                if outcome == Activation::Entered && self.nav.entries().is_empty() {
                    self.region = FocusRegion::ActiveSummary;
                }
            },
        }
    }

    fn toggle_connection(&mut self) {
        let status = self.session.toggle_connection_status();
        if status == ConnectionStatus::Invalid {
            log::debug!("No active virtual amiibo to toggle");
        }
    }
}
