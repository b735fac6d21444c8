//! Session state over the emulation service.
//!
//! [`SessionState`] owns the service handle and caches what the overlay
//! shows: emulation status, the active selection, and the interception
//! flag. Every mutation goes to the service first and is followed by a
//! re-read of the affected field, so the cache never drifts from what the
//! service last reported.

use amiibox_platform::{
    AmiiboMetadata, ConnectionStatus, EmulationService, EmulationStatus, Version,
};

/// The active virtual amiibo. Path and metadata are present together or
/// not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSelection {
    inner: Option<(String, AmiiboMetadata)>,
}

impl ActiveSelection {
    /// An empty `path` yields no selection.
    pub fn new(path: impl Into<String>, metadata: AmiiboMetadata) -> Self {
        let path = path.into();
        if path.is_empty() {
            return Self::default();
        }
        Self {
            inner: Some((path, metadata)),
        }
    }

    pub fn path(&self) -> Option<&str> {
        self.inner.as_ref().map(|(p, _)| p.as_str())
    }

    pub fn metadata(&self) -> Option<&AmiiboMetadata> {
        self.inner.as_ref().map(|(_, m)| m)
    }

    pub fn is_active(&self) -> bool {
        self.inner.is_some()
    }
}

/// Cached fields that changed during a [`SessionState::poll`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionChanges {
    pub emulation: bool,
    pub selection: bool,
    pub interception: bool,
}

impl SessionChanges {
    pub fn any(&self) -> bool {
        self.emulation || self.selection || self.interception
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitState {
    Pending,
    Ready,
    Failed,
}

/// Cached view of the emulation service.
pub struct SessionState {
    service: Box<dyn EmulationService>,
    init: InitState,
    version: Option<Version>,
    root_directory: Option<String>,
    emulation: EmulationStatus,
    active: ActiveSelection,
    intercepted: bool,
}

impl SessionState {
    pub fn new(service: Box<dyn EmulationService>) -> Self {
        Self {
            service,
            init: InitState::Pending,
            version: None,
            root_directory: None,
            emulation: EmulationStatus::Off,
            active: ActiveSelection::default(),
            intercepted: false,
        }
    }

    /// Connect to the service and load the initial state.
    ///
    /// Only the first call talks to the service; later calls return its
    /// outcome.
    pub fn initialize(&mut self) -> bool {
        match self.init {
            InitState::Ready => return true,
            InitState::Failed => return false,
            InitState::Pending => {},
        }
        self.init = InitState::Failed;

        if !self.service.is_available() {
            log::warn!("Emulation service is not available");
            return false;
        }
        if let Err(e) = self.service.initialize() {
            log::warn!("Emulation service initialization failed: {e}");
            return false;
        }
        let (version, root) = match (
            self.service.version(),
            self.service.virtual_amiibo_root_directory(),
        ) {
            (Ok(version), Ok(root)) => (version, root),
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("Emulation service did not report its setup: {e}");
                self.service.exit();
                return false;
            },
        };

        log::info!("Connected to emulation service {version}, amiibos under {root}");
        self.init = InitState::Ready;
        self.version = Some(version);
        self.root_directory = Some(root);
        self.refresh_emulation_status();
        self.load_active_selection();
        self.refresh_interception();
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.init == InitState::Ready
    }

    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Directory the service keeps virtual amiibos under.
    pub fn root_directory(&self) -> Option<&str> {
        self.root_directory.as_deref()
    }

    pub fn active_selection(&self) -> &ActiveSelection {
        &self.active
    }

    /// Re-read the active selection. Returns whether it changed.
    ///
    /// A failed query keeps the cached selection.
    pub fn load_active_selection(&mut self) -> bool {
        if !self.is_initialized() {
            return false;
        }
        let next = match self.service.active_virtual_amiibo() {
            Ok(Some(active)) => ActiveSelection::new(active.path, active.metadata),
            Ok(None) => ActiveSelection::default(),
            Err(e) => {
                log::warn!("Could not read the active virtual amiibo: {e}");
                return false;
            },
        };
        if next == self.active {
            return false;
        }
        log::debug!(
            "Active virtual amiibo: {}",
            next.path().unwrap_or("<none>")
        );
        self.active = next;
        true
    }

    /// Ask the service to activate `path`, then re-read the selection.
    /// Returns whether the cached selection changed.
    pub fn set_active_selection(&mut self, path: &str) -> bool {
        if !self.is_initialized() {
            return false;
        }
        if let Err(e) = self.service.set_active_virtual_amiibo(path) {
            log::warn!("Could not activate {path}: {e}");
        }
        self.load_active_selection()
    }

    /// Connection status of the active selection, `Invalid` when there is
    /// none or the service cannot answer.
    pub fn connection_status(&self) -> ConnectionStatus {
        if !self.is_initialized() || !self.active.is_active() {
            return ConnectionStatus::Invalid;
        }
        match self.service.active_virtual_amiibo_status() {
            Ok(status) => status,
            Err(e) => {
                log::warn!("Could not read the connection status: {e}");
                ConnectionStatus::Invalid
            },
        }
    }

    /// Flip Connected and Disconnected. Returns the status reported
    /// afterwards.
    pub fn toggle_connection_status(&mut self) -> ConnectionStatus {
        let current = self.connection_status();
        let Some(next) = current.toggled() else {
            return current;
        };
        if let Err(e) = self.service.set_active_virtual_amiibo_status(next) {
            log::warn!("Could not set the connection status to {next}: {e}");
        }
        self.connection_status()
    }

    /// Last emulation status read from the service.
    pub fn emulation_status(&self) -> EmulationStatus {
        self.emulation
    }

    /// Returns whether the service accepted the change.
    pub fn set_emulation_status(&mut self, status: EmulationStatus) -> bool {
        if !self.is_initialized() {
            return false;
        }
        let result = self.service.set_emulation_status(status);
        if let Err(e) = &result {
            log::warn!("Could not turn emulation {status}: {e}");
        }
        self.refresh_emulation_status();
        result.is_ok()
    }

    pub fn toggle_emulation_status(&mut self) -> bool {
        self.set_emulation_status(self.emulation.toggled())
    }

    /// Re-read the emulation status. Returns whether it changed.
    pub fn refresh_emulation_status(&mut self) -> bool {
        if !self.is_initialized() {
            return false;
        }
        match self.service.emulation_status() {
            Ok(status) if status != self.emulation => {
                self.emulation = status;
                true
            },
            Ok(_) => false,
            Err(e) => {
                log::warn!("Could not read the emulation status: {e}");
                false
            },
        }
    }

    /// Cached interception flag of the running application.
    pub fn is_current_application_intercepted(&self) -> bool {
        self.intercepted
    }

    /// Re-read the interception flag. Returns whether it changed.
    pub fn refresh_interception(&mut self) -> bool {
        if !self.is_initialized() {
            return false;
        }
        match self.service.is_current_application_intercepted() {
            Ok(flag) if flag != self.intercepted => {
                self.intercepted = flag;
                true
            },
            Ok(_) => false,
            Err(e) => {
                log::warn!("Could not read the interception flag: {e}");
                false
            },
        }
    }

    /// Parse the descriptor in `path`. `None` for anything that is not a
    /// virtual amiibo.
    pub fn try_parse_virtual_amiibo(&self, path: &str) -> Option<AmiiboMetadata> {
        if !self.is_initialized() {
            return None;
        }
        self.service.try_parse_virtual_amiibo(path).ok()
    }

    /// Per-frame refresh of every cached field.
    pub fn poll(&mut self) -> SessionChanges {
        SessionChanges {
            emulation: self.refresh_emulation_status(),
            selection: self.load_active_selection(),
            interception: self.refresh_interception(),
        }
    }
}

impl Drop for SessionState {
    fn drop(&mut self) {
        if self.is_initialized() {
            self.service.exit();
            log::info!("Emulation service session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::test_utils::{MockService, ROOT};

    const LINK: &str = "/emuiibo/amiibo/link";
    const MARIO: &str = "/emuiibo/amiibo/smash/mario";

    fn mock() -> MockService {
        MockService::new()
            .with_amiibo(LINK, "Link")
            .with_amiibo(MARIO, "Mario")
    }

    fn session(svc: &MockService) -> SessionState {
        let mut s = SessionState::new(Box::new(svc.handle()));
        assert!(s.initialize());
        s
    }

    #[test]
    fn initialize_loads_state() {
        let svc = mock();
        svc.state_mut().emulation = EmulationStatus::On;
        svc.state_mut().active = Some(LINK.into());
        svc.state_mut().intercepted = true;
        let s = session(&svc);
        assert!(s.is_initialized());
        assert_eq!(s.root_directory(), Some(ROOT));
        assert_eq!(
            s.version().map(|v| v.to_string()).as_deref(),
            Some("v1.0.2 (release)")
        );
        assert_eq!(s.emulation_status(), EmulationStatus::On);
        assert_eq!(s.active_selection().path(), Some(LINK));
        assert_eq!(s.active_selection().metadata().map(|m| m.name()), Some("Link"));
        assert!(s.is_current_application_intercepted());
    }

    #[test]
    fn unavailable_service_is_tried_once() {
        let svc = mock();
        svc.state_mut().available = false;
        let mut s = SessionState::new(Box::new(svc.handle()));
        assert!(!s.initialize());
        svc.state_mut().available = true;
        assert!(!s.initialize());
        assert_eq!(svc.state().initialize_calls, 0);
        assert!(!s.is_initialized());
        assert!(s.try_parse_virtual_amiibo(LINK).is_none());
        assert!(!s.set_emulation_status(EmulationStatus::On));
        assert_eq!(s.connection_status(), ConnectionStatus::Invalid);
    }

    #[test]
    fn failed_initialize_is_not_retried() {
        let svc = mock();
        svc.state_mut().reachable = false;
        let mut s = SessionState::new(Box::new(svc.handle()));
        assert!(!s.initialize());
        svc.state_mut().reachable = true;
        assert!(!s.initialize());
        assert_eq!(svc.state().initialize_calls, 1);
    }

    #[test]
    fn repeated_initialize_keeps_session() {
        let svc = mock();
        let mut s = session(&svc);
        assert!(s.initialize());
        assert_eq!(svc.state().initialize_calls, 1);
    }

    #[test]
    fn drop_exits_initialized_session_only() {
        let svc = mock();
        drop(session(&svc));
        assert_eq!(svc.state().exit_calls, 1);

        let down = mock();
        down.state_mut().available = false;
        let mut s = SessionState::new(Box::new(down.handle()));
        s.initialize();
        drop(s);
        assert_eq!(down.state().exit_calls, 0);
    }

    #[test]
    fn connection_invalid_without_service_call() {
        let svc = mock();
        let s = session(&svc);
        assert_eq!(s.connection_status(), ConnectionStatus::Invalid);
        assert_eq!(svc.state().status_queries, 0);
    }

    #[test]
    fn toggle_without_selection_is_noop() {
        let svc = mock();
        let mut s = session(&svc);
        assert_eq!(s.toggle_connection_status(), ConnectionStatus::Invalid);
        assert_eq!(svc.state().set_status_calls, 0);
    }

    #[test]
    fn toggling_emulation_twice_restores() {
        let svc = mock();
        let mut s = session(&svc);
        let before = s.emulation_status();
        assert!(s.toggle_emulation_status());
        assert_ne!(s.emulation_status(), before);
        assert!(s.toggle_emulation_status());
        assert_eq!(s.emulation_status(), before);
    }

    #[test]
    fn unreachable_set_keeps_cached_status() {
        let svc = mock();
        let mut s = session(&svc);
        assert!(s.set_emulation_status(EmulationStatus::On));
        svc.state_mut().reachable = false;
        assert!(!s.set_emulation_status(EmulationStatus::Off));
        assert_eq!(s.emulation_status(), EmulationStatus::On);
    }

    #[test]
    fn set_then_load_reports_path() {
        let svc = mock();
        let mut s = session(&svc);
        assert!(s.set_active_selection(MARIO));
        assert!(!s.load_active_selection());
        assert_eq!(s.active_selection().path(), Some(MARIO));
        assert_eq!(s.active_selection().metadata().map(|m| m.name()), Some("Mario"));
        assert_eq!(s.connection_status(), ConnectionStatus::Connected);
    }

    #[test]
    fn rejected_activation_keeps_selection() {
        let svc = mock();
        let mut s = session(&svc);
        s.set_active_selection(LINK);
        assert!(!s.set_active_selection("/emuiibo/amiibo/smash"));
        assert_eq!(s.active_selection().path(), Some(LINK));
        assert_eq!(svc.state().set_active_calls, 2);
    }

    #[test]
    fn reselect_toggles_connection_both_ways() {
        let svc = mock();
        let mut s = session(&svc);
        s.set_active_selection(LINK);
        assert_eq!(s.toggle_connection_status(), ConnectionStatus::Disconnected);
        assert_eq!(s.toggle_connection_status(), ConnectionStatus::Connected);
        assert_eq!(svc.state().set_active_calls, 1);
    }

    #[test]
    fn empty_path_record_clears_selection() {
        let svc = mock();
        let mut s = session(&svc);
        s.set_active_selection(LINK);
        {
            let mut st = svc.state_mut();
            st.active = None;
            st.empty_record_when_idle = true;
        }
        assert!(s.load_active_selection());
        assert!(s.active_selection().path().is_none());
        assert!(s.active_selection().metadata().is_none());
    }

    #[test]
    fn failed_load_keeps_selection() {
        let svc = mock();
        let mut s = session(&svc);
        s.set_active_selection(LINK);
        svc.state_mut().fail_active_query = true;
        assert!(!s.load_active_selection());
        assert_eq!(s.active_selection().path(), Some(LINK));
    }

    #[test]
    fn status_query_failure_reads_invalid() {
        let svc = mock();
        let mut s = session(&svc);
        s.set_active_selection(LINK);
        svc.state_mut().reachable = false;
        assert_eq!(s.connection_status(), ConnectionStatus::Invalid);
        assert_eq!(s.toggle_connection_status(), ConnectionStatus::Invalid);
    }

    #[test]
    fn poll_reports_external_changes() {
        let svc = mock();
        let mut s = session(&svc);
        assert!(!s.poll().any());
        {
            let mut st = svc.state_mut();
            st.emulation = EmulationStatus::On;
            st.intercepted = true;
            st.active = Some(MARIO.into());
        }
        let changes = s.poll();
        assert_eq!(
            changes,
            SessionChanges {
                emulation: true,
                selection: true,
                interception: true,
            }
        );
        svc.state_mut().active = None;
        let changes = s.poll();
        assert!(changes.selection && !changes.emulation);
        assert!(!s.active_selection().is_active());
    }

    #[test]
    fn selection_ignores_empty_path() {
        let sel = ActiveSelection::new("", AmiiboMetadata::new("x", ""));
        assert!(!sel.is_active());
        assert!(sel.metadata().is_none());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Select(usize),
        Toggle,
        Clear,
        Fail(bool),
        EmptyRecord(bool),
        Load,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..3).prop_map(Op::Select),
            Just(Op::Toggle),
            Just(Op::Clear),
            any::<bool>().prop_map(Op::Fail),
            any::<bool>().prop_map(Op::EmptyRecord),
            Just(Op::Load),
        ]
    }

    proptest! {
        #[test]
        fn selection_fields_stay_paired(ops in proptest::collection::vec(op(), 1..24)) {
            let paths = [LINK, MARIO, "/emuiibo/amiibo/smash"];
            let svc = mock();
            let mut s = session(&svc);
            for op in ops {
                match op {
                    Op::Select(i) => {
                        s.set_active_selection(paths[i]);
                    },
                    Op::Toggle => {
                        s.toggle_connection_status();
                    },
                    Op::Clear => svc.state_mut().active = None,
                    Op::Fail(f) => svc.state_mut().fail_active_query = f,
                    Op::EmptyRecord(e) => svc.state_mut().empty_record_when_idle = e,
                    Op::Load => {
                        s.load_active_selection();
                    },
                }
                let sel = s.active_selection();
                prop_assert_eq!(sel.path().is_none(), sel.metadata().is_none());
                if !sel.is_active() {
                    prop_assert_eq!(s.connection_status(), ConnectionStatus::Invalid);
                }
            }
        }
    }
}
