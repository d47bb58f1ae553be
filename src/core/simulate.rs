//! An in-memory host for replaying negotiations off-device.
//!
//! Grants and rationale flags are plain sets the scenario mutates between
//! events; every launcher and dialog call is recorded in order.

use super::capability::{Capability, MediaFilter};
use super::host::{
    CapabilityQuery, Feedback, ImageLoadError, ImageView, LaunchError, Launcher, MediaUri,
    ModalPrompt, RationalePolicy,
};
use std::cell::RefCell;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Picker(MediaFilter),
    GrantRequest(Vec<Capability>),
    AppSettings(String),
    Notice(String),
    Modal(ModalPrompt),
    Display(MediaUri),
}

impl HostCall {
    pub fn is_dialog(&self) -> bool {
        matches!(self, Self::Modal(_) | Self::GrantRequest(_))
    }
}

#[derive(Debug, Default)]
pub struct ScriptedHost {
    pub granted: HashSet<Capability>,
    pub rationale: HashSet<Capability>,
    /// When set, displaying any picked image fails with this error.
    pub display_error: Option<ImageLoadError>,
    calls: RefCell<Vec<HostCall>>,
}

impl ScriptedHost {
    pub fn new(
        granted: impl IntoIterator<Item = Capability>,
        rationale: impl IntoIterator<Item = Capability>,
    ) -> Self {
        Self {
            granted: granted.into_iter().collect(),
            rationale: rationale.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }

    pub fn dialog_count(&self) -> usize {
        self.calls.borrow().iter().filter(|it| it.is_dialog()).count()
    }

    fn record(&self, call: HostCall) {
        log::debug!("host <- {:?}", call);
        self.calls.borrow_mut().push(call);
    }
}

impl CapabilityQuery for ScriptedHost {
    fn is_granted(&self, capability: Capability) -> bool {
        self.granted.contains(&capability)
    }
}

impl RationalePolicy for ScriptedHost {
    fn should_show_rationale(&self, capability: Capability) -> bool {
        self.rationale.contains(&capability)
    }
}

impl Launcher for ScriptedHost {
    fn launch_picker(&self, filter: &MediaFilter) -> Result<(), LaunchError> {
        self.record(HostCall::Picker(filter.clone()));
        Ok(())
    }

    fn launch_grant_request(&self, capabilities: &[Capability]) -> Result<(), LaunchError> {
        self.record(HostCall::GrantRequest(capabilities.to_vec()));
        Ok(())
    }

    fn launch_app_settings(&self, package_id: &str) {
        self.record(HostCall::AppSettings(package_id.to_string()));
    }
}

impl Feedback for ScriptedHost {
    fn show_dismissible_notice(&self, text: &str) {
        self.record(HostCall::Notice(text.to_string()));
    }

    fn show_modal_choice(&self, prompt: &ModalPrompt) -> Result<(), LaunchError> {
        self.record(HostCall::Modal(prompt.clone()));
        Ok(())
    }
}

impl ImageView for ScriptedHost {
    fn display(&self, uri: &MediaUri) -> Result<(), ImageLoadError> {
        self.record(HostCall::Display(uri.clone()));
        match &self.display_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}
