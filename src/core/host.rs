//! Contracts for the platform services the negotiation talks to.
//!
//! Launcher and dialog calls only report whether the platform took them. The
//! answer comes back later as a [`GalleryEvent`](super::screen::GalleryEvent),
//! and never comes back when the call failed.

use super::capability::{Capability, MediaFilter};
use thiserror::Error;

#[cfg_attr(test, mockall::automock)]
pub trait CapabilityQuery {
    fn is_granted(&self, capability: Capability) -> bool;
}

#[cfg_attr(test, mockall::automock)]
pub trait RationalePolicy {
    /// Whether the platform still considers re-prompting for `capability` acceptable.
    fn should_show_rationale(&self, capability: Capability) -> bool;
}

/// A launch the platform refused, e.g. no activity handles the intent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("the media picker ({0})")]
    Picker(String),
    #[error("the permission request ({0})")]
    GrantRequest(String),
    #[error("the prompt ({0})")]
    Prompt(String),
}

pub trait Launcher {
    fn launch_picker(&self, filter: &MediaFilter) -> Result<(), LaunchError>;
    fn launch_grant_request(&self, capabilities: &[Capability]) -> Result<(), LaunchError>;
    /// Leaves the app for its system settings page. No result is delivered.
    fn launch_app_settings(&self, package_id: &str);
}

/// Which modal is on screen, so the answer can be routed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Rationale,
    SettingsRedirect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalPrompt {
    pub kind: PromptKind,
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

pub trait Feedback {
    fn show_dismissible_notice(&self, text: &str);
    fn show_modal_choice(&self, prompt: &ModalPrompt) -> Result<(), LaunchError>;
}

/// A content URI handed back by the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUri(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageLoadError {
    #[error("malformed uri: {0}")]
    MalformedUri(String),
    #[error("access to {0} was revoked")]
    AccessRevoked(String),
    #[error("{0}")]
    Platform(String),
}

pub trait ImageView {
    fn display(&self, uri: &MediaUri) -> Result<(), ImageLoadError>;
}

/// Everything the gallery screen needs from its platform.
pub trait Host: CapabilityQuery + RationalePolicy + Launcher + Feedback + ImageView {}

impl<T> Host for T where T: CapabilityQuery + RationalePolicy + Launcher + Feedback + ImageView {}
