//! The gallery screen: feeds platform callbacks into the negotiation
//! controller and turns each outcome into exactly one host call.

use super::capability::{CapabilityModel, GrantResults};
use super::config::GalleryConfig;
use super::error::GalleryError;
use super::host::{Host, LaunchError, MediaUri, ModalPrompt, PromptKind};
use super::negotiation::{NegotiationController, NegotiationOutcome, Phase};

/// Every asynchronous result the screen can be re-entered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryEvent {
    /// The user tapped the gallery button.
    GalleryRequested,
    ModalAnswered { kind: PromptKind, confirmed: bool },
    GrantResult(GrantResults),
    /// `None` when the user backed out of the picker.
    PickerResult(Option<MediaUri>),
}

/// What handling one event amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Dispatched(NegotiationOutcome),
    OpenedSettings,
    Displayed(MediaUri),
    /// Shown to the user as a dismissible notice.
    Failed(GalleryError),
    /// The flow ended without further action.
    Ended,
    /// Stale or duplicate callback.
    Ignored,
}

pub struct GalleryScreen<H: Host> {
    host: H,
    config: GalleryConfig,
    controller: NegotiationController,
}

impl<H: Host> GalleryScreen<H> {
    /// The capability model is fixed here, once, from the platform version.
    pub fn new(host: H, config: GalleryConfig, sdk_version: i32) -> Self {
        let model = CapabilityModel::detect(sdk_version, config.platform.legacy_max_sdk);
        log::info!("SDK {} uses the {:?} capability model", sdk_version, model);
        let controller = NegotiationController::new(model, config.picker.legacy_mime_type.clone());
        Self {
            host,
            config,
            controller,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn controller(&self) -> &NegotiationController {
        &self.controller
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    /// Point the screen at a recreated platform instance. The negotiation
    /// carries over: the platform redelivers grant and picker results to the
    /// new instance.
    pub fn rebind(&mut self, host: H) {
        log::info!("Rebinding screen in phase {:?}", self.controller.phase());
        self.host = host;
    }

    /// Called when the screen is (re)created. Prompts the screen owns are
    /// shown again; platform activities are left to report back.
    pub fn on_create(&mut self) -> Step {
        match self.controller.phase() {
            Phase::Idle if self.config.auto_open => self.handle(GalleryEvent::GalleryRequested),
            Phase::Idle => Step::Ended,
            Phase::AwaitingRationale => self.dispatched(NegotiationOutcome::ShowRationale),
            Phase::AwaitingSettingsChoice => {
                self.dispatched(NegotiationOutcome::ShowSettingsRedirect)
            }
            Phase::AwaitingGrant | Phase::AwaitingPicker => Step::Ignored,
        }
    }

    pub fn handle(&mut self, event: GalleryEvent) -> Step {
        log::debug!("Handling {:?}", event);
        let outcome = match event {
            GalleryEvent::GalleryRequested => {
                self.controller.request_access(&self.host, &self.host)
            }
            GalleryEvent::ModalAnswered {
                kind: PromptKind::Rationale,
                confirmed,
            } => {
                let waiting = self.controller.phase() == Phase::AwaitingRationale;
                let outcome = self.controller.on_rationale_answer(confirmed);
                if waiting && outcome.is_none() {
                    return Step::Ended;
                }
                outcome
            }
            GalleryEvent::ModalAnswered {
                kind: PromptKind::SettingsRedirect,
                confirmed,
            } => return self.answer_settings(confirmed),
            GalleryEvent::GrantResult(results) => {
                self.controller.on_grant_result(&results, &self.host)
            }
            GalleryEvent::PickerResult(uri) => return self.picked(uri),
        };

        match outcome {
            Some(outcome) => self.dispatched(outcome),
            None => Step::Ignored,
        }
    }

    /// A launch the platform refused will never report back, so the
    /// controller must not keep waiting on it.
    fn dispatched(&mut self, outcome: NegotiationOutcome) -> Step {
        let Err(cause) = self.dispatch(&outcome) else {
            return Step::Dispatched(outcome);
        };
        log::error!("Failed to dispatch {:?}: {}", outcome, cause);
        if let NegotiationOutcome::RequestGrant(_) = outcome {
            // Same as a callback that granted nothing
            return self.handle(GalleryEvent::GrantResult(GrantResults::new()));
        }
        self.controller.reset();
        let error = GalleryError::from(cause);
        self.host.show_dismissible_notice(&error.to_string());
        Step::Failed(error)
    }

    fn dispatch(&self, outcome: &NegotiationOutcome) -> Result<(), LaunchError> {
        let strings = &self.config.strings;
        match outcome {
            NegotiationOutcome::ProceedToPicker(filter) => self.host.launch_picker(filter),
            NegotiationOutcome::RequestGrant(capabilities) => {
                self.host.launch_grant_request(capabilities)
            }
            NegotiationOutcome::ShowRationale => self.host.show_modal_choice(&ModalPrompt {
                kind: PromptKind::Rationale,
                title: strings.permission_required.clone(),
                message: strings.permission_required_message.clone(),
                confirm_label: strings.ok.clone(),
                cancel_label: strings.cancel.clone(),
            }),
            NegotiationOutcome::ShowSettingsRedirect => {
                log::warn!("{}", GalleryError::PermissionPermanentlyDenied);
                self.host.show_modal_choice(&ModalPrompt {
                    kind: PromptKind::SettingsRedirect,
                    title: strings.permission_required.clone(),
                    message: strings.feature_is_unavailable.clone(),
                    confirm_label: strings.setting.clone(),
                    cancel_label: strings.cancel.clone(),
                })
            }
        }
    }

    fn answer_settings(&mut self, confirmed: bool) -> Step {
        let waiting = self.controller.phase() == Phase::AwaitingSettingsChoice;
        if self.controller.on_settings_answer(confirmed) {
            log::info!("Opening app settings for {}", self.config.package_id);
            self.host.launch_app_settings(&self.config.package_id);
            Step::OpenedSettings
        } else if waiting {
            Step::Ended
        } else {
            Step::Ignored
        }
    }

    /// Image loading failures stay on this screen: they are reported as a
    /// notice and never restart the negotiation.
    fn picked(&mut self, uri: Option<MediaUri>) -> Step {
        if !self.controller.on_picker_closed() {
            return Step::Ignored;
        }
        let Some(uri) = uri else {
            log::info!("Picker closed without a selection");
            return Step::Ended;
        };

        match self.host.display(&uri) {
            Ok(()) => {
                log::info!("Displaying {}", uri.0);
                Step::Displayed(uri)
            }
            Err(cause) => {
                let text = cause.to_string();
                let text = if text.trim().is_empty() {
                    self.config.strings.unknown_error.clone()
                } else {
                    text
                };
                let error = GalleryError::from(cause);
                log::warn!("{}", error);
                self.host.show_dismissible_notice(&text);
                Step::Failed(error)
            }
        }
    }
}
