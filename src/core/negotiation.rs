//! The permission negotiation state machine.
//!
//! ```text
//! Idle --request_access--> all granted ---------------> ProceedToPicker
//!                          rationale meaningful -------> ShowRationale --confirm--> RequestGrant
//!                          otherwise ------------------> RequestGrant
//! RequestGrant --callback--> all granted --------------> ProceedToPicker
//!                            rationale still meaningful -> ShowRationale
//!                            otherwise -----------------> ShowSettingsRedirect
//! ```
//!
//! The controller never talks to the UI. Each step returns at most one
//! [`NegotiationOutcome`] and the caller dispatches it. Grant and rationale
//! state is read fresh from the platform every time the controller is
//! re-entered.

use super::capability::{Capability, CapabilityModel, GrantResults, GrantState, MediaFilter};
use super::host::{CapabilityQuery, RationalePolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationOutcome {
    ProceedToPicker(MediaFilter),
    ShowRationale,
    ShowSettingsRedirect,
    RequestGrant(Vec<Capability>),
}

/// What the controller is waiting on. Anything but `Idle` means a prompt or
/// a platform activity is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingRationale,
    AwaitingGrant,
    AwaitingSettingsChoice,
    AwaitingPicker,
}

#[derive(Debug, Clone)]
pub struct NegotiationController {
    model: CapabilityModel,
    legacy_mime_type: String,
    phase: Phase,
}

impl NegotiationController {
    pub fn new(model: CapabilityModel, legacy_mime_type: impl Into<String>) -> Self {
        Self {
            model,
            legacy_mime_type: legacy_mime_type.into(),
            phase: Phase::Idle,
        }
    }

    pub fn model(&self) -> CapabilityModel {
        self.model
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_pending(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Entry point for the user asking for the gallery.
    ///
    /// Returns `None` while an earlier negotiation is still waiting on a
    /// prompt or the picker.
    pub fn request_access(
        &mut self,
        grants: &impl CapabilityQuery,
        rationale: &impl RationalePolicy,
    ) -> Option<NegotiationOutcome> {
        if self.is_pending() {
            log::warn!(
                "Access requested while negotiation is {:?}, ignoring",
                self.phase
            );
            return None;
        }

        let required = self.model.required();
        let outcome = if required.iter().all(|it| grants.is_granted(*it)) {
            log::info!("All media capabilities already granted");
            self.picker()
        } else if required.iter().any(|it| rationale.should_show_rationale(*it)) {
            NegotiationOutcome::ShowRationale
        } else {
            NegotiationOutcome::RequestGrant(required.to_vec())
        };
        Some(self.enter(outcome))
    }

    /// Answer to the "permission required" prompt.
    pub fn on_rationale_answer(&mut self, confirmed: bool) -> Option<NegotiationOutcome> {
        if self.phase != Phase::AwaitingRationale {
            log::warn!("Stale rationale answer in phase {:?}", self.phase);
            return None;
        }

        if confirmed {
            Some(self.enter(NegotiationOutcome::RequestGrant(
                self.model.required().to_vec(),
            )))
        } else {
            log::info!("User dismissed the rationale prompt");
            self.phase = Phase::Idle;
            None
        }
    }

    /// Payload of the platform grant callback.
    ///
    /// The callback decides on its own payload, so a grant that the platform
    /// reports here wins over whatever the query service said before. A full
    /// grant is honoured even when nothing is pending, since the platform
    /// redelivers results to a recreated screen.
    pub fn on_grant_result(
        &mut self,
        results: &GrantResults,
        rationale: &impl RationalePolicy,
    ) -> Option<NegotiationOutcome> {
        let required = self.model.required();
        if self.phase == Phase::Idle && required.iter().all(|it| results.is_granted(*it)) {
            log::info!("Full grant delivered with nothing pending");
            return Some(self.enter(self.picker()));
        }
        if self.phase != Phase::AwaitingGrant {
            log::warn!("Stale grant result in phase {:?}", self.phase);
            return None;
        }

        let states: Vec<(Capability, GrantState)> = required
            .iter()
            .map(|it| {
                let granted = results.is_granted(*it);
                let state = if granted {
                    GrantState::Granted
                } else {
                    GrantState::from_flags(false, rationale.should_show_rationale(*it))
                };
                (*it, state)
            })
            .collect();

        for (capability, state) in &states {
            log::info!("{} -> {:?}", capability, state);
        }

        let outcome = if states.iter().all(|(_, it)| *it == GrantState::Granted) {
            self.picker()
        } else if states.iter().any(|(_, it)| *it == GrantState::Denied) {
            NegotiationOutcome::ShowRationale
        } else {
            NegotiationOutcome::ShowSettingsRedirect
        };
        Some(self.enter(outcome))
    }

    /// Answer to the "go to settings" prompt. Returns whether the app settings
    /// screen should be opened. Either way the negotiation is over.
    pub fn on_settings_answer(&mut self, confirmed: bool) -> bool {
        if self.phase != Phase::AwaitingSettingsChoice {
            log::warn!("Stale settings answer in phase {:?}", self.phase);
            return false;
        }
        self.phase = Phase::Idle;
        confirmed
    }

    /// The picker closed, with or without a selection.
    pub fn on_picker_closed(&mut self) -> bool {
        if self.phase != Phase::AwaitingPicker {
            log::warn!("Stale picker result in phase {:?}", self.phase);
            return false;
        }
        self.phase = Phase::Idle;
        true
    }

    /// Drop whatever the controller was waiting on, e.g. when the prompt or
    /// activity it waits for could not be launched.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
    }

    fn picker(&self) -> NegotiationOutcome {
        NegotiationOutcome::ProceedToPicker(self.model.picker_filter(&self.legacy_mime_type))
    }

    fn enter(&mut self, outcome: NegotiationOutcome) -> NegotiationOutcome {
        self.phase = match outcome {
            NegotiationOutcome::ProceedToPicker(_) => Phase::AwaitingPicker,
            NegotiationOutcome::ShowRationale => Phase::AwaitingRationale,
            NegotiationOutcome::ShowSettingsRedirect => Phase::AwaitingSettingsChoice,
            NegotiationOutcome::RequestGrant(_) => Phase::AwaitingGrant,
        };
        log::info!("Negotiation -> {:?}", outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::host::{MockCapabilityQuery, MockRationalePolicy};
    use mockall::predicate::eq;

    fn grants(granted: &'static [Capability]) -> MockCapabilityQuery {
        let mut mock = MockCapabilityQuery::new();
        mock.expect_is_granted()
            .returning(move |it| granted.contains(&it));
        mock
    }

    fn rationale(meaningful: &'static [Capability]) -> MockRationalePolicy {
        let mut mock = MockRationalePolicy::new();
        mock.expect_should_show_rationale()
            .returning(move |it| meaningful.contains(&it));
        mock
    }

    fn dual() -> NegotiationController {
        NegotiationController::new(CapabilityModel::Dual, "image/*")
    }

    fn legacy() -> NegotiationController {
        NegotiationController::new(CapabilityModel::Legacy, "image/*")
    }

    #[test]
    fn all_granted_goes_straight_to_picker_without_asking_rationale() {
        let mut policy = MockRationalePolicy::new();
        policy.expect_should_show_rationale().never();
        let mut controller = dual();

        let outcome = controller.request_access(
            &grants(&[Capability::ReadImages, Capability::ReadVideo]),
            &policy,
        );

        assert_eq!(
            outcome,
            Some(NegotiationOutcome::ProceedToPicker(MediaFilter::ImageAndVideo))
        );
        assert_eq!(controller.phase(), Phase::AwaitingPicker);
    }

    #[test]
    fn only_a_full_grant_skips_the_prompts() {
        let all = [Capability::ReadImages, Capability::ReadVideo];
        for mask in 0..4u8 {
            let granted: Vec<Capability> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, it)| *it)
                .collect();
            let full = granted.len() == all.len();
            let mut query = MockCapabilityQuery::new();
            query
                .expect_is_granted()
                .returning(move |it| granted.contains(&it));

            let outcome = dual().request_access(&query, &rationale(&[]));

            assert_eq!(
                matches!(outcome, Some(NegotiationOutcome::ProceedToPicker(_))),
                full,
                "mask {mask:#04b}"
            );
        }
    }

    #[test]
    fn legacy_granted_uses_mime_picker() {
        let mut policy = MockRationalePolicy::new();
        policy.expect_should_show_rationale().never();
        let mut controller = legacy();

        let outcome = controller.request_access(&grants(&[Capability::LegacyStorageRead]), &policy);
        assert_eq!(
            outcome,
            Some(NegotiationOutcome::ProceedToPicker(MediaFilter::MimeType(
                "image/*".to_string()
            )))
        );
    }

    #[test]
    fn partial_grant_is_not_enough() {
        let mut controller = dual();
        let outcome =
            controller.request_access(&grants(&[Capability::ReadImages]), &rationale(&[]));
        assert_eq!(
            outcome,
            Some(NegotiationOutcome::RequestGrant(vec![
                Capability::ReadImages,
                Capability::ReadVideo
            ]))
        );
    }

    #[test]
    fn nothing_granted_and_no_rationale_requests_directly() {
        let mut controller = legacy();
        let outcome = controller.request_access(&grants(&[]), &rationale(&[]));
        assert_eq!(
            outcome,
            Some(NegotiationOutcome::RequestGrant(vec![
                Capability::LegacyStorageRead
            ]))
        );
        assert_eq!(controller.phase(), Phase::AwaitingGrant);
    }

    #[test]
    fn rationale_for_images_only_precedes_dual_request() {
        let mut controller = dual();

        let first = controller.request_access(&grants(&[]), &rationale(&[Capability::ReadImages]));
        assert_eq!(first, Some(NegotiationOutcome::ShowRationale));

        let second = controller.on_rationale_answer(true);
        assert_eq!(
            second,
            Some(NegotiationOutcome::RequestGrant(vec![
                Capability::ReadImages,
                Capability::ReadVideo
            ]))
        );
    }

    #[test]
    fn cancelling_rationale_ends_negotiation() {
        let mut controller = legacy();
        controller.request_access(&grants(&[]), &rationale(&[Capability::LegacyStorageRead]));

        assert_eq!(controller.on_rationale_answer(false), None);
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn no_duplicate_prompt_while_pending() {
        let mut controller = dual();
        controller.request_access(&grants(&[]), &rationale(&[]));

        let mut query = MockCapabilityQuery::new();
        query.expect_is_granted().never();
        assert_eq!(controller.request_access(&query, &rationale(&[])), None);
        assert_eq!(controller.phase(), Phase::AwaitingGrant);
    }

    #[test]
    fn granted_callback_proceeds_regardless_of_query_service() {
        let mut controller = dual();
        controller.request_access(&grants(&[]), &rationale(&[]));

        let results = GrantResults::new()
            .with(Capability::ReadImages, true)
            .with(Capability::ReadVideo, true);
        let mut policy = MockRationalePolicy::new();
        policy.expect_should_show_rationale().never();

        assert_eq!(
            controller.on_grant_result(&results, &policy),
            Some(NegotiationOutcome::ProceedToPicker(MediaFilter::ImageAndVideo))
        );
    }

    #[test]
    fn denied_callback_with_rationale_loops_back_to_rationale() {
        let mut controller = legacy();
        controller.request_access(&grants(&[]), &rationale(&[]));

        let results = GrantResults::new().with(Capability::LegacyStorageRead, false);
        let outcome =
            controller.on_grant_result(&results, &rationale(&[Capability::LegacyStorageRead]));
        assert_eq!(outcome, Some(NegotiationOutcome::ShowRationale));

        assert_eq!(
            controller.on_rationale_answer(true),
            Some(NegotiationOutcome::RequestGrant(vec![
                Capability::LegacyStorageRead
            ]))
        );
    }

    #[test]
    fn denied_callback_without_rationale_redirects_to_settings() {
        let mut controller = dual();
        controller.request_access(&grants(&[]), &rationale(&[]));

        let results = GrantResults::new()
            .with(Capability::ReadImages, true)
            .with(Capability::ReadVideo, false);
        let mut policy = MockRationalePolicy::new();
        policy
            .expect_should_show_rationale()
            .with(eq(Capability::ReadVideo))
            .times(1)
            .return_const(false);

        assert_eq!(
            controller.on_grant_result(&results, &policy),
            Some(NegotiationOutcome::ShowSettingsRedirect)
        );
        assert_eq!(controller.phase(), Phase::AwaitingSettingsChoice);
        assert!(controller.on_settings_answer(true));
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn empty_callback_counts_as_denial() {
        let mut controller = legacy();
        controller.request_access(&grants(&[]), &rationale(&[]));

        assert_eq!(
            controller.on_grant_result(&GrantResults::new(), &rationale(&[])),
            Some(NegotiationOutcome::ShowSettingsRedirect)
        );
    }

    #[test]
    fn stale_callbacks_are_ignored() {
        let mut controller = dual();
        assert_eq!(controller.on_rationale_answer(true), None);
        assert_eq!(
            controller.on_grant_result(&GrantResults::new(), &rationale(&[])),
            None
        );
        assert!(!controller.on_settings_answer(true));
        assert!(!controller.on_picker_closed());
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn full_grant_with_nothing_pending_proceeds() {
        let mut controller = dual();
        let results = GrantResults::new()
            .with(Capability::ReadImages, true)
            .with(Capability::ReadVideo, true);

        assert_eq!(
            controller.on_grant_result(&results, &rationale(&[])),
            Some(NegotiationOutcome::ProceedToPicker(MediaFilter::ImageAndVideo))
        );
        assert_eq!(controller.phase(), Phase::AwaitingPicker);

        let partial = GrantResults::new().with(Capability::ReadImages, true);
        assert_eq!(controller.on_grant_result(&partial, &rationale(&[])), None);
    }

    #[test]
    fn picker_close_returns_to_idle() {
        let mut controller = legacy();
        controller.request_access(&grants(&[Capability::LegacyStorageRead]), &rationale(&[]));
        assert!(controller.on_picker_closed());
        assert!(!controller.is_pending());
    }
}
