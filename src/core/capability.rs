use std::collections::HashMap;
use std::fmt;

/// A revocable permission the platform gates media access behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    LegacyStorageRead,
    ReadImages,
    ReadVideo,
}

impl Capability {
    pub const fn permission_name(&self) -> &'static str {
        match self {
            Self::LegacyStorageRead => "android.permission.READ_EXTERNAL_STORAGE",
            Self::ReadImages => "android.permission.READ_MEDIA_IMAGES",
            Self::ReadVideo => "android.permission.READ_MEDIA_VIDEO",
        }
    }

    pub fn from_permission_name(name: &str) -> Option<Self> {
        [Self::LegacyStorageRead, Self::ReadImages, Self::ReadVideo]
            .into_iter()
            .find(|it| it.permission_name() == name)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.permission_name())
    }
}

/// Per-capability state, recomputed at every decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantState {
    Granted,
    /// Denied, but the platform still considers a re-prompt acceptable.
    Denied,
    /// The platform will no longer show its own prompt; only the settings screen helps.
    DeniedPermanently,
}

impl GrantState {
    /// Only meaningful once a grant request has been answered: before the
    /// first request the platform reports no rationale either.
    pub fn from_flags(granted: bool, rationale: bool) -> Self {
        match (granted, rationale) {
            (true, _) => Self::Granted,
            (false, true) => Self::Denied,
            (false, false) => Self::DeniedPermanently,
        }
    }
}

/// What the content picker is allowed to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaFilter {
    /// Generic content picker restricted to a MIME pattern, e.g. `image/*`.
    MimeType(String),
    /// Photo picker showing both images and videos.
    ImageAndVideo,
}

/// Which set of capabilities the running platform expects.
///
/// Selected once from the platform version so that the rest of the code never
/// branches on version numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityModel {
    /// A single broad storage read permission.
    Legacy,
    /// Separate image and video grants.
    Dual,
}

impl CapabilityModel {
    pub fn detect(sdk_version: i32, legacy_max_sdk: i32) -> Self {
        if sdk_version <= legacy_max_sdk {
            Self::Legacy
        } else {
            Self::Dual
        }
    }

    pub const fn required(&self) -> &'static [Capability] {
        match self {
            Self::Legacy => &[Capability::LegacyStorageRead],
            Self::Dual => &[Capability::ReadImages, Capability::ReadVideo],
        }
    }

    pub fn picker_filter(&self, legacy_mime_type: &str) -> MediaFilter {
        match self {
            Self::Legacy => MediaFilter::MimeType(legacy_mime_type.to_string()),
            Self::Dual => MediaFilter::ImageAndVideo,
        }
    }
}

/// Payload of the grant-request callback.
///
/// Capabilities missing from the callback are treated as denied, which also
/// covers an interrupted request that reports nothing at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantResults(HashMap<Capability, bool>);

impl GrantResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, capability: Capability, granted: bool) -> Self {
        self.0.insert(capability, granted);
        self
    }

    pub fn is_granted(&self, capability: Capability) -> bool {
        self.0.get(&capability).copied().unwrap_or(false)
    }

    pub fn all_granted(&self, capabilities: &[Capability]) -> bool {
        capabilities.iter().all(|it| self.is_granted(*it))
    }

    /// Build from the parallel arrays the platform hands back. Unknown
    /// permission names are dropped.
    pub fn from_platform<'a>(
        permissions: impl IntoIterator<Item = &'a str>,
        granted: impl IntoIterator<Item = bool>,
    ) -> Self {
        let map = permissions
            .into_iter()
            .zip(granted)
            .filter_map(|(name, granted)| {
                Capability::from_permission_name(name).map(|it| (it, granted))
            })
            .collect();
        Self(map)
    }
}

impl FromIterator<(Capability, bool)> for GrantResults {
    fn from_iter<T: IntoIterator<Item = (Capability, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_follows_sdk_threshold() {
        assert_eq!(CapabilityModel::detect(29, 32), CapabilityModel::Legacy);
        assert_eq!(CapabilityModel::detect(32, 32), CapabilityModel::Legacy);
        assert_eq!(CapabilityModel::detect(33, 32), CapabilityModel::Dual);
    }

    #[test]
    fn dual_model_requires_images_and_video() {
        assert_eq!(
            CapabilityModel::Dual.required(),
            &[Capability::ReadImages, Capability::ReadVideo]
        );
        assert_eq!(
            CapabilityModel::Dual.picker_filter("image/*"),
            MediaFilter::ImageAndVideo
        );
        assert_eq!(
            CapabilityModel::Legacy.picker_filter("image/png"),
            MediaFilter::MimeType("image/png".to_string())
        );
    }

    #[test]
    fn missing_results_count_as_denied() {
        let results = GrantResults::new().with(Capability::ReadImages, true);
        assert!(results.is_granted(Capability::ReadImages));
        assert!(!results.is_granted(Capability::ReadVideo));
        assert!(!results.all_granted(CapabilityModel::Dual.required()));
        assert!(!GrantResults::new().all_granted(CapabilityModel::Legacy.required()));
    }

    #[test]
    fn platform_arrays_map_to_capabilities() {
        let results = GrantResults::from_platform(
            [
                "android.permission.READ_MEDIA_IMAGES",
                "android.permission.CAMERA",
                "android.permission.READ_MEDIA_VIDEO",
            ],
            [true, true, false],
        );
        assert!(results.is_granted(Capability::ReadImages));
        assert!(!results.is_granted(Capability::ReadVideo));
        assert_eq!(
            results,
            GrantResults::new()
                .with(Capability::ReadImages, true)
                .with(Capability::ReadVideo, false)
        );
    }

    #[test]
    fn grant_state_from_flags() {
        assert_eq!(GrantState::from_flags(true, true), GrantState::Granted);
        assert_eq!(GrantState::from_flags(false, true), GrantState::Denied);
        assert_eq!(
            GrantState::from_flags(false, false),
            GrantState::DeniedPermanently
        );
    }
}
