use crate::core::config::{GalleryConfig, LOG_TAG, VERSION};
use std::fmt::Display;

/// Platform calls in this crate never abort the flow: a failed JNI call is
/// logged and replaced by a safe answer, usually "not granted".
pub trait MediaGateExpectation<T> {
    fn or_log(self, context: &str, fallback: T) -> T;
}

impl<T, E: Display> MediaGateExpectation<T> for Result<T, E> {
    fn or_log(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(e) => {
                log::error!("{}: {}", context, e);
                fallback
            }
        }
    }
}

#[cfg(target_os = "android")]
static SENTRY_GUARD: std::sync::OnceLock<sentry::ClientInitGuard> =
    std::sync::OnceLock::new();

/// Install the logger once per process. Safe to call again when the activity
/// is recreated.
#[cfg(target_os = "android")]
pub fn init_logger(config: &GalleryConfig) {
    let logcat = android_logger::AndroidLogger::new(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Info)
            .with_tag(LOG_TAG),
    );
    // Records also become Sentry breadcrumbs, and errors Sentry events, once
    // a client is bound below
    let logger = sentry::integrations::log::SentryLogger::with_dest(logcat);
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }

    if !config.sentry_dsn.is_empty() && SENTRY_GUARD.get().is_none() {
        let guard = sentry::init((
            config.sentry_dsn.as_str(),
            sentry::ClientOptions {
                release: Some(VERSION.into()),
                ..Default::default()
            },
        ));
        let _ = SENTRY_GUARD.set(guard);
    }

    log::info!("{} {} started", LOG_TAG, VERSION);
}

#[cfg(not(target_os = "android"))]
pub fn init_logger(config: &GalleryConfig) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
    if !config.sentry_dsn.is_empty() {
        log::debug!("Crash reporting is only wired up on Android");
    }
    log::info!("{} {} started", LOG_TAG, VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_yields_fallback() {
        let result: Result<bool, String> = Err("no such method".to_string());
        assert!(!result.or_log("checkSelfPermission", false));
        assert!(Ok::<bool, String>(true).or_log("checkSelfPermission", false));
    }
}
