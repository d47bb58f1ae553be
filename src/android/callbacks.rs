//! JNI entry points called by `com.example.gallery.MainActivity`.
//!
//! All of them run on the UI thread. The screen lives in a process-wide slot
//! because JNI entry points are free functions. When the activity is
//! recreated, `nativeOnCreate` rebinds the screen to the new instance and
//! keeps the negotiation, so results redelivered after a rotation still land.
//! Host calls made while the slot is locked must not call back into these
//! entry points synchronously.

use crate::android::utils::media_permissions::{prompt_kind_from_code, AndroidHost};
use crate::android::utils::ndk::{optional_string, sdk_version};
use crate::core::capability::GrantResults;
use crate::core::config::parse_config;
use crate::core::host::MediaUri;
use crate::core::logging::{init_logger, MediaGateExpectation};
use crate::core::screen::{GalleryEvent, GalleryScreen, Step};
use jni::objects::{JIntArray, JObject, JObjectArray, JString};
use jni::sys::{jboolean, jint, JNI_FALSE};
use jni::JNIEnv;
use std::sync::{Mutex, OnceLock};

static SCREEN: OnceLock<Mutex<Option<GalleryScreen<AndroidHost>>>> = OnceLock::new();

fn slot() -> &'static Mutex<Option<GalleryScreen<AndroidHost>>> {
    SCREEN.get_or_init(|| Mutex::new(None))
}

fn with_screen(f: impl FnOnce(&mut GalleryScreen<AndroidHost>) -> Step) {
    let Ok(mut guard) = slot().lock() else {
        log::error!("Gallery screen lock poisoned");
        return;
    };
    match guard.as_mut() {
        Some(screen) => {
            let step = f(screen);
            log::info!("Step: {:?}", step);
        }
        None => log::warn!("Callback arrived before nativeOnCreate"),
    }
}

#[no_mangle]
pub extern "C" fn Java_com_example_gallery_MainActivity_nativeOnCreate(
    mut env: JNIEnv,
    activity: JObject,
    config_path: JString,
) {
    let config_path = optional_string(&mut env, &config_path)
        .or_log("Failed to read config path", None)
        .unwrap_or_default();
    let config = parse_config(config_path);
    init_logger(&config);

    // An unknown SDK is treated as the newest model
    let sdk = sdk_version(&mut env).or_log("Failed to get SDK_INT", i32::MAX);
    let host = match AndroidHost::new(&mut env, &activity, &config.platform) {
        Ok(host) => host,
        Err(e) => {
            log::error!("Failed to bind to the activity: {}", e);
            return;
        }
    };

    let Ok(mut guard) = slot().lock() else {
        log::error!("Gallery screen lock poisoned");
        return;
    };
    match guard.as_mut() {
        Some(screen) => screen.rebind(host),
        None => *guard = Some(GalleryScreen::new(host, config, sdk)),
    }
    if let Some(screen) = guard.as_mut() {
        let step = screen.on_create();
        log::info!("Step: {:?}", step);
    }
}

#[no_mangle]
pub extern "C" fn Java_com_example_gallery_MainActivity_nativeOnGalleryClick(
    _env: JNIEnv,
    _activity: JObject,
) {
    with_screen(|screen| screen.handle(GalleryEvent::GalleryRequested));
}

#[no_mangle]
pub extern "C" fn Java_com_example_gallery_MainActivity_nativeOnModalAnswered(
    _env: JNIEnv,
    _activity: JObject,
    kind: jint,
    confirmed: jboolean,
) {
    let Some(kind) = prompt_kind_from_code(kind) else {
        log::warn!("Unknown prompt kind {}", kind);
        return;
    };
    with_screen(|screen| {
        screen.handle(GalleryEvent::ModalAnswered {
            kind,
            confirmed: confirmed != JNI_FALSE,
        })
    });
}

/// Forwarded from `Activity.onRequestPermissionsResult`.
#[no_mangle]
pub extern "C" fn Java_com_example_gallery_MainActivity_nativeOnRequestPermissionsResult(
    mut env: JNIEnv,
    _activity: JObject,
    request_code: jint,
    permissions: JObjectArray,
    grant_results: JIntArray,
) {
    log::info!(
        "Processing permission request result with code: {}",
        request_code
    );
    // A failed read of the arrays is an empty result, i.e. a denial
    let results = read_grant_results(&mut env, &permissions, &grant_results)
        .or_log("Failed to process permission results", GrantResults::new());

    with_screen(|screen| {
        if request_code != screen.config().platform.grant_request_code {
            return Step::Ignored;
        }
        screen.handle(GalleryEvent::GrantResult(results))
    });
}

/// Forwarded from `Activity.onActivityResult`; `uri` is null when the user
/// backed out.
#[no_mangle]
pub extern "C" fn Java_com_example_gallery_MainActivity_nativeOnPickerResult(
    mut env: JNIEnv,
    _activity: JObject,
    request_code: jint,
    uri: JString,
) {
    let uri = optional_string(&mut env, &uri)
        .or_log("Failed to read picker result", None)
        .map(MediaUri);

    with_screen(|screen| {
        if request_code != screen.config().platform.picker_request_code {
            return Step::Ignored;
        }
        screen.handle(GalleryEvent::PickerResult(uri))
    });
}

fn read_grant_results(
    env: &mut JNIEnv,
    permissions: &JObjectArray,
    grant_results: &JIntArray,
) -> jni::errors::Result<GrantResults> {
    let length = env.get_array_length(grant_results)?;
    let mut codes = vec![0i32; length as usize];
    env.get_int_array_region(grant_results, 0, &mut codes)?;

    let mut names = Vec::with_capacity(codes.len());
    for i in 0..length {
        let element = env.get_object_array_element(permissions, i)?;
        let name: String = env.get_string(&JString::from(element))?.into();
        let status = if codes[i as usize] == 0 { "GRANTED" } else { "DENIED" };
        log::info!("Permission {} was {}", name, status);
        names.push(name);
    }

    Ok(GrantResults::from_platform(
        names.iter().map(String::as_str),
        codes.iter().map(|it| *it == 0),
    ))
}
