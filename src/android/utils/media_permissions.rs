use crate::android::utils::ndk::{
    is_security_exception, new_intent, run_in_jvm, string_array, take_exception,
    throwable_message,
};
use crate::core::capability::{Capability, MediaFilter};
use crate::core::config::PlatformConfig;
use crate::core::host::{
    CapabilityQuery, Feedback, ImageLoadError, ImageView, LaunchError, Launcher, MediaUri,
    ModalPrompt, PromptKind, RationalePolicy,
};
use crate::core::logging::MediaGateExpectation;
use jni::errors::Error as JniError;
use jni::objects::{GlobalRef, JObject, JValue};
use jni::{JNIEnv, JavaVM};

const ACTION_GET_CONTENT: &str = "android.intent.action.GET_CONTENT";
const ACTION_PICK_IMAGES: &str = "android.provider.action.PICK_IMAGES";
const ACTION_APPLICATION_DETAILS_SETTINGS: &str = "android.settings.APPLICATION_DETAILS_SETTINGS";
const CATEGORY_OPENABLE: &str = "android.intent.category.OPENABLE";
const EXTRA_MIME_TYPES: &str = "android.intent.extra.MIME_TYPES";

// PackageManager.PERMISSION_GRANTED
const PERMISSION_GRANTED: i32 = 0;

/// The hosting activity seen through JNI.
///
/// Permission checks and navigation go straight to framework APIs. Dialogs,
/// notices and image display are delegated to methods the activity exposes,
/// which report back through the entry points in `android::callbacks`.
pub struct AndroidHost {
    vm: JavaVM,
    activity: GlobalRef,
    grant_request_code: i32,
    picker_request_code: i32,
}

impl AndroidHost {
    pub fn new(
        env: &mut JNIEnv,
        activity: &JObject,
        platform: &PlatformConfig,
    ) -> jni::errors::Result<Self> {
        Ok(Self {
            vm: env.get_java_vm()?,
            activity: env.new_global_ref(activity)?,
            grant_request_code: platform.grant_request_code,
            picker_request_code: platform.picker_request_code,
        })
    }

    fn activity(&self) -> &JObject<'static> {
        self.activity.as_obj()
    }

    fn start_for_result(&self, env: &mut JNIEnv, intent: &JObject) -> jni::errors::Result<()> {
        env.call_method(
            self.activity(),
            "startActivityForResult",
            "(Landroid/content/Intent;I)V",
            &[JValue::Object(intent), JValue::Int(self.picker_request_code)],
        )?;
        Ok(())
    }
}

impl CapabilityQuery for AndroidHost {
    fn is_granted(&self, capability: Capability) -> bool {
        run_in_jvm(&self.vm, |env| {
            let permission = env.new_string(capability.permission_name())?;
            let result = env
                .call_method(
                    self.activity(),
                    "checkSelfPermission",
                    "(Ljava/lang/String;)I",
                    &[JValue::Object(&permission)],
                )?
                .i()?;
            Ok(result == PERMISSION_GRANTED)
        })
        .or_log("Failed to call Activity.checkSelfPermission", false)
    }
}

impl RationalePolicy for AndroidHost {
    fn should_show_rationale(&self, capability: Capability) -> bool {
        run_in_jvm(&self.vm, |env| {
            let permission = env.new_string(capability.permission_name())?;
            env.call_method(
                self.activity(),
                "shouldShowRequestPermissionRationale",
                "(Ljava/lang/String;)Z",
                &[JValue::Object(&permission)],
            )?
            .z()
        })
        .or_log(
            "Failed to call Activity.shouldShowRequestPermissionRationale",
            false,
        )
    }
}

impl Launcher for AndroidHost {
    fn launch_picker(&self, filter: &MediaFilter) -> Result<(), LaunchError> {
        run_in_jvm(&self.vm, |env| {
            let intent = match filter {
                MediaFilter::MimeType(mime_type) => {
                    let intent = new_intent(env, ACTION_GET_CONTENT)?;
                    let mime_type = env.new_string(mime_type)?;
                    env.call_method(
                        &intent,
                        "setType",
                        "(Ljava/lang/String;)Landroid/content/Intent;",
                        &[JValue::Object(&mime_type)],
                    )?;
                    let category = env.new_string(CATEGORY_OPENABLE)?;
                    env.call_method(
                        &intent,
                        "addCategory",
                        "(Ljava/lang/String;)Landroid/content/Intent;",
                        &[JValue::Object(&category)],
                    )?;
                    intent
                }
                MediaFilter::ImageAndVideo => {
                    let intent = new_intent(env, ACTION_PICK_IMAGES)?;
                    let any = env.new_string("*/*")?;
                    env.call_method(
                        &intent,
                        "setType",
                        "(Ljava/lang/String;)Landroid/content/Intent;",
                        &[JValue::Object(&any)],
                    )?;
                    let key = env.new_string(EXTRA_MIME_TYPES)?;
                    let types = string_array(env, &["image/*", "video/*"])?;
                    env.call_method(
                        &intent,
                        "putExtra",
                        "(Ljava/lang/String;[Ljava/lang/String;)Landroid/content/Intent;",
                        &[JValue::Object(&key), JValue::Object(&types)],
                    )?;
                    intent
                }
            };
            self.start_for_result(env, &intent)
        })
        .map_err(|e| LaunchError::Picker(e.to_string()))
    }

    fn launch_grant_request(&self, capabilities: &[Capability]) -> Result<(), LaunchError> {
        let names: Vec<&str> = capabilities.iter().map(|it| it.permission_name()).collect();
        run_in_jvm(&self.vm, |env| {
            let permissions = string_array(env, &names)?;
            env.call_method(
                self.activity(),
                "requestPermissions",
                "([Ljava/lang/String;I)V",
                &[
                    JValue::Object(&permissions),
                    JValue::Int(self.grant_request_code),
                ],
            )?;
            log::info!("Requested {} runtime permissions", names.len());
            Ok(())
        })
        .map_err(|e| LaunchError::GrantRequest(e.to_string()))
    }

    fn launch_app_settings(&self, package_id: &str) {
        run_in_jvm(&self.vm, |env| {
            let intent = new_intent(env, ACTION_APPLICATION_DETAILS_SETTINGS)?;
            let scheme = env.new_string("package")?;
            let package = env.new_string(package_id)?;
            let uri = env
                .call_static_method(
                    "android/net/Uri",
                    "fromParts",
                    "(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;)Landroid/net/Uri;",
                    &[
                        JValue::Object(&scheme),
                        JValue::Object(&package),
                        JValue::Object(&JObject::null()),
                    ],
                )?
                .l()?;
            env.call_method(
                &intent,
                "setData",
                "(Landroid/net/Uri;)Landroid/content/Intent;",
                &[JValue::Object(&uri)],
            )?;
            env.call_method(
                self.activity(),
                "startActivity",
                "(Landroid/content/Intent;)V",
                &[JValue::Object(&intent)],
            )?;
            Ok(())
        })
        .or_log("Failed to open app settings", ());
    }
}

impl Feedback for AndroidHost {
    fn show_dismissible_notice(&self, text: &str) {
        run_in_jvm(&self.vm, |env| {
            let text = env.new_string(text)?;
            env.call_method(
                self.activity(),
                "showNotice",
                "(Ljava/lang/String;)V",
                &[JValue::Object(&text)],
            )?;
            Ok(())
        })
        .or_log("Failed to show notice", ());
    }

    fn show_modal_choice(&self, prompt: &ModalPrompt) -> Result<(), LaunchError> {
        run_in_jvm(&self.vm, |env| {
            let title = env.new_string(&prompt.title)?;
            let message = env.new_string(&prompt.message)?;
            let confirm = env.new_string(&prompt.confirm_label)?;
            let cancel = env.new_string(&prompt.cancel_label)?;
            env.call_method(
                self.activity(),
                "showModalChoice",
                "(ILjava/lang/String;Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;)V",
                &[
                    JValue::Int(prompt_kind_code(prompt.kind)),
                    JValue::Object(&title),
                    JValue::Object(&message),
                    JValue::Object(&confirm),
                    JValue::Object(&cancel),
                ],
            )?;
            Ok(())
        })
        .map_err(|e| LaunchError::Prompt(e.to_string()))
    }
}

impl ImageView for AndroidHost {
    fn display(&self, uri: &MediaUri) -> Result<(), ImageLoadError> {
        if uri.0.trim().is_empty() {
            return Err(ImageLoadError::MalformedUri(uri.0.clone()));
        }
        run_in_jvm(&self.vm, |env| {
            let value = env.new_string(&uri.0)?;
            match env.call_method(
                self.activity(),
                "displayImage",
                "(Ljava/lang/String;)V",
                &[JValue::Object(&value)],
            ) {
                Ok(_) => Ok(Ok(())),
                Err(JniError::JavaException) => {
                    let throwable = take_exception(env)?;
                    if is_security_exception(env, &throwable)? {
                        return Ok(Err(ImageLoadError::AccessRevoked(uri.0.clone())));
                    }
                    let message = throwable_message(env, &throwable)?;
                    Ok(Err(ImageLoadError::Platform(message)))
                }
                Err(e) => Err(e),
            }
        })
        .unwrap_or_else(|e| Err(ImageLoadError::Platform(e.to_string())))
    }
}

/// The int the activity's `showModalChoice` receives and echoes back.
pub fn prompt_kind_code(kind: PromptKind) -> i32 {
    match kind {
        PromptKind::Rationale => 0,
        PromptKind::SettingsRedirect => 1,
    }
}

pub fn prompt_kind_from_code(code: i32) -> Option<PromptKind> {
    match code {
        0 => Some(PromptKind::Rationale),
        1 => Some(PromptKind::SettingsRedirect),
        _ => None,
    }
}
