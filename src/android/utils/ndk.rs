use jni::errors::Result;
use jni::objects::{JObject, JString, JThrowable, JValue};
use jni::{JNIEnv, JavaVM};

/// A higher-order function to run a provided JNI function within the JVM context.
///
/// A Java exception raised inside `jni_function` is cleared before returning,
/// so the next call on this thread starts from a clean env.
pub fn run_in_jvm<F, T>(vm: &JavaVM, jni_function: F) -> Result<T>
where
    F: FnOnce(&mut JNIEnv) -> Result<T>,
{
    // Detaches on drop if this call did the attaching
    let mut env = vm.attach_current_thread()?;

    let res = jni_function(&mut *env);
    if res.is_err() && env.exception_check()? {
        env.exception_describe()?;
        env.exception_clear()?;
    }
    res
}

/// `Build.VERSION.SDK_INT`
pub fn sdk_version(env: &mut JNIEnv) -> Result<i32> {
    let build_class = env.find_class("android/os/Build$VERSION")?;
    env.get_static_field(build_class, "SDK_INT", "I")?.i()
}

pub fn new_intent<'local>(env: &mut JNIEnv<'local>, action: &str) -> Result<JObject<'local>> {
    let action = env.new_string(action)?;
    env.new_object(
        "android/content/Intent",
        "(Ljava/lang/String;)V",
        &[JValue::Object(&action)],
    )
}

pub fn string_array<'local>(
    env: &mut JNIEnv<'local>,
    items: &[&str],
) -> Result<jni::objects::JObjectArray<'local>> {
    let array = env.new_object_array(items.len() as i32, "java/lang/String", JObject::null())?;
    for (i, item) in items.iter().enumerate() {
        let item = env.new_string(item)?;
        env.set_object_array_element(&array, i as i32, item)?;
    }
    Ok(array)
}

/// Read a possibly-null Java string.
pub fn optional_string(env: &mut JNIEnv, value: &JString) -> Result<Option<String>> {
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(env.get_string(value)?.into()))
}

/// Take the pending exception off the env.
pub fn take_exception<'local>(env: &mut JNIEnv<'local>) -> Result<JThrowable<'local>> {
    let throwable = env.exception_occurred()?;
    env.exception_clear()?;
    Ok(throwable)
}

pub fn is_security_exception(env: &mut JNIEnv, throwable: &JThrowable) -> Result<bool> {
    // IsInstanceOf answers true for null
    if throwable.is_null() {
        return Ok(false);
    }
    env.is_instance_of(throwable, "java/lang/SecurityException")
}

/// `Throwable.getMessage()`, empty when there is none.
pub fn throwable_message(env: &mut JNIEnv, throwable: &JThrowable) -> Result<String> {
    if throwable.is_null() {
        return Ok(String::new());
    }
    let message = env
        .call_method(throwable, "getMessage", "()Ljava/lang/String;", &[])?
        .l()?;
    Ok(optional_string(env, &JString::from(message))?.unwrap_or_default())
}
