pub mod core;

#[cfg(target_os = "android")]
pub mod android;
