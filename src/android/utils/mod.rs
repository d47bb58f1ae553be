pub mod media_permissions;
pub mod ndk;
