//! Platform backend for [`Device`](crate::Device) and elevation checks.

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::{SystemDevice, SystemHandle, is_elevated};

#[cfg(not(windows))]
mod unsupported;
#[cfg(not(windows))]
pub use unsupported::{SystemDevice, SystemHandle, is_elevated};
