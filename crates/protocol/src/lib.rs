//! Wire types for the SlashMemory device-control protocol.
//!
//! This crate contains the fixed-layout request exchanged with the
//! SlashMemory kernel driver and the well-known names the user-mode side
//! needs to find it. These types represent the "protocol layer" - the shapes
//! of data as they cross the user/kernel boundary.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond encoding
//! * 1:1 with the driver: Match the `INPUT_MEM_SEEK` structure and codes the
//!   driver dispatches on
//! * Stable: Changes only when the driver interface changes
//!
//! Session lifecycle and window access are built on top of these types in
//! `slashmem`.

pub mod ioctl;
pub mod request;

pub use ioctl::*;
pub use request::*;

/// Size of the single window mapped by one seek.
pub const PAGE_SIZE: usize = 4096;

/// Byte offset of the last 32-bit word that fits entirely inside the window.
pub const MAX_WORD_OFFSET: u16 = (PAGE_SIZE - 4) as u16;

/// User-mode path of the device object created by the driver.
pub const DEVICE_PATH: &str = r"\\.\SlashMemory";

/// Name of the kernel service registration backing [`DEVICE_PATH`].
pub const SERVICE_NAME: &str = "SlashMemory";

/// File name of the packaged driver binary.
pub const DRIVER_FILE_NAME: &str = "slash_memory.sys";
