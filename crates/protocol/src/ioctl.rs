//! Device-control code construction.

/// `FILE_DEVICE_UNKNOWN` from `devioctl.h`.
pub const FILE_DEVICE_UNKNOWN: u32 = 0x22;

/// Device types at or above this value are reserved for vendors.
pub const CUSTOM_DEVICE_TYPE_BASE: u32 = 0x8000;

/// Functions at or above this value are reserved for vendors.
pub const CUSTOM_FUNCTION_BASE: u32 = 0x800;

/// Transfer method of a control code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TransferMethod {
	Buffered = 0,
	InDirect = 1,
	OutDirect = 2,
	Neither = 3,
}

/// Required access of a control code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum RequiredAccess {
	Any = 0,
	Read = 1,
	Write = 2,
	ReadWrite = 3,
}

/// Equivalent of the `CTL_CODE` macro.
pub const fn ctl_code(device_type: u32, function: u32, method: TransferMethod, access: RequiredAccess) -> u32 {
	(device_type << 16) | ((access as u32) << 14) | (function << 2) | method as u32
}

/// The only control code the driver handles: remap the window.
pub const IOCTL_MEM_SEEK: u32 = ctl_code(
	CUSTOM_DEVICE_TYPE_BASE + FILE_DEVICE_UNKNOWN,
	CUSTOM_FUNCTION_BASE,
	TransferMethod::Buffered,
	RequiredAccess::Any,
);
