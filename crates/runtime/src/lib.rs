//! User-mode access to one page of physical memory through the SlashMemory driver.
//!
//! A [`MemorySession`] opens the driver's device (installing and starting
//! the driver service first if it is missing), retargets a single
//! page-sized window with [`MemorySession::seek`], and reads or writes
//! 32-bit words inside it. Offsets are checked before any access; the
//! window is never exposed as a raw pointer.
//!
//! ```no_run
//! use slashmem::{AccessDirection, CachingMode, MemorySession};
//!
//! # fn main() -> slashmem::Result<()> {
//! let mut session = MemorySession::new();
//! let word = session.with_session(|session| {
//!     session.seek(0xF800_0000, AccessDirection::ReadOnly, CachingMode::NoCache)?;
//!     session.read_word(0)
//! })?;
//! println!("{word:08x}");
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod config;
pub mod device;
pub mod error;
pub mod fake;
pub mod guard;
pub mod process;
pub mod provision;
pub mod session;
pub mod sys;
pub mod window;

pub use channel::ControlChannel;
pub use config::SessionConfig;
pub use device::{Device, DeviceHandle};
pub use error::{Error, ErrorKind, Result};
pub use guard::SessionGuard;
pub use provision::{ScExe, ServiceControl, ServiceProvisioner};
pub use session::{Mapping, MemorySession, OpenOutcome};
pub use slashmem_protocol::{AccessDirection, CachingMode, MAX_WORD_OFFSET, MappingRequest, PAGE_SIZE};
pub use window::PageWindow;
