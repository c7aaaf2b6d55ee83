//! In-memory device and service manager for testing sessions without a driver.
//!
//! [`FakeDevice`] stands in for the SlashMemory device: it backs every
//! physical address with its own heap page, answers seek requests with that
//! page's address, and records what it was asked. [`FakeServiceControl`]
//! stands in for `sc.exe`: it replays scripted exit codes and records verbs.
//! Linking the two makes a started service bring the device into existence.
//!
//! # Example
//!
//! ```ignore
//! let device = FakeDevice::absent();
//! let control = FakeServiceControl::new();
//! control.link_device(&device);
//!
//! let mut session = MemorySession::with_backend(SessionConfig::default(), device.clone(), control.clone());
//! assert_eq!(session.open()?, OpenOutcome::Provisioned);
//! session.seek(0xF800_0000, AccessDirection::ReadOnly, CachingMode::NoCache)?;
//! ```

use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use slashmem_protocol::{IOCTL_MEM_SEEK, MappingRequest, PAGE_SIZE};

use crate::device::{Device, DeviceHandle};
use crate::provision::ServiceControl;

const WORDS_PER_PAGE: usize = PAGE_SIZE / 4;

type Page = Box<[u32; WORDS_PER_PAGE]>;

#[derive(Default)]
struct DeviceState {
	present: bool,
	open_failures: VecDeque<io::ErrorKind>,
	seek_failures: VecDeque<io::ErrorKind>,
	pages: HashMap<u64, Page>,
	requests: Vec<MappingRequest>,
	opens: usize,
	live_handles: usize,
}

impl DeviceState {
	fn page(&mut self, address: u64) -> &mut Page {
		self.pages.entry(address).or_insert_with(|| Box::new([0; WORDS_PER_PAGE]))
	}
}

/// Shared handle to a simulated device. Clones observe the same state.
#[derive(Clone, Default)]
pub struct FakeDevice {
	state: Arc<Mutex<DeviceState>>,
}

impl FakeDevice {
	/// A device whose driver is already running.
	pub fn present() -> Self {
		let device = Self::default();
		device.set_present(true);
		device
	}

	/// A device whose driver is not installed.
	pub fn absent() -> Self {
		Self::default()
	}

	pub fn set_present(&self, present: bool) {
		self.state.lock().present = present;
	}

	pub fn is_present(&self) -> bool {
		self.state.lock().present
	}

	/// Fails the next open with `kind`, regardless of presence.
	pub fn fail_next_open(&self, kind: io::ErrorKind) {
		self.state.lock().open_failures.push_back(kind);
	}

	/// Fails the next seek with `kind`.
	pub fn fail_next_seek(&self, kind: io::ErrorKind) {
		self.state.lock().seek_failures.push_back(kind);
	}

	/// Reads a word of simulated physical memory.
	pub fn physical_word(&self, address: u64, offset: usize) -> u32 {
		self.state.lock().pages.get(&address).map_or(0, |page| page[offset / 4])
	}

	/// Writes a word of simulated physical memory.
	pub fn set_physical_word(&self, address: u64, offset: usize, value: u32) {
		self.state.lock().page(address)[offset / 4] = value;
	}

	/// Seek requests received so far, decoded as the driver sees them.
	pub fn requests(&self) -> Vec<MappingRequest> {
		self.state.lock().requests.clone()
	}

	/// Number of successful opens.
	pub fn opens(&self) -> usize {
		self.state.lock().opens
	}

	/// Number of handles not yet closed.
	pub fn live_handles(&self) -> usize {
		self.state.lock().live_handles
	}
}

impl Device for FakeDevice {
	type Handle = FakeHandle;

	fn open(&self, path: &str) -> io::Result<FakeHandle> {
		let mut state = self.state.lock();
		if let Some(kind) = state.open_failures.pop_front() {
			return Err(io::Error::new(kind, format!("scripted open failure for {path}")));
		}
		if !state.present {
			return Err(io::Error::new(io::ErrorKind::NotFound, format!("{path} does not exist")));
		}
		state.opens += 1;
		state.live_handles += 1;
		Ok(FakeHandle {
			state: Arc::clone(&self.state),
		})
	}
}

/// Handle returned by [`FakeDevice::open`].
pub struct FakeHandle {
	state: Arc<Mutex<DeviceState>>,
}

impl DeviceHandle for FakeHandle {
	fn device_control(&mut self, code: u32, input: &[u8], output: &mut [u8]) -> io::Result<usize> {
		let mut state = self.state.lock();
		if code != IOCTL_MEM_SEEK {
			return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("unknown control code {code:#x}")));
		}
		let request = MappingRequest::decode(input).ok_or_else(|| io::Error::from(io::ErrorKind::InvalidInput))?;
		state.requests.push(request);

		if let Some(kind) = state.seek_failures.pop_front() {
			return Err(io::Error::new(kind, "scripted seek failure"));
		}
		if output.len() < size_of::<usize>() {
			return Err(io::Error::new(io::ErrorKind::InvalidInput, "output buffer too small"));
		}

		// Boxed pages never move, so the address stays valid after the lock drops.
		let address = state.page(request.physical_address).as_mut_ptr() as usize;
		output[..size_of::<usize>()].copy_from_slice(&address.to_ne_bytes());
		Ok(size_of::<usize>())
	}
}

impl Drop for FakeHandle {
	fn drop(&mut self) {
		self.state.lock().live_handles -= 1;
	}
}

/// One recorded service-control verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
	Create(PathBuf),
	Start,
	Stop,
	Delete,
}

struct ServiceState {
	elevated: bool,
	calls: Vec<ServiceCall>,
	create: VecDeque<i32>,
	start: VecDeque<i32>,
	stop: VecDeque<i32>,
	delete: VecDeque<i32>,
	device: Option<FakeDevice>,
}

/// Scripted stand-in for `sc.exe`. Unscripted verbs succeed with exit code 0.
#[derive(Clone)]
pub struct FakeServiceControl {
	state: Arc<Mutex<ServiceState>>,
}

impl FakeServiceControl {
	/// An elevated service manager where every verb succeeds.
	pub fn new() -> Self {
		Self {
			state: Arc::new(Mutex::new(ServiceState {
				elevated: true,
				calls: Vec::new(),
				create: VecDeque::new(),
				start: VecDeque::new(),
				stop: VecDeque::new(),
				delete: VecDeque::new(),
				device: None,
			})),
		}
	}

	pub fn set_elevated(&self, elevated: bool) {
		self.state.lock().elevated = elevated;
	}

	/// A successful start makes `device` present; a successful stop or delete removes it.
	pub fn link_device(&self, device: &FakeDevice) {
		self.state.lock().device = Some(device.clone());
	}

	pub fn script_create(&self, codes: impl IntoIterator<Item = i32>) {
		self.state.lock().create.extend(codes);
	}

	pub fn script_start(&self, codes: impl IntoIterator<Item = i32>) {
		self.state.lock().start.extend(codes);
	}

	pub fn script_stop(&self, codes: impl IntoIterator<Item = i32>) {
		self.state.lock().stop.extend(codes);
	}

	pub fn script_delete(&self, codes: impl IntoIterator<Item = i32>) {
		self.state.lock().delete.extend(codes);
	}

	/// Verbs issued so far, in order.
	pub fn calls(&self) -> Vec<ServiceCall> {
		self.state.lock().calls.clone()
	}

	pub fn clear_calls(&self) {
		self.state.lock().calls.clear();
	}
}

impl Default for FakeServiceControl {
	fn default() -> Self {
		Self::new()
	}
}

impl ServiceControl for FakeServiceControl {
	fn is_elevated(&self) -> bool {
		self.state.lock().elevated
	}

	fn create(&self, _name: &str, binary: &Path) -> io::Result<i32> {
		let mut state = self.state.lock();
		state.calls.push(ServiceCall::Create(binary.to_path_buf()));
		Ok(state.create.pop_front().unwrap_or(0))
	}

	fn start(&self, _name: &str) -> io::Result<i32> {
		let mut state = self.state.lock();
		state.calls.push(ServiceCall::Start);
		let code = state.start.pop_front().unwrap_or(0);
		if code == 0 {
			if let Some(device) = &state.device {
				device.set_present(true);
			}
		}
		Ok(code)
	}

	fn stop(&self, _name: &str) -> io::Result<i32> {
		let mut state = self.state.lock();
		state.calls.push(ServiceCall::Stop);
		let code = state.stop.pop_front().unwrap_or(0);
		if code == 0 {
			if let Some(device) = &state.device {
				device.set_present(false);
			}
		}
		Ok(code)
	}

	fn delete(&self, _name: &str) -> io::Result<i32> {
		let mut state = self.state.lock();
		state.calls.push(ServiceCall::Delete);
		let code = state.delete.pop_front().unwrap_or(0);
		if code == 0 {
			if let Some(device) = &state.device {
				device.set_present(false);
			}
		}
		Ok(code)
	}
}

#[cfg(test)]
mod tests {
	use slashmem_protocol::{AccessDirection, CachingMode};

	use super::*;

	#[test]
	fn absent_device_reports_not_found() {
		let device = FakeDevice::absent();
		assert_eq!(device.open("dev").err().map(|err| err.kind()), Some(io::ErrorKind::NotFound));
	}

	#[test]
	fn handles_are_counted_until_dropped() {
		let device = FakeDevice::present();
		let handle = device.open("dev").unwrap();
		assert_eq!(device.live_handles(), 1);
		drop(handle);
		assert_eq!(device.live_handles(), 0);
		assert_eq!(device.opens(), 1);
	}

	#[test]
	fn same_address_maps_same_page() {
		let device = FakeDevice::present();
		let mut handle = device.open("dev").unwrap();
		let request = MappingRequest::new(0x2000, AccessDirection::ReadOnly, CachingMode::NoCache).encode();

		let mut first = [0u8; size_of::<usize>()];
		let mut second = [0u8; size_of::<usize>()];
		handle.device_control(IOCTL_MEM_SEEK, &request, &mut first).unwrap();
		handle.device_control(IOCTL_MEM_SEEK, &request, &mut second).unwrap();

		assert_eq!(first, second);
		assert_eq!(device.requests().len(), 2);
	}

	#[test]
	fn linked_start_brings_device_up() {
		let device = FakeDevice::absent();
		let control = FakeServiceControl::new();
		control.link_device(&device);

		control.start("SlashMemory").unwrap();
		assert!(device.is_present());
		control.delete("SlashMemory").unwrap();
		assert!(!device.is_present());
	}
}
