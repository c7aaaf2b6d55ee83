//! Bounds-checked view over the single mapped page.

use std::ptr::NonNull;

use slashmem_protocol::{MAX_WORD_OFFSET, PAGE_SIZE};

use crate::error::{Error, Result};

/// Capability over exactly [`PAGE_SIZE`] bytes of mapped memory.
///
/// The only way in is through [`read_word`](Self::read_word) and
/// [`write_word`](Self::write_word), which validate the offset before
/// touching memory. Accesses are volatile: the page usually backs device
/// registers or firmware tables, where every read and write is observable.
#[derive(Debug)]
pub struct PageWindow {
	base: NonNull<u8>,
}

// The window is a plain address; moving it to another thread does not
// change what it points at. It stays !Sync so two threads cannot race
// volatile writes through a shared reference.
unsafe impl Send for PageWindow {}

impl PageWindow {
	/// Wraps a user-mode address returned by the driver.
	///
	/// Returns `None` for a null or misaligned address.
	///
	/// # Safety
	///
	/// `address` must point at `PAGE_SIZE` bytes that stay mapped and
	/// accessible for as long as the returned window exists.
	pub(crate) unsafe fn from_raw(address: usize) -> Option<Self> {
		if address % std::mem::align_of::<u32>() != 0 {
			return None;
		}
		NonNull::new(address as *mut u8).map(|base| Self { base })
	}

	/// User-mode address of the first byte.
	pub fn address(&self) -> usize {
		self.base.as_ptr() as usize
	}

	pub fn read_word(&self, offset: u16) -> Result<u32> {
		let ptr = self.word_ptr(offset)?;
		// SAFETY: `word_ptr` keeps the word inside the page and aligned;
		// the page is live per the `from_raw` contract.
		Ok(unsafe { ptr.as_ptr().read_volatile() })
	}

	pub fn write_word(&mut self, offset: u16, value: u32) -> Result<()> {
		let ptr = self.word_ptr(offset)?;
		// SAFETY: see `read_word`.
		unsafe { ptr.as_ptr().write_volatile(value) };
		Ok(())
	}

	fn word_ptr(&self, offset: u16) -> Result<NonNull<u32>> {
		check_word_offset(offset)?;
		// SAFETY: offset <= PAGE_SIZE - 4, so the result stays inside the page.
		Ok(unsafe { self.base.add(offset as usize) }.cast::<u32>())
	}
}

/// Validates a word offset: 4-byte aligned and the whole word inside the page.
pub fn check_word_offset(offset: u16) -> Result<()> {
	if offset % 4 != 0 || offset as usize >= PAGE_SIZE - 3 {
		return Err(Error::InvalidOffset(offset));
	}
	debug_assert!(offset <= MAX_WORD_OFFSET);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;

	fn page() -> Box<[u32; PAGE_SIZE / 4]> {
		Box::new([0u32; PAGE_SIZE / 4])
	}

	#[test]
	fn accepts_every_aligned_in_page_offset() {
		for offset in (0..=MAX_WORD_OFFSET).step_by(4) {
			assert!(check_word_offset(offset).is_ok(), "offset {offset}");
		}
	}

	#[test]
	fn rejects_misaligned_and_out_of_page_offsets() {
		for offset in [1u16, 2, 3, 5, 4093, 4094, 4095, 4096, 8192, u16::MAX] {
			let err = check_word_offset(offset).unwrap_err();
			assert_eq!(err.kind(), ErrorKind::InvalidOffset, "offset {offset}");
		}
	}

	#[test]
	fn word_lands_at_byte_offset() {
		let mut backing = page();
		let mut window = unsafe { PageWindow::from_raw(backing.as_mut_ptr() as usize) }.unwrap();

		window.write_word(8, 0xdead_beef).unwrap();
		window.write_word(4092, 7).unwrap();

		assert_eq!(window.read_word(8).unwrap(), 0xdead_beef);
		drop(window);
		assert_eq!(backing[2], 0xdead_beef);
		assert_eq!(backing[1023], 7);
	}

	#[test]
	fn rejected_write_leaves_page_untouched() {
		let mut backing = page();
		let mut window = unsafe { PageWindow::from_raw(backing.as_mut_ptr() as usize) }.unwrap();

		assert!(window.write_word(4094, u32::MAX).is_err());
		drop(window);
		assert!(backing.iter().all(|word| *word == 0));
	}

	#[test]
	fn null_and_misaligned_addresses_are_refused() {
		assert!(unsafe { PageWindow::from_raw(0) }.is_none());
		assert!(unsafe { PageWindow::from_raw(0x1002) }.is_none());
	}
}
