//! Memory dump rendering.

use slashmem::{Device, MemorySession, PAGE_SIZE, ServiceControl};

/// Bytes shown per dump line.
pub const BYTES_PER_LINE: usize = 16;

/// Clamps a requested byte count to whole words inside one page.
pub fn dump_len(requested: usize) -> usize {
	requested.min(PAGE_SIZE) / 4 * 4
}

/// Reads `len` bytes of the current window as words.
pub fn read_words<D: Device, S: ServiceControl>(session: &MemorySession<D, S>, len: usize) -> slashmem::Result<Vec<u32>> {
	(0..dump_len(len)).step_by(4).map(|offset| session.read_word(offset as u16)).collect()
}

/// Renders words the way the classic dump looks: a header, a rule, then
/// four words per line prefixed with the line's byte offset.
///
/// ```text
/// Memory dump of f8000000
/// ----------------------------------------
/// 000: 12378086 02000006 06000002 00000000
/// ```
pub fn render(base: u64, words: &[u32]) -> String {
	let mut out = format!("Memory dump of {base:08x}\n{}\n", "-".repeat(40));
	for (line, chunk) in words.chunks(BYTES_PER_LINE / 4).enumerate() {
		let cells: Vec<String> = chunk.iter().map(|word| format!("{word:08x}")).collect();
		out.push_str(&format!("{:03x}: {}\n", line * BYTES_PER_LINE, cells.join(" ")));
	}
	out
}
