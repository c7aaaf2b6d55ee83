//! Numeric arguments: decimal first, then hexadecimal with or without `0x`.

/// Parses `text` as decimal, falling back to hexadecimal.
///
/// `"4096"` is decimal 4096, `"f8000000"` and `"0xF8000000"` are hex.
/// A string of only decimal digits is always read as decimal.
pub fn parse_u64(text: &str) -> Result<u64, String> {
	let text = text.trim().replace('_', "");
	if let Ok(value) = text.parse::<u64>() {
		return Ok(value);
	}
	let digits = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")).unwrap_or(&text);
	u64::from_str_radix(digits, 16).map_err(|_| format!("`{text}` is neither a decimal nor a hexadecimal number"))
}

/// Physical address argument.
pub fn parse_address(text: &str) -> Result<u64, String> {
	parse_u64(text)
}

/// Window offset argument; range and alignment are checked by the session.
pub fn parse_offset(text: &str) -> Result<u16, String> {
	let value = parse_u64(text)?;
	u16::try_from(value).map_err(|_| format!("offset {value:#x} does not fit in 16 bits"))
}

/// 32-bit word value argument.
pub fn parse_word(text: &str) -> Result<u32, String> {
	let value = parse_u64(text)?;
	u32::try_from(value).map_err(|_| format!("value {value:#x} does not fit in 32 bits"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decimal_is_tried_first() {
		assert_eq!(parse_u64("4096").unwrap(), 4096);
		assert_eq!(parse_u64("10").unwrap(), 10);
	}

	#[test]
	fn hex_is_the_fallback() {
		assert_eq!(parse_u64("f8000000").unwrap(), 0xF800_0000);
		assert_eq!(parse_u64("0xF8000000").unwrap(), 0xF800_0000);
		assert_eq!(parse_u64("0Xfed0_0000").unwrap(), 0xFED0_0000);
	}

	#[test]
	fn garbage_is_rejected() {
		assert!(parse_u64("").is_err());
		assert!(parse_u64("0x").is_err());
		assert!(parse_u64("12zz").is_err());
		assert!(parse_u64("-1").is_err());
	}

	#[test]
	fn offsets_and_words_are_range_checked() {
		assert_eq!(parse_offset("0xffc").unwrap(), 0xffc);
		assert!(parse_offset("0x10000").is_err());
		assert_eq!(parse_word("0xffffffff").unwrap(), u32::MAX);
		assert!(parse_word("0x100000000").is_err());
	}
}
