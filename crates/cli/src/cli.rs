use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use slashmem::CachingMode;

use crate::number::{parse_address, parse_offset, parse_word};

#[derive(Parser, Debug)]
#[command(name = "slashmem")]
#[command(about = "Read and write physical memory through the SlashMemory driver")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Session configuration file (JSON)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Driver binary to install when the device is missing
	#[arg(long, global = true, value_name = "PATH")]
	pub driver: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Map a page read-only and print its first bytes, 16 per line
	Dump {
		/// Physical address (decimal, or hex with or without 0x)
		#[arg(value_parser = parse_address)]
		address: u64,
		/// Number of bytes to print (whole words, at most one page)
		#[arg(short, long, default_value_t = 256)]
		bytes: usize,
		#[arg(long, value_enum, default_value = "no-cache")]
		cache: CacheArg,
	},

	/// Read one 32-bit word
	Read {
		#[arg(value_parser = parse_address)]
		address: u64,
		/// Byte offset inside the page (multiple of 4, at most 0xffc)
		#[arg(value_parser = parse_offset)]
		offset: u16,
		#[arg(long, value_enum, default_value = "no-cache")]
		cache: CacheArg,
	},

	/// Write one 32-bit word and read it back
	Write {
		#[arg(value_parser = parse_address)]
		address: u64,
		#[arg(value_parser = parse_offset)]
		offset: u16,
		#[arg(value_parser = parse_word)]
		value: u32,
		#[arg(long, value_enum, default_value = "no-cache")]
		cache: CacheArg,
	},

	/// Install and start the driver service permanently
	Install,

	/// Stop and remove the driver service
	Uninstall {
		/// Skip the up-front elevation check
		#[arg(long)]
		no_elevation_check: bool,
	},
}

/// Caching policy for the mapped page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CacheArg {
	/// Uncached, for device registers
	#[default]
	NoCache,
	/// Cached, for ordinary RAM and firmware tables
	Cached,
	/// Write-combined, for frame buffers
	WriteCombine,
}

impl From<CacheArg> for CachingMode {
	fn from(arg: CacheArg) -> Self {
		match arg {
			CacheArg::NoCache => CachingMode::NoCache,
			CacheArg::Cached => CachingMode::Cached,
			CacheArg::WriteCombine => CachingMode::WriteCombine,
		}
	}
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn cli_definition_is_consistent() {
		Cli::command().debug_assert();
	}

	#[test]
	fn dump_accepts_hex_address_and_defaults() {
		let cli = Cli::try_parse_from(["slashmem", "dump", "0xF8000000"]).unwrap();
		match cli.command {
			Commands::Dump { address, bytes, cache } => {
				assert_eq!(address, 0xF800_0000);
				assert_eq!(bytes, 256);
				assert_eq!(cache, CacheArg::NoCache);
			}
			other => panic!("unexpected command {other:?}"),
		}
	}

	#[test]
	fn write_parses_all_numbers() {
		let cli = Cli::try_parse_from(["slashmem", "-vv", "write", "4096", "0x10", "0xdeadbeef", "--cache", "write-combine"]).unwrap();
		assert_eq!(cli.verbose, 2);
		match cli.command {
			Commands::Write { address, offset, value, cache } => {
				assert_eq!((address, offset, value), (4096, 0x10, 0xdead_beef));
				assert_eq!(CachingMode::from(cache), CachingMode::WriteCombine);
			}
			other => panic!("unexpected command {other:?}"),
		}
	}

	#[test]
	fn oversized_offset_is_a_parse_error() {
		assert!(Cli::try_parse_from(["slashmem", "read", "0", "0x10000"]).is_err());
	}
}
