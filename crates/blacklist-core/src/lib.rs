//! blacklist-core: Pure domain logic for the dispute game blacklist scanner
//!
//! This crate holds everything that does not touch the network:
//! - Storage layout of a dynamic `address[]` (length slot + keccak-derived data slots)
//! - Decoding of raw 32-byte storage cells into checksummed addresses
//! - Read-only method descriptors (selector + fixed args + `uint256` return)
//! - The threshold filter applied to enriched records
//! - Scan configuration, error taxonomy and output rendering
//!
//! # Storage layout
//!
//! For an array declared at slot `p`:
//!
//! | Slot | Content |
//! |------|---------|
//! | `p` | array length |
//! | `keccak256(p) + i` | element `i` |
//!
//! The async reader and enricher live in `blacklist-scanner`.

mod cell;
mod config;
mod error;
mod filter;
mod method;
mod output;
mod slot;

pub use cell::{decode_address, decode_length, has_dirty_high_bits};
pub use config::{RetryPolicy, ScanConfig, DEFAULT_CONCURRENCY, DEFAULT_METHOD_SIGNATURE};
pub use error::{Error, PortError};
pub use filter::{filter_by_threshold, EnrichedRecord};
pub use method::MethodDescriptor;
pub use output::{render_addresses, OutputFormat};
pub use slot::{array_data_slot, element_slot, keccak256, ArraySlots};

pub type Result<T> = std::result::Result<T, Error>;

/// Constants for the storage layout
pub mod constants {
    /// Size of a storage cell in bytes
    pub const CELL_SIZE: usize = 32;

    /// Size of an address in bytes
    pub const ADDRESS_SIZE: usize = 20;

    /// Offset of the address within a left-padded cell
    pub const ADDRESS_OFFSET: usize = CELL_SIZE - ADDRESS_SIZE;

    /// Size of a function selector in bytes
    pub const SELECTOR_SIZE: usize = 4;
}
