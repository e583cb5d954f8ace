//! BIN layout constants
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Host file (updater executable)               │
//! │  ...                                         │
//! ├──────────────────────────────────────────────┤ ← BIN start (magic)
//! │ Blocks 0-2: housekeeping                     │
//! │ Blocks 3-4, 5-6, 7-8, 9-10: file table slots │
//! ├──────────────────────────────────────────────┤ ← data region (block 10)
//! │ Block 10 = data block 0 (reserved, aliased)  │
//! │ Blocks 11..N: chained payload blocks         │
//! ├──────────────────────────────────────────────┤
//! │  ...                                         │
//! └──────────────────────────────────────────────┘
//! ```

/// Magic sequence that marks the start of the BIN
pub const BIN_MAGIC: [u8; 6] = [0x55, 0xAA, 0x00, 0x01, 0x04, 0x00];

/// Offset of the u16 block count, relative to the magic
pub const BIN_BLOCK_COUNT_OFFSET: usize = 8;

/// Size of one BIN block in bytes
pub const BLOCK_SIZE: usize = 4096;

/// Number of blocks copied into the system region
pub const SYSTEM_BLOCKS: usize = 11;

/// BIN block index where the data region starts
///
/// One less than [`SYSTEM_BLOCKS`]: the first data block is the second half
/// of the last file table slot.
pub const FIRST_DATA_BLOCK: usize = 10;

/// Byte length of the per-block chain header
pub const BLOCK_HEADER_SIZE: usize = 6;

/// Payload bytes one block can carry
pub const USABLE_BLOCK_SIZE: usize = BLOCK_SIZE - BLOCK_HEADER_SIZE;

/// "No address" sentinel for chain pointers and unassigned records
pub const NO_ADDRESS: u16 = 0xFFFF;

/// Fill byte for unused space
pub const EMPTY_BYTE: u8 = 0xFF;

/// Data address that always belongs to the system region
pub const RESERVED_ADDRESS: usize = 0;

/// Number of redundant file table slots
pub const TABLE_SLOT_COUNT: usize = 4;

/// Blocks spanned by one file table slot
pub const TABLE_BLOCKS: usize = 2;

/// Byte length of a table slot
pub const TABLE_SIZE: usize = BLOCK_SIZE * TABLE_BLOCKS;

/// Private header at the start of each table slot
pub const TABLE_HEADER_SIZE: usize = 8;

/// Byte length of one table record
pub const RECORD_SIZE: usize = 32;

/// Record offset of the first block address (u16)
pub const RECORD_ADDR_OFFSET: usize = 0;

/// Record offset of the reserved flag byte
pub const RECORD_FLAG_OFFSET: usize = 2;

/// Flag value written into freshly built records
pub const RECORD_FLAG_DEFAULT: u8 = 0x01;

/// Record offset of the payload size (u32)
pub const RECORD_SIZE_OFFSET: usize = 4;

/// Record offset of the NUL padded file name
pub const RECORD_NAME_OFFSET: usize = 8;

/// Capacity of the file name field
pub const RECORD_NAME_SIZE: usize = 12;

/// Leading record bytes that are all `0xFF` in an empty slot
pub const RECORD_EMPTY_PREFIX: usize = 8;

/// Byte offset of table slot `index` inside the system region
pub const fn table_slot_position(index: usize) -> usize {
    BLOCK_SIZE * (3 + index * TABLE_BLOCKS)
}

/// Blocks needed to store `size` payload bytes
pub fn required_blocks(size: usize) -> usize {
    size.div_ceil(USABLE_BLOCK_SIZE)
}
