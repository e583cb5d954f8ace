//! # zoomfw - Zoom Pedal Firmware Editor
//!
//! `zoomfw` opens the firmware updater of a Zoom effect pedal, lists the
//! effect and drum files stored in its embedded BIN, and lets you extract,
//! inject, remove and reorder them before writing the updater back out.
//!
//! - **Block chains** of 4 KB blocks with 6-byte link headers
//! - **Redundant file tables** kept in sync on every save
//! - **Sequence index** (`FLST_SEQ.ZDT`) regenerated after each edit
//! - **Defragmentation** to pack all chains from the first data block
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zoomfw::{EditorConfig, Entry, Firmware, Result};
//!
//! # fn main() -> Result<()> {
//! let mut firmware = Firmware::open("G1on_v1.21.exe", EditorConfig::default())?;
//!
//! for info in firmware.entry_infos() {
//!     println!("{:<12} {:<12} {:>6}", info.file_name, info.type_label, info.size);
//! }
//!
//! firmware.inject(Entry::from_file("patches/HALL.ZDL")?, true)?;
//! firmware.remove(&["OLDDLY.ZDL"])?;
//! firmware.save("G1on_v1.21_custom.exe")?;
//! # Ok(())
//! # }
//! ```

// Storage engine
pub mod core;

// Re-export core modules internally so crate:: paths in core still work
#[allow(unused_imports)]
pub(crate) use crate::core::{
    block_map, chain, codec, config, entry, error, firmware, image, io, layout, registry,
    sequence, series, table,
};

// Re-export core types that users need
pub use crate::core::{
    block_map::{BlockMap, RESERVED_OWNER},
    chain::BlockHeader,
    config::EditorConfig,
    entry::Entry,
    error::{FirmwareError, Result},
    firmware::{EntryInfo, Firmware},
    image::Image,
    layout::{BLOCK_SIZE, USABLE_BLOCK_SIZE},
    registry::{Direction, EntryRegistry},
    sequence::SEQUENCE_FILE_NAME,
    series::{EffectType, PedalSeries},
    table::TableSlot,
};
