//! Zoom firmware block storage
//!
//! Storage layer of the BIN embedded in Zoom effect pedal updaters.
//!
//! - [`codec`] - Little-endian integers, hex helpers and byte-pattern search
//! - [`layout`] - Format constants (blocks, table slots, records)
//! - [`image`] - Locates the BIN and splits it into system and data regions
//! - [`table`] - File table slot location and rebuilding
//! - [`chain`] - Block chain headers, reading and writing
//! - [`block_map`] - Per-address ownership and first-fit allocation
//! - [`entry`] / [`registry`] - Payload entries in table order
//! - [`sequence`] - `FLST_SEQ.ZDT` index synthesis
//! - [`firmware`] - Editing session tying everything together
//!
//! ## Architecture
//!
//! ```text
//! Host file ──load──> Image ──locate──> TableSlot ──records──> Entry
//!                       │                                        │
//!                       └── data region ──read_chain──> BlockMap + content
//!
//! inject / remove / move_entry / defragment
//!        └──> write_chain, sequence refresh, table rebuild
//!
//! save ──> data region, then system region, spliced into the host bytes
//! ```

pub mod block_map;
pub mod chain;
pub mod codec;
pub mod config;
pub mod entry;
pub mod error;
pub mod firmware;
pub mod image;
pub mod io;
pub mod layout;
pub mod registry;
pub mod sequence;
pub mod series;
pub mod table;

// Re-export commonly used types
pub use block_map::BlockMap;
pub use chain::BlockHeader;
pub use config::EditorConfig;
pub use entry::Entry;
pub use error::{FirmwareError, Result};
pub use firmware::{EntryInfo, Firmware};
pub use image::Image;
pub use registry::{Direction, EntryRegistry};
pub use series::{EffectType, PedalSeries};
pub use table::TableSlot;
