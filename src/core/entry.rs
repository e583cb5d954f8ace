//! Payload entries (effects, drum samples, the sequence index)
//!
//! An entry pairs its 32-byte file table record with the payload bytes
//! reconstructed from (or destined for) its block chain.

use crate::codec;
use crate::error::{FirmwareError, Result};
use crate::layout::{
    required_blocks, EMPTY_BYTE, NO_ADDRESS, RECORD_ADDR_OFFSET, RECORD_EMPTY_PREFIX,
    RECORD_FLAG_DEFAULT, RECORD_FLAG_OFFSET, RECORD_NAME_OFFSET, RECORD_NAME_SIZE, RECORD_SIZE,
    RECORD_SIZE_OFFSET,
};
use crate::series::type_label;
use std::path::Path;
use tracing::{debug, warn};

/// Content offset of the effect type byte
pub const TYPE_BYTE_OFFSET: usize = 60;

/// Marker that precedes the display name in effect payloads
const NAME_MARKER: &[u8] = b"OnOff";

/// Terminator searched after the marker; the name ends right before it
const NAME_END: [u8; 4] = [0xFF; 4];

/// Width of the display name field
const NAME_SIZE: usize = 12;

/// One file table record
pub type TableRecord = [u8; RECORD_SIZE];

/// A payload entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    file_name: String,
    record: TableRecord,
    content: Vec<u8>,
    name: Option<String>,
    type_byte: Option<u8>,
}

impl Entry {
    /// Build a fresh entry from a file name and its payload
    ///
    /// The record gets the default flag, the payload size and an unassigned
    /// address; the address is filled in on injection.
    pub fn new(file_name: &str, content: Vec<u8>) -> Result<Self> {
        validate_file_name(file_name)?;
        let size = record_size(file_name, content.len())?;

        let mut record = [EMPTY_BYTE; RECORD_SIZE];
        record[RECORD_FLAG_OFFSET] = RECORD_FLAG_DEFAULT;
        codec::write_u32(&mut record, RECORD_SIZE_OFFSET, size)?;
        record[RECORD_NAME_OFFSET..RECORD_NAME_OFFSET + RECORD_NAME_SIZE].fill(0);
        record[RECORD_NAME_OFFSET..RECORD_NAME_OFFSET + file_name.len()]
            .copy_from_slice(file_name.as_bytes());

        let mut entry = Entry {
            file_name: file_name.to_string(),
            record,
            content: Vec::new(),
            name: None,
            type_byte: None,
        };
        entry.set_content(content);
        Ok(entry)
    }

    /// Read a payload file from disk, named after the file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| FirmwareError::InvalidFileName(path.display().to_string()))?;
        // Reject before reading so oversized names never touch the disk
        validate_file_name(file_name)?;
        debug!("Loading entry from {:?}", path);
        let content = std::fs::read(path)?;
        Self::new(file_name, content)
    }

    /// Parse a table record
    ///
    /// Returns `None` for an empty slot (first 8 bytes all `0xFF`) and for a
    /// record with no file name.
    pub fn from_record(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < RECORD_SIZE {
            return None;
        }
        if bytes[..RECORD_EMPTY_PREFIX].iter().all(|&b| b == EMPTY_BYTE) {
            return None;
        }
        let mut record = [0u8; RECORD_SIZE];
        record.copy_from_slice(&bytes[..RECORD_SIZE]);

        let file_name = record_file_name(&record);
        if file_name.is_empty() {
            warn!("Skipping nameless table record: {}", codec::to_hex(&record));
            return None;
        }

        Some(Entry {
            file_name,
            record,
            content: Vec::new(),
            name: None,
            type_byte: None,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Display name parsed from the payload, absent for raw files
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Type byte parsed from the payload
    pub fn type_byte(&self) -> Option<u8> {
        self.type_byte
    }

    /// Human label for the type, e.g. "REVERB" or "DRUM SOUND"
    pub fn type_label(&self) -> String {
        type_label(self.type_byte, &self.file_name)
    }

    /// First block address from the record (`0xFFFF` = unassigned)
    pub fn address(&self) -> u16 {
        u16::from_le_bytes([
            self.record[RECORD_ADDR_OFFSET],
            self.record[RECORD_ADDR_OFFSET + 1],
        ])
    }

    pub fn set_address(&mut self, address: u16) {
        self.record[RECORD_ADDR_OFFSET..RECORD_ADDR_OFFSET + 2]
            .copy_from_slice(&address.to_le_bytes());
    }

    pub fn has_address(&self) -> bool {
        self.address() != NO_ADDRESS
    }

    /// Payload size from the record
    pub fn size(&self) -> usize {
        u32::from_le_bytes([
            self.record[RECORD_SIZE_OFFSET],
            self.record[RECORD_SIZE_OFFSET + 1],
            self.record[RECORD_SIZE_OFFSET + 2],
            self.record[RECORD_SIZE_OFFSET + 3],
        ]) as usize
    }

    /// Blocks the payload occupies
    pub fn blocks_used(&self) -> usize {
        required_blocks(self.size())
    }

    pub fn record(&self) -> &TableRecord {
        &self.record
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    /// Replace the payload and re-derive name and type
    ///
    /// The record size is left alone; callers replacing content of a
    /// different length must rebuild the entry.
    pub fn set_content(&mut self, content: Vec<u8>) {
        self.content = content;
        self.name = extract_name(&self.content);
        self.type_byte = self.content.get(TYPE_BYTE_OFFSET).copied();
    }

    /// Overwrite the type byte, both parsed and inside the payload
    pub fn set_type_byte(&mut self, type_byte: u8) {
        if let Some(slot) = self.content.get_mut(TYPE_BYTE_OFFSET) {
            *slot = type_byte;
            self.type_byte = Some(type_byte);
        }
    }
}

/// Payload length as stored in the record's 32-bit size field
fn record_size(file_name: &str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| FirmwareError::EntryTooLarge {
        file_name: file_name.to_string(),
        size: len,
        max: u32::MAX as usize,
    })
}

/// Check a file name fits the record's name field
pub fn validate_file_name(file_name: &str) -> Result<()> {
    if file_name.is_empty() || !file_name.is_ascii() || file_name.contains('\0') {
        return Err(FirmwareError::InvalidFileName(file_name.to_string()));
    }
    if file_name.len() > RECORD_NAME_SIZE {
        return Err(FirmwareError::FileNameTooLong {
            name: file_name.to_string(),
            max: RECORD_NAME_SIZE,
        });
    }
    Ok(())
}

fn record_file_name(record: &TableRecord) -> String {
    record[RECORD_NAME_OFFSET..RECORD_NAME_OFFSET + RECORD_NAME_SIZE]
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect()
}

/// Display name: the 12 bytes before the first `FF FF FF FF` after "OnOff"
fn extract_name(content: &[u8]) -> Option<String> {
    let marker = codec::find(content, NAME_MARKER, 0)?;
    let end = codec::find(content, &NAME_END, marker)?;
    let start = end.checked_sub(NAME_SIZE)?;
    let raw = String::from_utf8_lossy(&content[start..end]);
    Some(raw.trim_matches(|c: char| c <= ' ').to_string())
}
