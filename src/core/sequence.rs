//! Sequence index synthesis
//!
//! `FLST_SEQ.ZDT` lists every effect file grouped by type. It is derived
//! entirely from the registry and regenerated after each structural edit.
//!
//! Layout, one 13-byte line each:
//!
//! ```text
//! 3E 3E 3E 00 <type> 00 ..   opening line of a type bucket
//! <file name, NUL padded>    one line per entry of that type
//! 3C 3C 3C 00 <type> 00 ..   closing line of a type bucket
//! ```
//!
//! Type `0x00` is the unassigned bucket: it always holds a single blank line.
//! Buckets with no entries are omitted.

use crate::entry::Entry;

/// File name of the regenerated index
pub const SEQUENCE_FILE_NAME: &str = "FLST_SEQ.ZDT";

/// Reserved names kept out of the index (and out of the table when excluded)
pub const RESERVED_FILE_NAMES: [&str; 2] = ["FLST_SEQ.ZDT", "FLST_SEQ.ZT2"];

/// Bucket order of the index
pub const TYPE_ORDER: [u8; 15] = [
    0x00, 0x01, 0x02, 0x03, 0x0C, 0x0D, 0x14, 0x16, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0B,
];

/// Width of every line
pub const LINE_SIZE: usize = 13;

/// Payload size the pedal firmware allocates for the index
pub const DEFAULT_FILE_SIZE: usize = 4108;

const OPENING_MARKER: u8 = 0x3E;
const CLOSING_MARKER: u8 = 0x3C;
const MARKER_LEN: usize = 3;
const TYPE_OFFSET: usize = 4;

/// Bucket type with no entries of its own
const UNASSIGNED_TYPE: u8 = 0x00;

type Line = [u8; LINE_SIZE];

pub fn is_reserved(file_name: &str) -> bool {
    RESERVED_FILE_NAMES.contains(&file_name)
}

fn marker_line(marker: u8, type_byte: u8) -> Line {
    let mut line = [0u8; LINE_SIZE];
    line[..MARKER_LEN].fill(marker);
    line[TYPE_OFFSET] = type_byte;
    line
}

fn name_line(file_name: &str) -> Line {
    let mut line = [0u8; LINE_SIZE];
    let bytes = file_name.as_bytes();
    let len = bytes.len().min(LINE_SIZE);
    line[..len].copy_from_slice(&bytes[..len]);
    line
}

/// Index lines for `entries`, in registry order within each bucket
pub fn synthesize(entries: &[Entry]) -> Vec<u8> {
    let mut out = Vec::new();
    for &type_byte in TYPE_ORDER.iter() {
        let middle: Vec<Line> = if type_byte == UNASSIGNED_TYPE {
            vec![[0u8; LINE_SIZE]]
        } else {
            entries
                .iter()
                .filter(|e| e.type_byte() == Some(type_byte) && !is_reserved(e.file_name()))
                .map(|e| name_line(e.file_name()))
                .collect()
        };
        if middle.is_empty() {
            continue;
        }
        out.extend_from_slice(&marker_line(OPENING_MARKER, type_byte));
        for line in &middle {
            out.extend_from_slice(line);
        }
        out.extend_from_slice(&marker_line(CLOSING_MARKER, type_byte));
    }
    out
}

/// Index payload of exactly `budget` bytes, zero padded
///
/// Returns `None` when the lines do not fit into `budget`.
pub fn render(entries: &[Entry], budget: usize) -> Option<Vec<u8>> {
    let mut content = synthesize(entries);
    if content.len() > budget {
        return None;
    }
    content.resize(budget, 0);
    Some(content)
}
