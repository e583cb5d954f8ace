//! Synthetic firmware images for integration tests
//!
//! Images are encoded here byte by byte, independent of the crate's own
//! writers, so tests check the engine against the on-disk format.

#![allow(dead_code)]

pub const BLOCK: usize = 4096;
pub const USABLE: usize = 4090;
pub const MAGIC: [u8; 6] = [0x55, 0xAA, 0x00, 0x01, 0x04, 0x00];
pub const NONE: u16 = 0xFFFF;

/// Block count that yields exactly 100 usable data blocks
pub const HUNDRED_BLOCKS: u16 = 111;

pub struct StoredFile {
    pub file_name: String,
    pub content: Vec<u8>,
    pub addresses: Vec<usize>,
}

pub struct ImageBuilder {
    prefix: Vec<u8>,
    suffix: Vec<u8>,
    block_count: u16,
    /// `(valid, primary)` per table slot
    slots: [(bool, bool); 4],
    files: Vec<StoredFile>,
    next_address: usize,
}

impl ImageBuilder {
    pub fn new(block_count: u16) -> Self {
        ImageBuilder {
            prefix: vec![0x4D; 64],
            suffix: vec![0x5A; 32],
            block_count,
            slots: [(true, true), (true, false), (true, false), (true, false)],
            files: Vec::new(),
            next_address: 1,
        }
    }

    /// Embed a product-family label in the bytes before the BIN
    pub fn series_label(mut self, label: &str) -> Self {
        self.prefix.extend_from_slice(label.as_bytes());
        self.prefix.extend_from_slice(&[0x00; 16]);
        self
    }

    pub fn slots(mut self, slots: [(bool, bool); 4]) -> Self {
        self.slots = slots;
        self
    }

    /// Store a file in the next free contiguous blocks
    pub fn file(mut self, file_name: &str, content: Vec<u8>) -> Self {
        let count = content.len().div_ceil(USABLE);
        let addresses: Vec<usize> = (self.next_address..self.next_address + count).collect();
        self.next_address += count;
        self.files.push(StoredFile {
            file_name: file_name.to_string(),
            content,
            addresses,
        });
        self
    }

    /// Store a file at explicit block addresses, in chain order
    pub fn file_at(mut self, file_name: &str, content: Vec<u8>, addresses: &[usize]) -> Self {
        assert_eq!(addresses.len(), content.len().div_ceil(USABLE));
        if let Some(&max) = addresses.iter().max() {
            self.next_address = self.next_address.max(max + 1);
        }
        self.files.push(StoredFile {
            file_name: file_name.to_string(),
            content,
            addresses: addresses.to_vec(),
        });
        self
    }

    pub fn files(&self) -> &[StoredFile] {
        &self.files
    }

    /// Host byte offset of data block `address`
    pub fn data_block_offset(&self, address: usize) -> usize {
        self.prefix.len() + (10 + address) * BLOCK
    }

    pub fn build(&self) -> Vec<u8> {
        let mut bin = vec![0xFFu8; usize::from(self.block_count) * BLOCK];
        bin[..6].copy_from_slice(&MAGIC);
        bin[6..8].copy_from_slice(&[0x00, 0x00]);
        bin[8..10].copy_from_slice(&self.block_count.to_le_bytes());

        // Housekeeping blocks get some non-FF noise
        for (i, b) in bin[16..3 * BLOCK].iter_mut().enumerate() {
            *b = (i % 7) as u8;
        }

        // Chains first; slot 3 shares block 10 with data block 0
        for file in &self.files {
            write_chain(&mut bin, &file.addresses, &file.content);
        }

        let mut body = vec![0xFFu8; 2 * BLOCK - 8];
        for (i, file) in self.files.iter().enumerate() {
            let address = file.addresses.first().map_or(NONE, |&a| a as u16);
            body[i * 32..(i + 1) * 32]
                .copy_from_slice(&record(address, file.content.len() as u32, &file.file_name));
        }

        for (i, &(valid, primary)) in self.slots.iter().enumerate() {
            let pos = BLOCK * (3 + 2 * i);
            let header = &mut bin[pos..pos + 8];
            header.copy_from_slice(&[0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x20, i as u8]);
            if valid {
                header[1] = 0xA5;
                header[5] = 0xFF;
                header[4] = if primary { 0xFF } else { 0x01 };
                bin[pos + 8..pos + 2 * BLOCK].copy_from_slice(&body);
            }
        }

        let mut host = self.prefix.clone();
        host.extend_from_slice(&bin);
        host.extend_from_slice(&self.suffix);
        host
    }
}

/// One 32-byte table record
pub fn record(address: u16, size: u32, file_name: &str) -> [u8; 32] {
    let mut rec = [0xFFu8; 32];
    rec[0..2].copy_from_slice(&address.to_le_bytes());
    rec[2] = 0x01;
    rec[4..8].copy_from_slice(&size.to_le_bytes());
    rec[8..20].fill(0);
    rec[8..8 + file_name.len()].copy_from_slice(file_name.as_bytes());
    rec
}

/// Encode a chain into a BIN buffer
fn write_chain(bin: &mut [u8], addresses: &[usize], content: &[u8]) {
    for (i, &addr) in addresses.iter().enumerate() {
        let start = (10 + addr) * BLOCK;
        let chunk = &content[i * USABLE..((i + 1) * USABLE).min(content.len())];
        let prev = if i > 0 { addresses[i - 1] as u16 } else { NONE };
        let next = addresses.get(i + 1).map_or(NONE, |&a| a as u16);
        bin[start..start + 2].copy_from_slice(&prev.to_le_bytes());
        bin[start + 2..start + 4].copy_from_slice(&next.to_le_bytes());
        bin[start + 4..start + 6].copy_from_slice(&(chunk.len() as u16).to_le_bytes());
        bin[start + 6..start + 6 + chunk.len()].copy_from_slice(chunk);
        bin[start + 6 + chunk.len()..start + BLOCK].fill(0xFF);
    }
}

/// Effect payload with a display name and a type byte at offset 60
pub fn effect(name: &str, type_byte: u8, len: usize) -> Vec<u8> {
    assert!(len >= 120);
    let mut content: Vec<u8> = (0..len).map(|i| (i % 199) as u8 | 0x01).collect();
    content[60] = type_byte;
    content[70..75].copy_from_slice(b"OnOff");
    let mut field = [0x20u8; 12];
    field[..name.len()].copy_from_slice(name.as_bytes());
    content[90..102].copy_from_slice(&field);
    content[102..106].copy_from_slice(&[0xFF; 4]);
    content
}

/// Drum sample payload
pub fn sample(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

/// A sequence index payload of the size the pedal uses
pub fn sequence_placeholder() -> Vec<u8> {
    vec![0u8; 4108]
}

/// Small image with a mix of effects, a sample and the sequence index
pub fn standard_image() -> ImageBuilder {
    ImageBuilder::new(HUNDRED_BLOCKS)
        .file("FLST_SEQ.ZDT", sequence_placeholder())
        .file("COMP.ZDL", effect("Comp", 0x01, 3000))
        .file("HALL.ZDL", effect("Hall", 0x09, 9000))
        .file("KICK.RAW", sample(5000, 3))
        .file("DELAY.ZDL", effect("Delay", 0x08, 4090))
}
