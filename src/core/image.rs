//! Image loader
//!
//! Locates the BIN inside an arbitrary host file and splits it into the
//! system region (housekeeping + file tables) and the data region (chained
//! payload blocks). Both regions are owned copies; [`Image::to_host_bytes`]
//! splices them back into the host buffer.

use crate::codec;
use crate::error::{FirmwareError, Result};
use crate::layout::{
    BIN_BLOCK_COUNT_OFFSET, BIN_MAGIC, BLOCK_SIZE, EMPTY_BYTE, FIRST_DATA_BLOCK, SYSTEM_BLOCKS,
};
use crate::series::PedalSeries;
use tracing::{debug, info};

/// In-memory BIN image
#[derive(Debug, Clone)]
pub struct Image {
    /// Untouched host file bytes
    host: Vec<u8>,

    /// Byte offset of the BIN magic inside the host file
    bin_offset: usize,

    /// Number of BIN blocks, as stored after the magic
    block_count: usize,

    /// System region: `SYSTEM_BLOCKS` blocks from the BIN start
    system: Vec<u8>,

    /// Data region: BIN blocks `FIRST_DATA_BLOCK..block_count`
    data: Vec<u8>,

    /// Detected hardware family, if any label was found
    pedal_series: Option<PedalSeries>,
}

impl Image {
    /// Parse a host file buffer
    pub fn load(host: Vec<u8>) -> Result<Self> {
        let bin_offset = codec::find(&host, &BIN_MAGIC, 0).ok_or(FirmwareError::BinNotFound)?;
        let block_count =
            usize::from(codec::read_u16(&host, bin_offset + BIN_BLOCK_COUNT_OFFSET)?);

        if block_count < SYSTEM_BLOCKS {
            return Err(FirmwareError::Truncated {
                needed: SYSTEM_BLOCKS * BLOCK_SIZE,
                actual: block_count * BLOCK_SIZE,
            });
        }

        let system = codec::copy_part(&host, bin_offset, SYSTEM_BLOCKS * BLOCK_SIZE)?;
        let data = codec::copy_part(
            &host,
            bin_offset + FIRST_DATA_BLOCK * BLOCK_SIZE,
            (block_count - FIRST_DATA_BLOCK) * BLOCK_SIZE,
        )?;

        let pedal_series = PedalSeries::detect(&host);

        info!(
            "BIN found at offset {}: {} blocks ({} bytes), series {:?}",
            bin_offset,
            block_count,
            block_count * BLOCK_SIZE,
            pedal_series
        );

        Ok(Image {
            host,
            bin_offset,
            block_count,
            system,
            data,
            pedal_series,
        })
    }

    pub fn bin_offset(&self) -> usize {
        self.bin_offset
    }

    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Number of addresses in the data region, reserved block 0 included
    pub fn data_block_count(&self) -> usize {
        self.block_count - FIRST_DATA_BLOCK
    }

    /// Payload blocks available to entries
    pub fn total_blocks(&self) -> usize {
        self.block_count - SYSTEM_BLOCKS
    }

    pub fn pedal_series(&self) -> Option<PedalSeries> {
        self.pedal_series
    }

    pub fn set_pedal_series(&mut self, series: Option<PedalSeries>) {
        self.pedal_series = series;
    }

    pub fn system(&self) -> &[u8] {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut [u8] {
        &mut self.system
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Bytes of data block `address`
    pub fn block(&self, address: usize) -> Result<&[u8]> {
        let start = address * BLOCK_SIZE;
        self.data
            .get(start..start + BLOCK_SIZE)
            .ok_or(FirmwareError::Truncated {
                needed: start + BLOCK_SIZE,
                actual: self.data.len(),
            })
    }

    /// Mutable bytes of data block `address`
    pub fn block_mut(&mut self, address: usize) -> Result<&mut [u8]> {
        let start = address * BLOCK_SIZE;
        let len = self.data.len();
        self.data
            .get_mut(start..start + BLOCK_SIZE)
            .ok_or(FirmwareError::Truncated {
                needed: start + BLOCK_SIZE,
                actual: len,
            })
    }

    /// Reset the whole data region to `0xFF`
    pub fn clear_data(&mut self) {
        debug!("Clearing {} data bytes", self.data.len());
        self.data.fill(EMPTY_BYTE);
    }

    /// The original host bytes
    pub fn host(&self) -> &[u8] {
        &self.host
    }

    /// Host bytes with both regions spliced back in
    ///
    /// The data region goes first so the system copy of the aliased block
    /// (data block 0 = system block 10) wins.
    pub fn to_host_bytes(&self) -> Vec<u8> {
        let mut out = self.host.clone();
        let data_start = self.bin_offset + FIRST_DATA_BLOCK * BLOCK_SIZE;
        out[data_start..data_start + self.data.len()].copy_from_slice(&self.data);
        out[self.bin_offset..self.bin_offset + self.system.len()].copy_from_slice(&self.system);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_with_bin(prefix: usize, block_count: u16, suffix: usize) -> Vec<u8> {
        let mut host = vec![0x11u8; prefix];
        let mut bin = vec![EMPTY_BYTE; usize::from(block_count) * BLOCK_SIZE];
        bin[..6].copy_from_slice(&BIN_MAGIC);
        bin[8..10].copy_from_slice(&block_count.to_le_bytes());
        host.extend_from_slice(&bin);
        host.extend(std::iter::repeat(0x22u8).take(suffix));
        host
    }

    #[test]
    fn test_load_slices_regions() {
        let host = host_with_bin(100, 20, 50);
        let image = Image::load(host).unwrap();
        assert_eq!(image.bin_offset(), 100);
        assert_eq!(image.block_count(), 20);
        assert_eq!(image.system().len(), SYSTEM_BLOCKS * BLOCK_SIZE);
        assert_eq!(image.data().len(), 10 * BLOCK_SIZE);
        assert_eq!(image.total_blocks(), 9);
        assert_eq!(image.data_block_count(), 10);
        assert_eq!(image.pedal_series(), None);
    }

    #[test]
    fn test_missing_magic() {
        let result = Image::load(vec![0u8; 4096]);
        assert!(matches!(result, Err(FirmwareError::BinNotFound)));
    }

    #[test]
    fn test_truncated_bin() {
        let mut host = host_with_bin(0, 20, 0);
        host.truncate(15 * BLOCK_SIZE);
        assert!(matches!(
            Image::load(host),
            Err(FirmwareError::Truncated { .. })
        ));
    }

    #[test]
    fn test_block_count_below_system_region() {
        let host = host_with_bin(0, 5, 0);
        assert!(matches!(
            Image::load(host),
            Err(FirmwareError::Truncated { .. })
        ));
    }

    #[test]
    fn test_splice_preserves_surroundings() {
        let host = host_with_bin(33, 16, 17);
        let mut image = Image::load(host.clone()).unwrap();
        assert_eq!(image.to_host_bytes(), host);

        image.block_mut(3).unwrap()[0] = 0x42;
        let out = image.to_host_bytes();
        assert_eq!(out.len(), host.len());
        assert_eq!(out[33 + 13 * BLOCK_SIZE], 0x42);
        assert_eq!(&out[..33], &host[..33]);
        assert_eq!(&out[out.len() - 17..], &host[host.len() - 17..]);
    }

    #[test]
    fn test_system_wins_over_aliased_data_block() {
        let host = host_with_bin(0, 16, 0);
        let mut image = Image::load(host).unwrap();
        image.block_mut(0).unwrap()[10] = 0xAA;
        image.system_mut()[10 * BLOCK_SIZE + 10] = 0xBB;
        let out = image.to_host_bytes();
        assert_eq!(out[10 * BLOCK_SIZE + 10], 0xBB);
    }
}
