//! Block chains
//!
//! Every occupied data block starts with a 6-byte header linking it to its
//! neighbours:
//!
//! ```text
//! ┌──────────┬──────────┬──────────┬────────────────────────────┐
//! │ prev u16 │ next u16 │ len u16  │ payload (len of 4090 used) │
//! └──────────┴──────────┴──────────┴────────────────────────────┘
//! ```
//!
//! `prev` is `0xFFFF` on the first block, `next` is `0xFFFF` on the last.

use crate::block_map::BlockMap;
use crate::codec;
use crate::error::{FirmwareError, Result};
use crate::image::Image;
use crate::layout::{
    required_blocks, BLOCK_HEADER_SIZE, BLOCK_SIZE, EMPTY_BYTE, NO_ADDRESS, RESERVED_ADDRESS,
    USABLE_BLOCK_SIZE,
};
use tracing::debug;

/// Chain header at the start of a data block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Previous block address, `0xFFFF` for the chain head
    pub prev: u16,

    /// Next block address, `0xFFFF` for the chain tail
    pub next: u16,

    /// Payload bytes stored in this block
    pub len: u16,
}

impl BlockHeader {
    /// Size of the header in bytes
    pub const fn size() -> usize {
        BLOCK_HEADER_SIZE
    }

    pub fn to_bytes(&self) -> [u8; BLOCK_HEADER_SIZE] {
        let mut bytes = [0u8; BLOCK_HEADER_SIZE];
        bytes[0..2].copy_from_slice(&self.prev.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.next.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.len.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(BlockHeader {
            prev: codec::read_u16(bytes, 0)?,
            next: codec::read_u16(bytes, 2)?,
            len: codec::read_u16(bytes, 4)?,
        })
    }

    pub fn is_head(&self) -> bool {
        self.prev == NO_ADDRESS
    }

    pub fn is_tail(&self) -> bool {
        self.next == NO_ADDRESS
    }
}

fn corrupt(file_name: &str, reason: String) -> FirmwareError {
    FirmwareError::ChainCorruption {
        file_name: file_name.to_string(),
        reason,
    }
}

fn to_address(address: usize) -> u16 {
    // Data regions never exceed the u16 block count of the BIN
    address as u16
}

/// Walk the chain of `file_name` and return its payload
///
/// Every visited block is claimed in `map` as it is reached. On error the
/// blocks claimed so far stay claimed; callers release them with
/// [`BlockMap::release_owner`].
///
/// A zero-length entry has no chain and claims nothing.
pub fn read_chain(
    image: &Image,
    map: &mut BlockMap,
    file_name: &str,
    address: u16,
    size: usize,
) -> Result<Vec<u8>> {
    if size == 0 {
        if address != NO_ADDRESS {
            debug!("{} is empty but points at block {}", file_name, address);
        }
        return Ok(Vec::new());
    }
    if address == NO_ADDRESS {
        return Err(corrupt(
            file_name,
            format!("{} bytes but no first block", size),
        ));
    }

    let max_hops = required_blocks(size);
    // Recorded size is untrusted; never reserve more than the region holds
    let mut content = Vec::with_capacity(size.min(map.len() * USABLE_BLOCK_SIZE));
    let mut previous = NO_ADDRESS;
    let mut current = address;
    let mut hops = 0;

    loop {
        let addr = usize::from(current);
        if addr == RESERVED_ADDRESS {
            return Err(corrupt(file_name, "chain enters reserved block 0".into()));
        }
        if addr >= map.len() {
            return Err(corrupt(
                file_name,
                format!("block {} is outside the data region ({} blocks)", addr, map.len()),
            ));
        }
        if let Some(owner) = map.owner(addr) {
            return Err(corrupt(
                file_name,
                format!("block {} is already owned by {}", addr, owner),
            ));
        }

        hops += 1;
        if hops > max_hops {
            return Err(corrupt(
                file_name,
                format!("chain is longer than {} blocks", max_hops),
            ));
        }
        map.claim(addr, file_name);

        let block = image.block(addr)?;
        let header = BlockHeader::from_bytes(block)?;

        if previous != NO_ADDRESS && header.prev != previous {
            return Err(corrupt(
                file_name,
                format!(
                    "block {} stores previous address {}, reached from {}",
                    addr, header.prev, previous
                ),
            ));
        }

        let len = usize::from(header.len);
        if len > USABLE_BLOCK_SIZE {
            return Err(corrupt(
                file_name,
                format!("block {} claims {} payload bytes", addr, len),
            ));
        }
        if content.len() + len > size {
            return Err(corrupt(
                file_name,
                format!("payload exceeds recorded size {}", size),
            ));
        }
        content.extend_from_slice(&block[BLOCK_HEADER_SIZE..BLOCK_HEADER_SIZE + len]);

        if header.is_tail() {
            if content.len() != size {
                return Err(corrupt(
                    file_name,
                    format!("invalid size: {} VS {}", content.len(), size),
                ));
            }
            return Ok(content);
        }

        previous = current;
        current = header.next;
    }
}

/// Addresses of a chain in link order, following `next` pointers
///
/// Stops after `limit` blocks so a damaged chain cannot loop forever.
pub fn chain_addresses(image: &Image, address: u16, limit: usize) -> Result<Vec<usize>> {
    let mut addresses = Vec::new();
    let mut current = address;
    while current != NO_ADDRESS && addresses.len() < limit {
        let addr = usize::from(current);
        let header = BlockHeader::from_bytes(image.block(addr)?)?;
        addresses.push(addr);
        current = header.next;
    }
    Ok(addresses)
}

/// Write `content` across `addresses`, linking the blocks in order
///
/// All blocks but the last carry a full 4090-byte payload; the last one
/// carries the remainder and is padded with `0xFF`.
pub fn write_chain(image: &mut Image, addresses: &[usize], content: &[u8]) -> Result<()> {
    if addresses.len() != required_blocks(content.len()) {
        return Err(FirmwareError::NotEnoughFreeBlocks {
            required: required_blocks(content.len()),
            free: addresses.len(),
        });
    }

    let count = addresses.len();
    for (i, &addr) in addresses.iter().enumerate() {
        let start = i * USABLE_BLOCK_SIZE;
        let len = (content.len() - start).min(USABLE_BLOCK_SIZE);
        let header = BlockHeader {
            prev: if i > 0 { to_address(addresses[i - 1]) } else { NO_ADDRESS },
            next: if i + 1 < count { to_address(addresses[i + 1]) } else { NO_ADDRESS },
            len: len as u16,
        };

        let block = image.block_mut(addr)?;
        block[..BLOCK_HEADER_SIZE].copy_from_slice(&header.to_bytes());
        block[BLOCK_HEADER_SIZE..BLOCK_HEADER_SIZE + len]
            .copy_from_slice(&content[start..start + len]);
        block[BLOCK_HEADER_SIZE + len..BLOCK_SIZE].fill(EMPTY_BYTE);
        debug!("Block {}: {:?}", addr, header);
    }
    Ok(())
}
