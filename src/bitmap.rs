//! The in-memory free-block map.
//!
//! The map is not persisted: it is derived by walking the inode table, once
//! at mount time and again after operations that allocate inodes. Entry `i`
//! is true iff block `i` is the superblock, an inode-table block, or a block
//! referenced by some valid inode (directly, through its indirect block, or
//! as the indirect block itself).

use crate::config::*;
use crate::error::{FsError, Result};
use crate::structs::{pointer_at, Inode, SuperBlock};
use crate::BlockDevice;

fn mark(map: &mut [bool], block_id: u32) -> Result<()> {
    match map.get_mut(block_id as usize) {
        Some(slot) => {
            *slot = true;
            Ok(())
        }
        // A pointer past the end of the disk means the volume is corrupt.
        None => {
            log::error!("inode references block {block_id} beyond the disk");
            Err(FsError::InvalidBlockId)
        }
    }
}

/// Marks every block reachable from `inode` as in use.
fn mark_inode_blocks<D: BlockDevice>(device: &mut D, inode: &Inode, map: &mut [bool]) -> Result<()> {
    for block_id in inode.direct_blocks() {
        mark(map, block_id)?;
    }

    if inode.indirect != 0 {
        let mut buf = Box::new([0u8; BLOCK_SIZE]);
        device.read_block(inode.indirect, buf.as_mut())?;
        for idx in 0..POINTERS_PER_BLOCK {
            let block_id = pointer_at(&buf, idx);
            if block_id != 0 {
                mark(map, block_id)?;
            }
        }
        mark(map, inode.indirect)?;
    }

    Ok(())
}

/// Derives the free-block map by scanning the whole inode table.
pub(crate) fn build<D: BlockDevice>(device: &mut D, superblock: &SuperBlock) -> Result<Vec<bool>> {
    let mut map = vec![false; superblock.blocks as usize];

    mark(&mut map, SUPERBLOCK_ID)?;
    for block_id in 1..=superblock.inode_blocks {
        mark(&mut map, block_id)?;
    }

    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    for block_id in 1..=superblock.inode_blocks {
        device.read_block(block_id, buf.as_mut())?;
        for slot in 0..INODES_PER_BLOCK {
            let inode: Inode = unsafe {
                core::ptr::read_unaligned(buf.as_ptr().add(slot * INODE_SIZE) as *const Inode)
            };
            if inode.is_valid() {
                mark_inode_blocks(device, &inode, &mut map)?;
            }
        }
    }

    Ok(map)
}

/// Claims the first free block: marks it used and zero-fills it on disk, so
/// a block reused as an indirect block starts as an all-zero pointer array.
pub(crate) fn assign_block<D: BlockDevice>(device: &mut D, map: &mut [bool]) -> Result<u32> {
    for block_id in 0..map.len() {
        if !map[block_id] {
            let zeroes = Box::new([0u8; BLOCK_SIZE]);
            device.write_block(block_id as u32, zeroes.as_ref())?;
            map[block_id] = true;
            return Ok(block_id as u32);
        }
    }

    log::error!("no free block left");
    Err(FsError::OutOfSpace)
}

/// Returns a block to the free pool. Clearing an entry cannot fail; an
/// out-of-range id is ignored.
pub(crate) fn unassign_block(map: &mut [bool], block_id: u32) {
    if let Some(slot) = map.get_mut(block_id as usize) {
        *slot = false;
    }
}
