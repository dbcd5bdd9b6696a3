//! Access to inodes in the inode table.
//!
//! Inode `n` lives in block `1 + n / INODES_PER_BLOCK` at slot
//! `n % INODES_PER_BLOCK`; the table starts right after the superblock.

use crate::config::*;
use crate::error::{FsError, Result};
use crate::structs::{Inode, SuperBlock};
use crate::BlockDevice;

fn table_slot(inode_number: u32) -> (u32, usize) {
    let block_id = 1 + inode_number / INODES_PER_BLOCK as u32;
    let offset = (inode_number as usize % INODES_PER_BLOCK) * INODE_SIZE;
    (block_id, offset)
}

/// Query an inode by its number.
pub fn get_inode<D: BlockDevice>(
    device: &mut D,
    superblock: &SuperBlock,
    inode_number: u32,
) -> Result<Inode> {
    if inode_number >= superblock.inodes {
        return Err(FsError::OutOfBounds);
    }

    let (block_id, offset) = table_slot(inode_number);
    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    device.read_block(block_id, buf.as_mut())?;

    let inode = unsafe { core::ptr::read_unaligned(buf.as_ptr().add(offset) as *const Inode) };
    Ok(inode)
}

/// Store an inode back into its table slot, preserving its neighbours.
pub fn write_inode<D: BlockDevice>(
    device: &mut D,
    superblock: &SuperBlock,
    inode_number: u32,
    inode: &Inode,
) -> Result<()> {
    if inode_number >= superblock.inodes {
        return Err(FsError::OutOfBounds);
    }

    let (block_id, offset) = table_slot(inode_number);
    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    device.read_block(block_id, buf.as_mut())?;
    unsafe {
        core::ptr::write_unaligned(buf.as_mut_ptr().add(offset) as *mut Inode, *inode);
    }
    device.write_block(block_id, buf.as_ref())?;
    Ok(())
}
