//! Reading and writing file data through an inode.
//!
//! Each call transfers at most one data block. Writes always claim a fresh
//! block for the addressed position and replace the whole block with the
//! payload, zero-padded; the file size grows by the payload length.

use crate::bitmap::{assign_block, unassign_block};
use crate::config::*;
use crate::error::{FsError, Result};
use crate::inode::{get_inode, write_inode};
use crate::structs::{pointer_at, set_pointer_at, Inode, SuperBlock};
use crate::BlockDevice;

/// Reads from the file at `offset` into `buf`.
///
/// Copies `min(buf.len(), size - offset, BLOCK_SIZE)` bytes from the data
/// block covering `offset` and returns the copied count.
pub(crate) fn fread<D: BlockDevice>(
    device: &mut D,
    superblock: &SuperBlock,
    inode_number: u32,
    buf: &mut [u8],
    offset: usize,
) -> Result<usize> {
    let inode = get_inode(device, superblock, inode_number)?;
    if !inode.is_valid() {
        return Err(FsError::InvalidInode);
    }

    let size = inode.size as usize;
    if offset >= size {
        return Err(FsError::OutOfBounds);
    }

    let pt_idx = offset / BLOCK_SIZE;
    let block_id = if pt_idx < POINTERS_PER_INODE {
        inode.direct[pt_idx]
    } else {
        if inode.indirect == 0 || pt_idx - POINTERS_PER_INODE >= POINTERS_PER_BLOCK {
            return Err(FsError::OutOfBounds);
        }
        let mut indirect_buf = Box::new([0u8; BLOCK_SIZE]);
        device.read_block(inode.indirect, indirect_buf.as_mut())?;
        pointer_at(&indirect_buf, pt_idx - POINTERS_PER_INODE)
    };
    if block_id == 0 {
        // Hole: no block was ever written at this position.
        return Err(FsError::InvalidBlockId);
    }

    let mut block_buf = Box::new([0u8; BLOCK_SIZE]);
    device.read_block(block_id, block_buf.as_mut())?;

    let count = buf.len().min(size - offset).min(BLOCK_SIZE);
    buf[..count].copy_from_slice(&block_buf[..count]);
    Ok(count)
}

/// Writes `buf` to the file at `offset`, claiming a fresh data block for the
/// addressed position.
///
/// At most `BLOCK_SIZE` bytes are taken from `buf`; the rest of the new
/// block is zeroed. Returns the number of payload bytes written, which is
/// also added to the file size.
pub(crate) fn fwrite<D: BlockDevice>(
    device: &mut D,
    superblock: &SuperBlock,
    free_blocks: &mut [bool],
    inode_number: u32,
    buf: &[u8],
    offset: usize,
) -> Result<usize> {
    let mut inode = get_inode(device, superblock, inode_number)?;
    if !inode.is_valid() {
        return Err(FsError::InvalidInode);
    }

    let pt_idx = offset / BLOCK_SIZE;
    if pt_idx >= POINTERS_PER_INODE + POINTERS_PER_BLOCK {
        log::error!("write at offset {offset} exceeds the maximum file size");
        return Err(FsError::FileTooLarge);
    }

    let new_block = assign_block(device, free_blocks)?;

    let count = buf.len().min(BLOCK_SIZE);
    let mut block_buf = Box::new([0u8; BLOCK_SIZE]);
    block_buf[..count].copy_from_slice(&buf[..count]);
    device.write_block(new_block, block_buf.as_ref())?;

    if pt_idx < POINTERS_PER_INODE {
        inode.direct[pt_idx] = new_block;
    } else if let Err(e) = link_indirect(device, free_blocks, &mut inode, new_block) {
        unassign_block(free_blocks, new_block);
        return Err(e);
    }

    inode.size += count as u32;
    write_inode(device, superblock, inode_number, &inode)?;
    Ok(count)
}

/// Installs `new_block` into the first free slot of the inode's indirect
/// block, assigning the indirect block first if the inode has none yet.
/// A freshly assigned indirect block is released again if linking fails.
fn link_indirect<D: BlockDevice>(
    device: &mut D,
    free_blocks: &mut [bool],
    inode: &mut Inode,
    new_block: u32,
) -> Result<()> {
    let fresh_indirect = inode.indirect == 0;
    if fresh_indirect {
        inode.indirect = assign_block(device, free_blocks)?;
    }

    let result = install_pointer(device, inode.indirect, new_block);
    if result.is_err() && fresh_indirect {
        unassign_block(free_blocks, inode.indirect);
        inode.indirect = 0;
    }
    result
}

/// Writes `new_block` into the first zero slot of an indirect block.
fn install_pointer<D: BlockDevice>(
    device: &mut D,
    indirect_block: u32,
    new_block: u32,
) -> Result<()> {
    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    device.read_block(indirect_block, buf.as_mut())?;

    match (0..POINTERS_PER_BLOCK).find(|&idx| pointer_at(&buf, idx) == 0) {
        Some(idx) => {
            set_pointer_at(&mut buf, idx, new_block);
            device.write_block(indirect_block, buf.as_ref())?;
            Ok(())
        }
        None => {
            log::error!("indirect block full, maximum file size reached");
            Err(FsError::FileTooLarge)
        }
    }
}
