//! Reading and writing the superblock in block 0.
//!
//! Blocks are reinterpreted in place: struct fields live at the head of the
//! block in native byte order, byte-identical with a direct cast.

use crate::config::*;
use crate::error::{FsError, Result};
use crate::structs::SuperBlock;
use crate::BlockDevice;

pub fn read_superblock<D: BlockDevice>(device: &mut D) -> Result<SuperBlock> {
    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    device.read_block(SUPERBLOCK_ID, buf.as_mut())?;
    let superblock: SuperBlock =
        unsafe { core::ptr::read_unaligned(buf.as_ptr() as *const SuperBlock) };

    if superblock.magic != MAGIC {
        log::error!("magic number mismatch: {:#010x}", superblock.magic);
        return Err(FsError::InvalidMagic);
    }

    Ok(superblock)
}

pub fn write_superblock<D: BlockDevice>(device: &mut D, superblock: &SuperBlock) -> Result<()> {
    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    unsafe {
        core::ptr::write_unaligned(buf.as_mut_ptr() as *mut SuperBlock, *superblock);
    }
    device.write_block(SUPERBLOCK_ID, buf.as_ref())?;
    Ok(())
}
