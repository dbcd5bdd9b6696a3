//! The filesystem engine: mount-state management and the public operations.

use crate::bitmap;
use crate::config::*;
use crate::error::{FsError, Result};
use crate::file::{fread, fwrite};
use crate::inode::{get_inode, write_inode};
use crate::structs::{pointer_at, Inode, SuperBlock};
use crate::superblock::{read_superblock, write_superblock};
use crate::BlockDevice;

/// An inode filesystem over a block device.
///
/// A `FileSystem` starts out unmounted. [`mount`](FileSystem::mount) takes
/// exclusive ownership of a device after validating its superblock and
/// derives the in-memory free-block map; [`unmount`](FileSystem::unmount)
/// hands the device back. Every state-changing operation writes through to
/// the device, so unmounting needs no flush.
#[derive(Debug)]
pub struct FileSystem<D: BlockDevice> {
    device: Option<D>,
    meta_data: SuperBlock,
    free_blocks: Vec<bool>,
}

impl<D: BlockDevice> Default for FileSystem<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: BlockDevice> FileSystem<D> {
    /// Creates an unmounted filesystem.
    pub fn new() -> Self {
        Self {
            device: None,
            meta_data: SuperBlock::ZERO,
            free_blocks: Vec::new(),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.device.is_some()
    }

    /// The superblock of the mounted volume (zeroed while unmounted).
    pub fn superblock(&self) -> &SuperBlock {
        &self.meta_data
    }

    /// Read-only view of the free-block map (empty while unmounted).
    /// Entry `i` is true iff block `i` is in use.
    pub fn free_blocks(&self) -> &[bool] {
        &self.free_blocks
    }

    /// Writes a fresh, empty volume to `device`: the superblock to block 0
    /// and a zero block to every other index, invalidating every inode.
    ///
    /// Refuses while this filesystem holds a mounted device.
    pub fn format(&self, device: &mut D) -> Result<()> {
        if self.is_mounted() {
            log::error!("cannot format while a disk is mounted");
            return Err(FsError::AlreadyMounted);
        }

        let superblock = SuperBlock::for_disk(device.num_blocks() as u32);
        write_superblock(device, &superblock)?;

        let zeroes = Box::new([0u8; BLOCK_SIZE]);
        for block_id in 1..superblock.blocks {
            device.write_block(block_id, zeroes.as_ref())?;
        }

        log::debug!(
            "formatted {} blocks, {} inode blocks",
            superblock.blocks,
            superblock.inode_blocks
        );
        Ok(())
    }

    /// Validates the volume on `device`, takes ownership of it, and derives
    /// the free-block map.
    ///
    /// A device that fails validation is dropped; its backing state is
    /// untouched and it can be reopened.
    pub fn mount(&mut self, mut device: D) -> Result<()> {
        if self.is_mounted() {
            log::error!("a disk is already mounted");
            return Err(FsError::AlreadyMounted);
        }

        let superblock = read_superblock(&mut device)?;
        if superblock.blocks as usize != device.num_blocks() {
            log::error!(
                "superblock claims {} blocks, disk has {}",
                superblock.blocks,
                device.num_blocks()
            );
            return Err(FsError::InvalidSuperBlock);
        }
        if superblock.inode_blocks != (superblock.blocks + 9) / 10 {
            log::error!("superblock inode block count is wrong");
            return Err(FsError::InvalidSuperBlock);
        }
        if superblock.inodes != superblock.inode_blocks * INODES_PER_BLOCK as u32 {
            log::error!("superblock inode count is wrong");
            return Err(FsError::InvalidSuperBlock);
        }
        if superblock.blocks <= superblock.inode_blocks {
            log::error!("inode table does not fit on the disk");
            return Err(FsError::InvalidSuperBlock);
        }

        self.free_blocks = bitmap::build(&mut device, &superblock)?;
        self.meta_data = superblock;
        self.device = Some(device);
        Ok(())
    }

    /// Releases the free-block map and hands the device back, or `None` if
    /// nothing was mounted.
    pub fn unmount(&mut self) -> Option<D> {
        self.free_blocks = Vec::new();
        self.meta_data = SuperBlock::ZERO;
        self.device.take()
    }

    /// Allocates the lowest-numbered free inode and returns its number.
    pub fn create(&mut self) -> Result<u32> {
        let device = self.device.as_mut().ok_or(FsError::NotMounted)?;

        let mut buf = Box::new([0u8; BLOCK_SIZE]);
        for block_id in 1..=self.meta_data.inode_blocks {
            device.read_block(block_id, buf.as_mut())?;
            for slot in 0..INODES_PER_BLOCK {
                let offset = slot * INODE_SIZE;
                let inode: Inode = unsafe {
                    core::ptr::read_unaligned(buf.as_ptr().add(offset) as *const Inode)
                };
                if inode.is_valid() {
                    continue;
                }

                unsafe {
                    core::ptr::write_unaligned(
                        buf.as_mut_ptr().add(offset) as *mut Inode,
                        Inode::fresh(),
                    );
                }
                device.write_block(block_id, buf.as_ref())?;

                self.free_blocks = bitmap::build(device, &self.meta_data)?;
                return Ok((block_id - 1) * INODES_PER_BLOCK as u32 + slot as u32);
            }
        }

        log::error!("inode table full");
        Err(FsError::OutOfInodes)
    }

    /// Invalidates an inode and returns its blocks to the free pool.
    ///
    /// The indirect block is densely packed from slot 0, so the walk stops
    /// at the first zero pointer.
    pub fn remove(&mut self, inode_number: u32) -> Result<()> {
        let device = self.device.as_mut().ok_or(FsError::NotMounted)?;

        let mut inode = get_inode(device, &self.meta_data, inode_number)?;
        if !inode.is_valid() {
            log::error!("remove of invalid inode {inode_number}");
            return Err(FsError::InvalidInode);
        }

        for block_id in inode.direct_blocks() {
            bitmap::unassign_block(&mut self.free_blocks, block_id);
        }

        if inode.indirect != 0 {
            bitmap::unassign_block(&mut self.free_blocks, inode.indirect);
            let mut buf = Box::new([0u8; BLOCK_SIZE]);
            device.read_block(inode.indirect, buf.as_mut())?;
            for idx in 0..POINTERS_PER_BLOCK {
                let block_id = pointer_at(&buf, idx);
                if block_id == 0 {
                    break;
                }
                bitmap::unassign_block(&mut self.free_blocks, block_id);
            }
        }

        // Only `valid` conveys allocation state; the other fields stay.
        inode.valid = 0;
        write_inode(device, &self.meta_data, inode_number, &inode)?;
        Ok(())
    }

    /// The logical size of a valid inode, in bytes.
    pub fn stat(&mut self, inode_number: u32) -> Result<u32> {
        let device = self.device.as_mut().ok_or(FsError::NotMounted)?;

        let inode = get_inode(device, &self.meta_data, inode_number)?;
        if inode.is_valid() {
            Ok(inode.size)
        } else {
            Err(FsError::InvalidInode)
        }
    }

    /// Reads up to one block of file data at `offset` into `buf`; returns
    /// the number of bytes copied.
    pub fn read(&mut self, inode_number: u32, buf: &mut [u8], offset: usize) -> Result<usize> {
        let device = self.device.as_mut().ok_or(FsError::NotMounted)?;
        fread(device, &self.meta_data, inode_number, buf, offset)
    }

    /// Writes up to one block of file data at `offset` from `buf`; returns
    /// the number of bytes written, which also grows the file size.
    pub fn write(&mut self, inode_number: u32, buf: &[u8], offset: usize) -> Result<usize> {
        let device = self.device.as_mut().ok_or(FsError::NotMounted)?;
        fwrite(
            device,
            &self.meta_data,
            &mut self.free_blocks,
            inode_number,
            buf,
            offset,
        )
    }
}

/// Prints a report of the volume on `device` to stdout: the superblock
/// fields, then every valid inode with its size and block lists.
///
/// This is a diagnostic entrypoint: an unreadable or foreign superblock
/// terminates the process with a nonzero status.
pub fn debug<D: BlockDevice>(device: &mut D) {
    let superblock = match read_superblock(device) {
        Ok(superblock) => superblock,
        Err(e) => {
            eprintln!("cannot read superblock: {e}");
            std::process::exit(1);
        }
    };

    println!("SuperBlock:");
    println!("    magic number is valid");
    println!("    {} blocks", superblock.blocks);
    println!("    {} inode blocks", superblock.inode_blocks);
    println!("    {} inodes", superblock.inodes);

    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    for block_id in 1..=superblock.inode_blocks {
        if let Err(e) = device.read_block(block_id, buf.as_mut()) {
            eprintln!("cannot read inode block {block_id}: {e}");
            std::process::exit(1);
        }
        for slot in 0..INODES_PER_BLOCK {
            let inode: Inode = unsafe {
                core::ptr::read_unaligned(buf.as_ptr().add(slot * INODE_SIZE) as *const Inode)
            };
            if !inode.is_valid() {
                continue;
            }

            let inode_number = (block_id - 1) * INODES_PER_BLOCK as u32 + slot as u32;
            println!("Inode {inode_number}:");
            println!("    size: {} bytes", inode.size);
            print!("    direct blocks:");
            for block in inode.direct_blocks() {
                print!(" {block}");
            }
            println!();

            if inode.indirect != 0 {
                let mut indirect_buf = Box::new([0u8; BLOCK_SIZE]);
                if let Err(e) = device.read_block(inode.indirect, indirect_buf.as_mut()) {
                    eprintln!("cannot read indirect block {}: {e}", inode.indirect);
                    std::process::exit(1);
                }
                println!("    indirect block: {}", inode.indirect);
                print!("    indirect data blocks:");
                for idx in 0..POINTERS_PER_BLOCK {
                    let block = pointer_at(&indirect_buf, idx);
                    if block != 0 {
                        print!(" {block}");
                    }
                }
                println!();
            }
        }
    }
}
