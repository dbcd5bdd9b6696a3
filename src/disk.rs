//! Disk emulator: a backing file presented as an array of fixed-size blocks.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::config::BLOCK_SIZE;
use crate::error::{FsError, Result};
use crate::BlockDevice;

/// A block device backed by an ordinary file.
///
/// The file is the only persisted state; its length is pinned to
/// `blocks * BLOCK_SIZE` on open. Read and write counters track every
/// successful block transfer for the lifetime of the handle.
#[derive(Debug)]
pub struct Disk {
    file: File,
    blocks: usize,
    reads: usize,
    writes: usize,
}

impl Disk {
    /// Opens (or creates) the disk image at `path` with `blocks` blocks.
    ///
    /// An existing image whose length differs is truncated or extended to
    /// exactly `blocks * BLOCK_SIZE` bytes.
    pub fn open(path: impl AsRef<Path>, blocks: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path.as_ref())?;

        let len = file.metadata()?.len();
        let want = (blocks * BLOCK_SIZE) as u64;
        log::debug!("disk image length {len}, want {want}");
        if len != want {
            file.set_len(want)?;
        }

        Ok(Disk {
            file,
            blocks,
            reads: 0,
            writes: 0,
        })
    }

    /// Number of successful block reads since open.
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Number of successful block writes since open.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Closes the disk and reports the transfer counters on stdout.
    pub fn close(self) {
        println!("{} disk block reads", self.reads);
        println!("{} disk block writes", self.writes);
    }

    fn seek_to(&mut self, block_id: u32) -> Result<()> {
        if block_id as usize >= self.blocks {
            log::error!("block {block_id} out of range ({} blocks)", self.blocks);
            return Err(FsError::InvalidBlockId);
        }
        self.file
            .seek(SeekFrom::Start(block_id as u64 * BLOCK_SIZE as u64))?;
        Ok(())
    }
}

impl BlockDevice for Disk {
    fn num_blocks(&self) -> usize {
        self.blocks
    }

    fn read_block(&mut self, block_id: u32, buf: &mut [u8; BLOCK_SIZE]) -> Result<()> {
        self.seek_to(block_id)?;
        self.file.read_exact(buf)?;
        self.reads += 1;
        Ok(())
    }

    fn write_block(&mut self, block_id: u32, buf: &[u8; BLOCK_SIZE]) -> Result<()> {
        self.seek_to(block_id)?;
        self.file.write_all(buf)?;
        self.writes += 1;
        Ok(())
    }
}
