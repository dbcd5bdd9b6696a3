use crate::config::BLOCK_SIZE;
use crate::error::Result;

/// Abstraction over a fixed-size array of blocks.
///
/// The filesystem owns its device exclusively while mounted, so the methods
/// take `&mut self` and implementors need no internal locking. All transfers
/// are whole blocks.
pub trait BlockDevice {
    /// Returns the number of blocks in the block device.
    fn num_blocks(&self) -> usize;

    /// Reads block `block_id` into `buf`.
    fn read_block(&mut self, block_id: u32, buf: &mut [u8; BLOCK_SIZE]) -> Result<()>;

    /// Writes `buf` to block `block_id`.
    fn write_block(&mut self, block_id: u32, buf: &[u8; BLOCK_SIZE]) -> Result<()>;

    /// Returns the size of each block in bytes.
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }
}
