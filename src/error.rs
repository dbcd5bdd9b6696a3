use thiserror::Error;

/// Error type for every disk and filesystem operation in this crate.
#[derive(Debug, Error)]
pub enum FsError {
    /// The backing file could not be opened, read, written, or resized.
    #[error("disk I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Block 0 does not carry the filesystem magic number.
    #[error("invalid magic number")]
    InvalidMagic,

    /// The superblock geometry does not match the disk it was read from.
    #[error("superblock does not match disk geometry")]
    InvalidSuperBlock,

    /// A block index points outside the disk.
    #[error("block id out of range")]
    InvalidBlockId,

    /// The inode slot is not allocated.
    #[error("inode is not valid")]
    InvalidInode,

    /// An inode number or file offset points outside the addressable range.
    #[error("out of bounds")]
    OutOfBounds,

    /// The inode table has no free slot left.
    #[error("no free inode available")]
    OutOfInodes,

    /// The disk has no free block left.
    #[error("no free block available")]
    OutOfSpace,

    /// Writing at this offset would exceed the maximum addressable file size.
    #[error("maximum file size exceeded")]
    FileTooLarge,

    /// The filesystem already holds a mounted disk.
    #[error("a disk is already mounted")]
    AlreadyMounted,

    /// The operation needs a mounted disk.
    #[error("no disk mounted")]
    NotMounted,
}

pub type Result<T> = std::result::Result<T, FsError>;
