//! An educational SimpleFS-style inode filesystem over a block device.
//! Files are identified by inode number alone; there are no directories,
//! permissions, or timestamps.
//!
//! Linear layout of a volume:
//! - Superblock (block 0)
//! - Inode table (blocks `1..=inode_blocks`, one tenth of the disk)
//! - Data and indirect pointer blocks (the rest)
//!
//! Layers, from bottom to top:
//! 1. Block device: fixed-size block array abstraction.          | [`BlockDevice`], [`Disk`]
//! 2. On-disk structures: superblock, inode table, pointers.     | [`SuperBlock`], [`Inode`]
//! 3. Free-block map: derived from the inode table at mount.     | internal
//! 4. Engine: format, mount, create, remove, stat, read, write.  | [`FileSystem`]
//!
//! Everything is synchronous and single-threaded; a [`FileSystem`] owns its
//! device exclusively for the lifetime of a mount.

mod bitmap;
mod block_dev;
mod config;
mod disk;
mod error;
mod file;
mod fs;
mod inode;
mod structs;
mod superblock;

pub use block_dev::BlockDevice;
pub use config::*;
pub use disk::Disk;
pub use error::FsError as Error;
pub use error::{FsError, Result};
pub use fs::{debug, FileSystem};
pub use inode::{get_inode, write_inode};
pub use structs::{Inode, SuperBlock};
pub use superblock::{read_superblock, write_superblock};
