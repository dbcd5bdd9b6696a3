#![allow(unused)]

mod common;

use common::RamDisk;
use simplefs::*;

#[test]
fn format_lays_out_clean_volume() {
    common::init_logs();
    let mut disk = RamDisk::new(100);
    let fs: FileSystem<RamDisk> = FileSystem::new();
    fs.format(&mut disk).unwrap();

    let sb = read_superblock(&mut disk).unwrap();
    assert_eq!(sb.magic, MAGIC);
    assert_eq!(sb.blocks, 100);
    assert_eq!(sb.inode_blocks, 10);
    assert_eq!(sb.inodes, 1280);

    // Every inode slot starts out invalid.
    for n in [0, 1, 127, 128, 640, 1279] {
        assert!(!get_inode(&mut disk, &sb, n).unwrap().is_valid());
    }

    let mut fs = FileSystem::new();
    fs.mount(disk).unwrap();
    log!("mounted, superblock {:?}", fs.superblock());

    // Superblock and inode table are in use, everything else is free.
    let map = fs.free_blocks();
    assert_eq!(map.len(), 100);
    assert!(map[..=10].iter().all(|&used| used));
    assert!(map[11..].iter().all(|&used| !used));
}

#[test]
fn create_allocates_lowest_inode_first() {
    let mut fs = common::formatted(100);
    assert_eq!(fs.create().unwrap(), 0);
    assert_eq!(fs.create().unwrap(), 1);
    assert_eq!(fs.stat(0).unwrap(), 0);
    assert_eq!(fs.stat(1).unwrap(), 0);
    assert!(matches!(fs.stat(2), Err(Error::InvalidInode)));
}

#[test]
fn write_then_read_round_trips() {
    let mut fs = common::formatted(100);
    let n = fs.create().unwrap();

    let data = b"hello";
    assert_eq!(fs.write(n, data, 0).unwrap(), data.len());
    assert_eq!(fs.stat(n).unwrap(), data.len() as u32);

    let mut out = [0u8; 5];
    assert_eq!(fs.read(n, &mut out, 0).unwrap(), data.len());
    assert_eq!(&out, data);
}

#[test]
fn sixth_block_goes_through_the_indirect_block() {
    let mut fs = common::formatted(100);
    let n = fs.create().unwrap();

    for k in 0..5u8 {
        let pattern = [b'a' + k; BLOCK_SIZE];
        assert_eq!(
            fs.write(n, &pattern, k as usize * BLOCK_SIZE).unwrap(),
            BLOCK_SIZE
        );
    }

    let sixth = [b'f'; BLOCK_SIZE];
    assert_eq!(fs.write(n, &sixth, 5 * BLOCK_SIZE).unwrap(), BLOCK_SIZE);
    assert_eq!(fs.stat(n).unwrap() as usize, 6 * BLOCK_SIZE);

    let mut out = vec![0u8; BLOCK_SIZE];
    assert_eq!(fs.read(n, &mut out, 5 * BLOCK_SIZE).unwrap(), BLOCK_SIZE);
    assert_eq!(out.as_slice(), &sixth[..]);

    // One block past the last indirect slot is beyond the maximum file size.
    assert!(matches!(
        fs.write(n, &sixth, (5 + 1024) * BLOCK_SIZE),
        Err(Error::FileTooLarge)
    ));

    // The inode now carries an indirect pointer block on disk.
    let mut disk = fs.unmount().unwrap();
    let sb = read_superblock(&mut disk).unwrap();
    let inode = get_inode(&mut disk, &sb, n).unwrap();
    assert_ne!(inode.indirect, 0);
    assert!(inode.direct.iter().all(|&b| b != 0));
}

#[test]
fn remove_releases_every_referenced_block() {
    let mut fs = common::formatted(100);
    let baseline = fs.free_blocks().to_vec();

    let n = fs.create().unwrap();
    let block = [0x5a; BLOCK_SIZE];
    for k in 0..6 {
        fs.write(n, &block, k * BLOCK_SIZE).unwrap();
    }
    // Five direct blocks, one indirect block, one indirect data block.
    assert_eq!(count_used(fs.free_blocks()), count_used(&baseline) + 7);

    fs.remove(n).unwrap();
    assert_eq!(fs.free_blocks(), baseline.as_slice());
    assert!(matches!(fs.stat(n), Err(Error::InvalidInode)));

    // The freed inode number is handed out again.
    assert_eq!(fs.create().unwrap(), n);
}

#[test]
fn remove_of_invalid_inode_fails() {
    let mut fs = common::formatted(100);
    assert!(matches!(fs.remove(3), Err(Error::InvalidInode)));
    let n = fs.create().unwrap();
    fs.remove(n).unwrap();
    assert!(matches!(fs.remove(n), Err(Error::InvalidInode)));
}

#[test]
fn mount_rejects_foreign_magic() {
    let mut disk = RamDisk::new(100);
    let fs: FileSystem<RamDisk> = FileSystem::new();
    fs.format(&mut disk).unwrap();

    // Stamp garbage over the superblock.
    disk.write_block(0, &[0xaa; BLOCK_SIZE]).unwrap();

    let mut fs = FileSystem::new();
    assert!(matches!(fs.mount(disk), Err(Error::InvalidMagic)));
    assert!(!fs.is_mounted());
}

#[test]
fn remount_rebuilds_an_identical_free_map() {
    let mut fs = common::formatted(100);
    let n = fs.create().unwrap();
    let block = [7u8; BLOCK_SIZE];
    for k in 0..7 {
        fs.write(n, &block, k * BLOCK_SIZE).unwrap();
    }
    let m = fs.create().unwrap();
    fs.write(m, b"short", 0).unwrap();

    let before = fs.free_blocks().to_vec();
    let disk = fs.unmount().unwrap();
    assert!(!fs.is_mounted());
    assert!(fs.free_blocks().is_empty());

    fs.mount(disk).unwrap();
    assert_eq!(fs.free_blocks(), before.as_slice());
}

#[test]
fn inode_table_exhaustion() {
    // 10 blocks -> one inode block -> 128 inode slots.
    let mut fs = common::formatted(10);
    for expected in 0..128 {
        assert_eq!(fs.create().unwrap(), expected);
    }
    assert!(matches!(fs.create(), Err(Error::OutOfInodes)));
}

#[test]
fn failed_indirect_allocation_rolls_back_the_data_block() {
    common::init_logs();
    // 8 blocks -> one inode block -> data blocks 2..=7, six in total.
    let mut fs = common::formatted(8);
    let n = fs.create().unwrap();

    // Five single-byte writes claim the five direct slots and five of the
    // six data blocks.
    for k in 0..5 {
        assert_eq!(fs.write(n, b"x", k * BLOCK_SIZE).unwrap(), 1);
    }
    assert_eq!(count_free(fs.free_blocks()), 1);

    // The sixth write claims the last free block as data, then finds no
    // block left for the indirect block and must hand the data block back.
    assert!(matches!(
        fs.write(n, b"x", 5 * BLOCK_SIZE),
        Err(Error::OutOfSpace)
    ));
    assert_eq!(count_free(fs.free_blocks()), 1);
    assert_eq!(fs.stat(n).unwrap(), 5);
}

#[test]
fn write_caps_at_one_block_per_call() {
    let mut fs = common::formatted(100);
    let n = fs.create().unwrap();

    let oversized = vec![9u8; BLOCK_SIZE + 123];
    assert_eq!(fs.write(n, &oversized, 0).unwrap(), BLOCK_SIZE);
    assert_eq!(fs.stat(n).unwrap() as usize, BLOCK_SIZE);

    let mut out = vec![0u8; 2 * BLOCK_SIZE];
    assert_eq!(fs.read(n, &mut out, 0).unwrap(), BLOCK_SIZE);
    assert_eq!(&out[..BLOCK_SIZE], &oversized[..BLOCK_SIZE]);
}

#[test]
fn short_write_zero_pads_the_block() {
    let mut fs = common::formatted(100);
    let n = fs.create().unwrap();
    // A full-block write first, so the size covers the whole block and the
    // padding of the second write becomes readable.
    fs.write(n, &[1u8; BLOCK_SIZE], 0).unwrap();
    fs.write(n, b"tail", 0).unwrap();

    let mut out = vec![0xffu8; BLOCK_SIZE];
    assert_eq!(fs.read(n, &mut out, 0).unwrap(), BLOCK_SIZE);
    assert_eq!(&out[..4], b"tail");
    assert!(out[4..].iter().all(|&b| b == 0));
}

#[test]
fn read_beyond_size_fails() {
    let mut fs = common::formatted(100);
    let n = fs.create().unwrap();
    fs.write(n, b"hello", 0).unwrap();

    let mut out = [0u8; 8];
    assert!(matches!(fs.read(n, &mut out, 5), Err(Error::OutOfBounds)));
    assert!(matches!(
        fs.read(n, &mut out, BLOCK_SIZE),
        Err(Error::OutOfBounds)
    ));
}

#[test]
fn reading_a_hole_fails() {
    let mut fs = common::formatted(100);
    let n = fs.create().unwrap();
    // Writing only the second block leaves direct slot 0 empty while the
    // size covers it.
    fs.write(n, &[2u8; BLOCK_SIZE], BLOCK_SIZE).unwrap();

    let mut out = [0u8; 16];
    assert!(matches!(fs.read(n, &mut out, 0), Err(Error::InvalidBlockId)));
}

#[test]
fn operations_demand_the_right_mount_state() {
    let mut fs: FileSystem<RamDisk> = FileSystem::new();
    let mut out = [0u8; 4];
    assert!(matches!(fs.create(), Err(Error::NotMounted)));
    assert!(matches!(fs.remove(0), Err(Error::NotMounted)));
    assert!(matches!(fs.stat(0), Err(Error::NotMounted)));
    assert!(matches!(fs.read(0, &mut out, 0), Err(Error::NotMounted)));
    assert!(matches!(fs.write(0, &out, 0), Err(Error::NotMounted)));
    assert!(fs.unmount().is_none());

    let mut fs = common::formatted(10);
    let mut other = RamDisk::new(10);
    assert!(matches!(fs.format(&mut other), Err(Error::AlreadyMounted)));

    let mut second = RamDisk::new(10);
    let fresh: FileSystem<RamDisk> = FileSystem::new();
    fresh.format(&mut second).unwrap();
    assert!(matches!(fs.mount(second), Err(Error::AlreadyMounted)));
}

#[test]
fn stat_of_out_of_range_inode_fails() {
    let mut fs = common::formatted(10);
    // One inode block holds 128 slots.
    assert!(matches!(fs.stat(128), Err(Error::OutOfBounds)));
    assert!(matches!(fs.remove(4096), Err(Error::OutOfBounds)));
}

#[test]
fn debug_report_walks_the_volume() {
    let mut fs = common::formatted(100);
    let n = fs.create().unwrap();
    for k in 0..6 {
        fs.write(n, &[3u8; BLOCK_SIZE], k * BLOCK_SIZE).unwrap();
    }
    let mut disk = fs.unmount().unwrap();
    // Smoke test: the report must traverse superblock, inodes and the
    // indirect block without erroring out of the process.
    debug(&mut disk);
}

fn count_used(map: &[bool]) -> usize {
    map.iter().filter(|&&used| used).count()
}

fn count_free(map: &[bool]) -> usize {
    map.iter().filter(|&&used| !used).count()
}
