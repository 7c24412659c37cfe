use std::time::{Duration, SystemTime, UNIX_EPOCH};

use libc::stat;

use super::FileType;

#[derive(Debug, Clone)]
pub struct Metadata {
    pub size: i64,                   // st_size
    pub file_type: Option<FileType>, // st_mode
    pub mode: u32,                   // st_mode
    pub uid: u32,                    // st_uid
    pub gid: u32,                    // st_gid
    pub parent_device_id: u64,       // st_dev
    pub self_device_id: u64,         // st_rdev
    pub time_accessed: (i64, i64),   // st_atime, st_atime_nsec
    pub time_modified: (i64, i64),   // st_mtime, st_mtime_nsec
    pub time_changed: (i64, i64),    // st_ctime, st_ctime_nsec
    pub links: u64,                  // st_nlink
    pub block_size: i64,             // st_blksize
    pub blocks: i64,                 // st_blocks
    pub inode_num: u64,              // st_ino
}

impl Metadata {
    #[allow(clippy::unnecessary_cast)]
    pub(crate) const fn from_stat(raw: stat) -> Metadata {
        Metadata {
            size: raw.st_size as i64,
            file_type: FileType::from_mode(raw.st_mode as u32),
            mode: raw.st_mode as u32,
            uid: raw.st_uid as u32,
            gid: raw.st_gid as u32,
            parent_device_id: raw.st_dev as u64,
            self_device_id: raw.st_rdev as u64,
            time_accessed: (raw.st_atime as i64, raw.st_atime_nsec as i64),
            time_modified: (raw.st_mtime as i64, raw.st_mtime_nsec as i64),
            time_changed: (raw.st_ctime as i64, raw.st_ctime_nsec as i64),
            links: raw.st_nlink as u64,
            block_size: raw.st_blksize as i64,
            blocks: raw.st_blocks as i64,
            inode_num: raw.st_ino as u64,
        }
    }

    pub fn is_regular(&self) -> bool {
        self.mode & libc::S_IFMT == libc::S_IFREG
    }

    pub fn is_dir(&self) -> bool {
        self.mode & libc::S_IFMT == libc::S_IFDIR
    }

    /// Whether both describe the same underlying entry, regardless of the path used to reach it.
    pub fn same_entry(&self, other: &Metadata) -> bool {
        self.parent_device_id == other.parent_device_id && self.inode_num == other.inode_num
    }

    pub fn modified(&self) -> SystemTime {
        let (secs, nanos) = self.time_modified;
        let nanos = Duration::from_nanos(nanos.clamp(0, 999_999_999) as u64);
        if secs >= 0 {
            UNIX_EPOCH + Duration::from_secs(secs as u64) + nanos
        } else {
            UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs()) + nanos
        }
    }
}
