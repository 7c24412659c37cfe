use derive_more::IsVariant;

/// The kind of entry a path refers to, taken from the `S_IFMT` bits of a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IsVariant)]
pub enum FileType {
    BlockDevice,
    CharDevice,
    Directory,
    Fifo,
    Symlink,
    Regular,
    Socket,
}

use FileType::*;

impl FileType {
    /// Interprets the entry-type bits of a mode. A mode with no type bits at all is treated as a
    /// regular file, so that bare permission values like `0o644` are accepted.
    pub const fn from_mode(mode: u32) -> Option<FileType> {
        Some(match mode & libc::S_IFMT {
            0 | libc::S_IFREG => Regular,
            libc::S_IFBLK => BlockDevice,
            libc::S_IFCHR => CharDevice,
            libc::S_IFDIR => Directory,
            libc::S_IFIFO => Fifo,
            libc::S_IFLNK => Symlink,
            libc::S_IFSOCK => Socket,
            _ => return None,
        })
    }

    /// The marker used in the first position of a symbolic permission string, as printed by `ls`.
    pub const fn symbol(&self) -> char {
        match self {
            BlockDevice => 'b',
            CharDevice => 'c',
            Directory => 'd',
            Fifo => 'p',
            Symlink => 'l',
            Regular => '-',
            Socket => 's',
        }
    }

    pub const fn from_symbol(symbol: char) -> Option<FileType> {
        Some(match symbol {
            'b' => BlockDevice,
            'c' => CharDevice,
            'd' => Directory,
            'p' => Fifo,
            'l' => Symlink,
            '-' => Regular,
            's' => Socket,
            _ => return None,
        })
    }

    /// The type bits used when composing a mode from a symbolic string. Regular files get no bits,
    /// matching what a plain permission value looks like.
    pub const fn mode_bits(&self) -> u32 {
        match self {
            BlockDevice => libc::S_IFBLK,
            CharDevice => libc::S_IFCHR,
            Directory => libc::S_IFDIR,
            Fifo => libc::S_IFIFO,
            Symlink => libc::S_IFLNK,
            Regular => 0,
            Socket => libc::S_IFSOCK,
        }
    }
}
