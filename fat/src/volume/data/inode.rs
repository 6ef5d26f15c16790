use enumflags2::{BitFlags, bitflags};

use crate::ClusterId;
use crate::sector::{SECTOR_SIZE, SectorBuf};

/// 磁盘上的 inode，恰好占据一个扇区。
///
/// 布局：起始簇(4) | 长度(4) | 魔数(4) | 标志(1) | 填充至扇区末尾
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskInode {
    /// 数据簇链表的首个簇，[`ClusterId::FREE`]表示没有数据
    pub start: ClusterId,
    /// 文件长度（字节）
    pub length: u32,
    magic: u32,
    pub flags: BitFlags<InodeFlag>,
}

#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeFlag {
    Directory = 0b0000_0001,
}

impl DiskInode {
    pub const MAGIC: u32 = 0x494E_4F44;

    /// 记录中有意义的字节数，其余均为填充
    const USED: usize = 13;

    pub fn new(start: ClusterId, length: u32, is_dir: bool) -> Self {
        let mut flags = BitFlags::empty();
        if is_dir {
            flags |= InodeFlag::Directory;
        }

        Self {
            start,
            length,
            magic: Self::MAGIC,
            flags,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == Self::MAGIC
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.flags.contains(InodeFlag::Directory)
    }

    pub fn decode(buf: &SectorBuf) -> Self {
        let word = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);

        Self {
            start: word(0).into(),
            length: word(4),
            magic: word(8),
            flags: BitFlags::from_bits_truncate(buf[12]),
        }
    }

    pub fn encode(&self, buf: &mut SectorBuf) {
        buf[0..4].copy_from_slice(&u32::from(self.start).to_le_bytes());
        buf[4..8].copy_from_slice(&self.length.to_le_bytes());
        buf[8..12].copy_from_slice(&self.magic.to_le_bytes());
        buf[12] = self.flags.bits();
        buf[Self::USED..].fill(0);
    }

    /// 容纳`length`字节需要多少个扇区
    #[inline]
    pub const fn sectors_for(length: usize) -> usize {
        length.div_ceil(SECTOR_SIZE)
    }
}

const _: () = assert!(DiskInode::USED <= SECTOR_SIZE);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let inode = DiskInode::new(ClusterId::new(7), 2010, true);
        let mut buf = [0xFF; SECTOR_SIZE];
        inode.encode(&mut buf);

        assert_eq!(&buf[0..4], &7u32.to_le_bytes());
        assert_eq!(&buf[4..8], &2010u32.to_le_bytes());
        assert_eq!(&buf[8..12], &DiskInode::MAGIC.to_le_bytes());
        assert_eq!(buf[12], 1);
        assert!(buf[13..].iter().all(|&b| b == 0));

        let decoded = DiskInode::decode(&buf);
        assert!(decoded.is_valid());
        assert!(decoded.is_dir());
        assert_eq!(inode, decoded);
    }

    #[test]
    fn sectors_round_up() {
        assert_eq!(0, DiskInode::sectors_for(0));
        assert_eq!(1, DiskInode::sectors_for(1));
        assert_eq!(1, DiskInode::sectors_for(SECTOR_SIZE));
        assert_eq!(4, DiskInode::sectors_for(2010));
    }
}
