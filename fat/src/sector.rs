//! 扇区的抽象
//!
//! 不做缓存：每次读写都直接落到块设备上，恰好一个扇区。

use block_dev::{BLOCK_SIZE, BlockDevice};
use derive_more::{Add, Display, From, Into};

/// 扇区的字节数，与块设备的块大小、inode记录的大小相同
pub const SECTOR_SIZE: usize = BLOCK_SIZE;

/// 一个扇区的数据
pub type SectorBuf = [u8; SECTOR_SIZE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Add, From, Into, Display)]
#[repr(transparent)]
pub struct SectorId(usize);

impl core::ops::Add<usize> for SectorId {
    type Output = Self;

    fn add(self, rhs: usize) -> Self::Output {
        self + Self(rhs)
    }
}

impl SectorId {
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> usize {
        self.0
    }
}

#[inline]
pub fn read(dev: &dyn BlockDevice, id: SectorId, buf: &mut [u8]) {
    debug_assert_eq!(buf.len(), SECTOR_SIZE);
    dev.read_block(id.0, buf);
}

#[inline]
pub fn write(dev: &dyn BlockDevice, id: SectorId, buf: &[u8]) {
    debug_assert_eq!(buf.len(), SECTOR_SIZE);
    dev.write_block(id.0, buf);
}

/// 以0填充整个扇区
#[inline]
pub fn zeroize(dev: &dyn BlockDevice, id: SectorId) {
    static ZEROS: SectorBuf = [0; SECTOR_SIZE];
    write(dev, id, &ZEROS);
}
