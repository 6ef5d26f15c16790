use crate::sector::{SECTOR_SIZE, SectorBuf};
use crate::{ClusterId, SectorId};

/// 启动记录
/// 位于0号扇区，描述FAT区与数据区的位置。
///
/// 六个小端序`u32`依次排列，扇区剩余部分皆填0。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootRecord {
    /// 魔数：用于识别FAT文件系统
    magic: u32,

    /// 一个簇的扇区数，恒为1
    sectors_per_cluster: u32,

    /// 设备的扇区总数
    total_sectors: u32,

    /// FAT区的起始扇区
    fat_start: u32,

    /// FAT区占用的扇区数
    fat_sectors: u32,

    /// 根目录所在簇
    root_dir_cluster: u32,
}

impl BootRecord {
    pub const MAGIC: u32 = 0xEB3C_9000;

    /// 启动记录所在扇区
    pub const SECTOR: SectorId = SectorId::new(0);

    pub const SECTORS_PER_CLUSTER: u32 = 1;

    /// 一个FAT扇区能容纳多少个条目
    pub const ENTRIES_PER_SECTOR: usize = SECTOR_SIZE / size_of::<u32>();

    /// 能够格式化的最小设备：启动扇区、一个FAT扇区，
    /// 再加上根目录 inode 与其目录项各占的一个数据扇区
    pub const MIN_SECTORS: usize = 4;

    const FIELDS: usize = 6;

    /// 按设备容量生成新的启动记录。
    ///
    /// FAT区的大小使得：FAT扇区数 + 每个条目一个数据扇区 恰好覆盖整个设备。
    /// 设备小于[`BootRecord::MIN_SECTORS`]时记录仍可生成，但容不下根目录。
    pub fn new(total_sectors: usize) -> Self {
        let fat_sectors = total_sectors
            .saturating_sub(1)
            .div_ceil(Self::ENTRIES_PER_SECTOR + 1);

        Self {
            magic: Self::MAGIC,
            sectors_per_cluster: Self::SECTORS_PER_CLUSTER,
            total_sectors: total_sectors as u32,
            fat_start: 1,
            fat_sectors: fat_sectors as u32,
            root_dir_cluster: ClusterId::MIN.into(),
        }
    }

    pub fn decode(buf: &SectorBuf) -> Self {
        let mut fields = buf
            .chunks_exact(size_of::<u32>())
            .take(Self::FIELDS)
            .map(|bytes| u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
        let mut next = || fields.next().unwrap_or_default();

        Self {
            magic: next(),
            sectors_per_cluster: next(),
            total_sectors: next(),
            fat_start: next(),
            fat_sectors: next(),
            root_dir_cluster: next(),
        }
    }

    pub fn encode(&self, buf: &mut SectorBuf) {
        buf.fill(0);
        let fields = [
            self.magic,
            self.sectors_per_cluster,
            self.total_sectors,
            self.fat_start,
            self.fat_sectors,
            self.root_dir_cluster,
        ];
        for (dest, field) in buf.chunks_exact_mut(size_of::<u32>()).zip(fields) {
            dest.copy_from_slice(&field.to_le_bytes());
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == Self::MAGIC
    }

    pub const fn total_sectors(&self) -> usize {
        self.total_sectors as usize
    }

    pub const fn fat_area(&self) -> SectorId {
        SectorId::new(self.fat_start as usize)
    }

    /// FAT占用的扇区数
    pub const fn fat_sectors(&self) -> usize {
        self.fat_sectors as usize
    }

    /// 数据区的起始扇区，即2号簇所在扇区
    pub const fn data_area(&self) -> SectorId {
        SectorId::new(self.fat_start as usize + self.fat_sectors as usize)
    }

    pub const fn root_dir_cluster(&self) -> ClusterId {
        ClusterId::new(self.root_dir_cluster)
    }

    /// FAT的条目数
    pub const fn fat_entries(&self) -> usize {
        self.fat_sectors() * Self::ENTRIES_PER_SECTOR
    }

    /// 数据区的扇区数
    pub const fn data_sectors(&self) -> usize {
        self.total_sectors().saturating_sub(self.data_area().raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fat_covers_device() {
        for total in [64, 130, 131, 1000, 16 * 2048] {
            let boot = BootRecord::new(total);
            assert!(boot.fat_sectors() + boot.fat_entries() >= total - 1);
            assert!(boot.fat_entries() >= boot.data_sectors());
        }
    }

    #[test]
    fn encode_decode() {
        let boot = BootRecord::new(4096);
        let mut buf = [0xAA; SECTOR_SIZE];
        boot.encode(&mut buf);
        assert_eq!(&buf[..4], &BootRecord::MAGIC.to_le_bytes());
        assert!(buf[24..].iter().all(|&b| b == 0));

        let decoded = BootRecord::decode(&buf);
        assert!(decoded.is_valid());
        assert_eq!(boot, decoded);
        assert_eq!(ClusterId::MIN, decoded.root_dir_cluster());
    }

    #[test]
    fn tiny_devices() {
        let boot = BootRecord::new(0);
        assert_eq!(0, boot.fat_sectors());
        assert_eq!(0, boot.data_sectors());

        let boot = BootRecord::new(BootRecord::MIN_SECTORS);
        assert_eq!(1, boot.fat_sectors());
        assert_eq!(2, boot.data_sectors());
    }

    #[test]
    fn blank_sector_is_invalid() {
        assert!(!BootRecord::decode(&[0; SECTOR_SIZE]).is_valid());
    }
}
