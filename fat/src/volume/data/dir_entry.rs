use alloc::string::String;

use crate::SectorId;

/// 文件名的最大长度（字节）
pub const NAME_MAX: usize = 14;

/// 目录项：把名称绑定到 inode 所在扇区。
///
/// 布局：inode扇区(4) | 名称(NAME_MAX + 1，`\0`结尾) | 使用中(1)
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirEntry {
    inode_sector: u32,
    // 最后一字节留给 \0
    name: [u8; NAME_MAX + 1],
    in_use: bool,
}

impl DirEntry {
    /// 目录项大小恒为20字节
    pub const SIZE: usize = 4 + NAME_MAX + 1 + 1;

    /// 名称过长时返回空
    pub fn new(name: &str, inode_sector: SectorId) -> Option<Self> {
        let bytes = name.as_bytes();
        if bytes.len() > NAME_MAX {
            return None;
        }
        let mut arr = [0; NAME_MAX + 1];
        arr[..bytes.len()].copy_from_slice(bytes);

        Some(Self {
            inode_sector: inode_sector.raw() as u32,
            name: arr,
            in_use: true,
        })
    }

    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|&c| c == 0).unwrap_or(NAME_MAX);
        // 名称只会从`&str`写入，截断在字符中间的损坏数据当作空名
        core::str::from_utf8(&self.name[..len]).unwrap_or_default()
    }

    pub fn name_owned(&self) -> String {
        String::from(self.name())
    }

    #[inline]
    pub fn inode_sector(&self) -> SectorId {
        SectorId::new(self.inode_sector as usize)
    }

    #[inline]
    pub fn in_use(&self) -> bool {
        self.in_use
    }

    /// 标记为墓碑
    #[inline]
    pub fn release(&mut self) {
        self.in_use = false;
    }

    pub fn decode(bytes: &[u8; Self::SIZE]) -> Self {
        let mut name = [0; NAME_MAX + 1];
        name.copy_from_slice(&bytes[4..4 + NAME_MAX + 1]);

        Self {
            inode_sector: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            name,
            in_use: bytes[Self::SIZE - 1] != 0,
        }
    }

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];
        bytes[..4].copy_from_slice(&self.inode_sector.to_le_bytes());
        bytes[4..4 + NAME_MAX + 1].copy_from_slice(&self.name);
        bytes[Self::SIZE - 1] = self.in_use as u8;
        bytes
    }
}
