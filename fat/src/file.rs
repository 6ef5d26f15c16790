use alloc::vec::Vec;

use crate::sector::SECTOR_SIZE;
use crate::{Inode, Result};

/// 打开的文件：inode 加上文件内的偏移量。
///
/// 关闭（[`Drop`]）时若仍禁止写入，会先重新允许写入。
#[derive(Debug)]
pub struct File {
    inode: Inode,
    /// **文件**内的偏移量
    pos: usize,
    /// 本文件是否调用过[`File::deny_write`]
    deny_write: bool,
}

impl File {
    /// 接管`inode`，偏移量为0
    #[inline]
    pub fn open(inode: Inode) -> Self {
        Self {
            inode,
            pos: 0,
            deny_write: false,
        }
    }

    /// 再次打开同一 inode，偏移量从0开始
    #[inline]
    pub fn reopen(&self) -> Self {
        Self::open(self.inode.reopen())
    }

    /// 复制偏移量与禁止写入状态
    pub fn duplicate(&self) -> Self {
        let mut file = self.reopen();
        file.pos = self.pos;
        if self.deny_write {
            // 能被禁止写入的一定不是目录
            file.deny_write = file.inode.deny_write().is_ok();
        }
        file
    }

    #[inline]
    pub fn inode(&self) -> &Inode {
        &self.inode
    }

    /// 从当前偏移量读取，偏移量随之前进
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let read_size = self.inode.read_at(self.pos, buf);
        self.pos += read_size;
        read_size
    }

    /// 从当前偏移量读到文件末尾
    pub fn read_all(&mut self) -> Vec<u8> {
        let mut buffer = [0u8; SECTOR_SIZE];

        let mut bytes = Vec::new();
        loop {
            let len = self.read(&mut buffer);
            if len == 0 {
                break;
            }
            bytes.extend_from_slice(&buffer[..len]);
        }
        bytes
    }

    /// 不改变偏移量
    #[inline]
    pub fn read_at(&self, buf: &mut [u8], offset: usize) -> usize {
        self.inode.read_at(offset, buf)
    }

    /// 在当前偏移量写入，偏移量随之前进
    pub fn write(&mut self, buf: &[u8]) -> usize {
        let write_size = self.inode.write_at(self.pos, buf);
        self.pos += write_size;
        write_size
    }

    /// 不改变偏移量
    #[inline]
    pub fn write_at(&self, buf: &[u8], offset: usize) -> usize {
        self.inode.write_at(offset, buf)
    }

    /// 禁止对该 inode 的写入，直到[`File::allow_write`]或关闭。
    /// 目录返回[`Error::IsADirectory`](crate::Error::IsADirectory)。
    pub fn deny_write(&mut self) -> Result<()> {
        if !self.deny_write {
            self.inode.deny_write()?;
            self.deny_write = true;
        }
        Ok(())
    }

    pub fn allow_write(&mut self) {
        if self.deny_write {
            self.deny_write = false;
            self.inode.allow_write();
        }
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.inode.length()
    }

    /// 偏移量可以超出文件末尾，之后的写入会扩张文件
    #[inline]
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    #[inline]
    pub fn tell(&self) -> usize {
        self.pos
    }
}

impl Drop for File {
    fn drop(&mut self) {
        self.allow_write();
    }
}
