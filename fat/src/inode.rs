//! # 索引节点层
//!
//! 每个 inode 记录占据数据区的一个扇区（一个单簇链表），
//! 扇区号就是它的身份。
//!
//! 同一扇区在内存中至多有一个打开的 inode：
//! 重复打开只会增加其引用计数，所有 [`Inode`] 句柄共享同一份状态。
//! 被删除的 inode 要等到最后一个句柄关闭时才归还扇区与簇链表。

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::fmt;

use spin::Mutex;

use crate::sector::{self, SECTOR_SIZE, SectorBuf};
use crate::volume::data::DiskInode;
use crate::{ClusterId, Error, FatFileSystem, Result, SectorId};

/// 打开的 inode 表，以扇区号为键
#[derive(Debug, Default)]
pub(crate) struct InodeTable {
    open: Mutex<BTreeMap<SectorId, Arc<Mutex<OpenInode>>>>,
}

#[derive(Debug)]
struct OpenInode {
    /// 打开次数
    open_cnt: usize,
    /// 最后一次关闭时是否删除
    removed: bool,
    /// 0时允许写入，大于0时禁止
    deny_write_cnt: usize,
    disk: DiskInode,
    /// 簇链表的最后一个簇，空链表时为空。
    /// 扩张时直接链接在它后面，无需从头遍历。
    tail: Option<ClusterId>,
}

/// 内存中的 inode 句柄。
///
/// [`Clone`]相当于再次打开，[`Drop`]相当于关闭。
pub struct Inode {
    sector: SectorId,
    inner: Arc<Mutex<OpenInode>>,
    fs: Arc<FatFileSystem>,
}

impl InodeTable {
    /// 当前打开的 inode 个数
    pub fn len(&self) -> usize {
        self.open.lock().len()
    }
}

impl Inode {
    /// 在`sector`处写入长度为`length`字节的新 inode，
    /// 并为其分配同样长度、以0填充的簇链表。
    ///
    /// 簇不足，或长度超出`u32`能表示的范围时返回[`Error::NoSpace`]，
    /// 已分配的簇会被归还。
    pub fn create(fs: &FatFileSystem, sector: SectorId, length: usize, is_dir: bool) -> Result<()> {
        if length > u32::MAX as usize {
            return Err(Error::NoSpace);
        }
        let fat = fs.fat();
        let sectors = DiskInode::sectors_for(length);

        let start = if sectors == 0 {
            ClusterId::FREE
        } else {
            fat.allocate(sectors).ok_or(Error::NoSpace)?
        };

        let disk = DiskInode::new(start, length as u32, is_dir);
        let mut buf: SectorBuf = [0; SECTOR_SIZE];
        disk.encode(&mut buf);
        sector::write(fs.dev(), sector, &buf);

        let mut id = start;
        for _ in 0..sectors {
            sector::zeroize(fs.dev(), fat.cluster_to_sector(id));
            if let Some(next) = fat.next(id) {
                id = next;
            }
        }

        log::debug!("created inode at sector {sector}: length={length} dir={is_dir}");
        Ok(())
    }

    /// 打开`sector`处的 inode。
    /// 已经打开则共享同一份状态。
    ///
    /// # Panics
    ///
    /// 扇区内不是 inode 记录（魔数不符）。
    pub fn open(fs: &Arc<FatFileSystem>, sector: SectorId) -> Self {
        let mut open = fs.inodes().open.lock();

        if let Some(inner) = open.get(&sector) {
            inner.lock().open_cnt += 1;
            return Self {
                sector,
                inner: Arc::clone(inner),
                fs: Arc::clone(fs),
            };
        }

        let mut buf: SectorBuf = [0; SECTOR_SIZE];
        sector::read(fs.dev(), sector, &mut buf);
        let disk = DiskInode::decode(&buf);
        assert!(disk.is_valid(), "sector {sector} doesn't hold an inode");

        let tail = (!disk.start.is_free()).then(|| fs.fat().last(disk.start));
        let inner = Arc::new(Mutex::new(OpenInode {
            open_cnt: 1,
            removed: false,
            deny_write_cnt: 0,
            disk,
            tail,
        }));
        open.insert(sector, Arc::clone(&inner));

        Self {
            sector,
            inner,
            fs: Arc::clone(fs),
        }
    }

    /// 再次打开，与`self`共享状态
    pub fn reopen(&self) -> Self {
        self.inner.lock().open_cnt += 1;
        Self {
            sector: self.sector,
            inner: Arc::clone(&self.inner),
            fs: Arc::clone(&self.fs),
        }
    }

    /// 关闭句柄。
    /// 若这是最后一个句柄，且 inode 已被删除，则归还其扇区与簇链表。
    #[inline]
    pub fn close(self) {
        drop(self);
    }

    /// 标记为删除，直到最后一次关闭才真正释放
    pub fn remove(&self) {
        self.inner.lock().removed = true;
    }

    #[inline]
    pub fn sector(&self) -> SectorId {
        self.sector
    }

    pub fn length(&self) -> usize {
        self.inner.lock().disk.length as usize
    }

    pub fn is_dir(&self) -> bool {
        self.inner.lock().disk.is_dir()
    }

    pub fn is_removed(&self) -> bool {
        self.inner.lock().removed
    }

    /// 打开次数
    pub fn open_count(&self) -> usize {
        self.inner.lock().open_cnt
    }

    /// 数据簇链表的首个簇
    pub fn start(&self) -> ClusterId {
        self.inner.lock().disk.start
    }

    #[inline]
    pub(crate) fn fs(&self) -> &Arc<FatFileSystem> {
        &self.fs
    }

    /// 禁止写入，每个打开者至多调用一次。
    ///
    /// 目录的内容由目录层维护，不能被禁止写入，返回[`Error::IsADirectory`]。
    pub fn deny_write(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.disk.is_dir() {
            return Err(Error::IsADirectory);
        }
        inner.deny_write_cnt += 1;
        assert!(inner.deny_write_cnt <= inner.open_cnt);
        Ok(())
    }

    /// 重新允许写入，调用过[`Inode::deny_write`]的打开者在关闭前必须调用一次
    pub fn allow_write(&self) {
        let mut inner = self.inner.lock();
        assert!(inner.deny_write_cnt > 0);
        assert!(inner.deny_write_cnt <= inner.open_cnt);
        inner.deny_write_cnt -= 1;
    }

    /// 把内存中的记录写回 inode 所在扇区
    pub fn flush(&self) {
        let inner = self.inner.lock();
        self.write_record(&inner.disk);
    }

    /// 从`offset`开始读出数据填充`buf`，返回实际读出的字节数。
    ///
    /// 到达文件末尾时会少于`buf.len()`。
    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> usize {
        let (start, length) = {
            let inner = self.inner.lock();
            (inner.disk.start, inner.disk.length as usize)
        };

        if offset >= length || buf.is_empty() {
            return 0;
        }
        let end = offset.saturating_add(buf.len()).min(length);

        let fat = self.fs.fat();
        let Some(mut cluster) = fat.walk(start, offset / SECTOR_SIZE) else {
            return 0;
        };

        let mut bounce: SectorBuf = [0; SECTOR_SIZE];
        let mut pos = offset;
        let mut read_size = 0;
        loop {
            let sector_ofs = pos % SECTOR_SIZE;
            let chunk_size = (SECTOR_SIZE - sector_ofs).min(end - pos);
            let sid = fat.cluster_to_sector(cluster);
            let dest = &mut buf[read_size..read_size + chunk_size];

            if chunk_size == SECTOR_SIZE {
                // 整个扇区直接读进调用者的缓冲区
                sector::read(self.fs.dev(), sid, dest);
            } else {
                sector::read(self.fs.dev(), sid, &mut bounce);
                dest.copy_from_slice(&bounce[sector_ofs..sector_ofs + chunk_size]);
            }

            read_size += chunk_size;
            pos += chunk_size;

            if pos == end {
                break;
            }
            match fat.next(cluster) {
                Some(next) => cluster = next,
                None => break,
            }
        }

        read_size
    }

    /// 把`buf`写入`offset`处，返回实际写入的字节数。
    ///
    /// 写入超出文件末尾时先扩张文件，原末尾到`offset`之间以0填充；
    /// 簇不足时只写入已分配的部分。禁止写入，或写入末尾超出`u32`能表示的长度时，
    /// 直接返回0，文件不变。
    pub fn write_at(&self, offset: usize, buf: &[u8]) -> usize {
        let mut inner = self.inner.lock();

        if inner.deny_write_cnt > 0 || buf.is_empty() {
            return 0;
        }

        // 长度字段只有32位
        let Some(end) = offset
            .checked_add(buf.len())
            .filter(|&end| end <= u32::MAX as usize)
        else {
            log::warn!("inode {}: write at {offset} exceeds the maximum file size", self.sector);
            return 0;
        };

        let old_length = inner.disk.length as usize;
        if end > old_length {
            self.expand_to(&mut inner, offset, end);
        }

        let length = inner.disk.length as usize;
        let written = if offset < length {
            self.write_range(inner.disk.start, offset, &buf[..end.min(length) - offset])
        } else {
            0
        };

        if length != old_length {
            self.write_record(&inner.disk);
        }

        written
    }
}

impl Inode {
    fn write_record(&self, disk: &DiskInode) {
        let mut buf: SectorBuf = [0; SECTOR_SIZE];
        disk.encode(&mut buf);
        sector::write(self.fs.dev(), self.sector, &buf);
    }

    /// 逐簇扩张至`end`字节，长度随扩张推进。
    fn expand_to(&self, inner: &mut OpenInode, offset: usize, end: usize) {
        let fat = self.fs.fat();
        let dev = self.fs.dev();
        let old_length = inner.disk.length as usize;

        // 原最后一个扇区未写满：读出后清零文件末尾到写入起点之间的部分
        let tail_ofs = old_length % SECTOR_SIZE;
        if offset > old_length && tail_ofs != 0 {
            let tail = inner.tail.expect("non-empty inode has a tail cluster");
            let sid = fat.cluster_to_sector(tail);
            let sector_base = old_length - tail_ofs;
            let gap_end = offset.min(sector_base + SECTOR_SIZE) - sector_base;

            let mut bounce: SectorBuf = [0; SECTOR_SIZE];
            sector::read(dev, sid, &mut bounce);
            bounce[tail_ofs..gap_end].fill(0);
            sector::write(dev, sid, &bounce);
        }

        let mut sectors = DiskInode::sectors_for(old_length);
        let needed = DiskInode::sectors_for(end);
        while sectors < needed {
            let Some(new) = fat.create_chain(inner.tail) else {
                log::warn!(
                    "inode {} stops growing at {} bytes: no free cluster",
                    self.sector,
                    inner.disk.length
                );
                return;
            };
            if inner.tail.is_none() {
                inner.disk.start = new;
            }
            inner.tail = Some(new);
            sector::zeroize(dev, fat.cluster_to_sector(new));

            sectors += 1;
            inner.disk.length = (sectors * SECTOR_SIZE).min(end) as u32;
        }

        inner.disk.length = end as u32;
    }

    /// 在文件范围之内写入，逐扇区进行
    fn write_range(&self, start: ClusterId, offset: usize, buf: &[u8]) -> usize {
        let fat = self.fs.fat();
        let dev = self.fs.dev();
        let Some(mut cluster) = fat.walk(start, offset / SECTOR_SIZE) else {
            return 0;
        };

        let end = offset + buf.len();
        let mut bounce: SectorBuf = [0; SECTOR_SIZE];
        let mut pos = offset;
        let mut written = 0;
        loop {
            let sector_ofs = pos % SECTOR_SIZE;
            let chunk_size = (SECTOR_SIZE - sector_ofs).min(end - pos);
            let sid = fat.cluster_to_sector(cluster);
            let src = &buf[written..written + chunk_size];

            if chunk_size == SECTOR_SIZE {
                sector::write(dev, sid, src);
            } else {
                // 保留扇区内未被覆盖的部分
                sector::read(dev, sid, &mut bounce);
                bounce[sector_ofs..sector_ofs + chunk_size].copy_from_slice(src);
                sector::write(dev, sid, &bounce);
            }

            written += chunk_size;
            pos += chunk_size;

            if pos == end {
                break;
            }
            match fat.next(cluster) {
                Some(next) => cluster = next,
                None => break,
            }
        }

        written
    }
}

impl Clone for Inode {
    fn clone(&self) -> Self {
        self.reopen()
    }
}

impl Drop for Inode {
    fn drop(&mut self) {
        let mut open = self.fs.inodes().open.lock();
        let mut inner = self.inner.lock();

        inner.open_cnt -= 1;
        if inner.open_cnt > 0 {
            return;
        }
        open.remove(&self.sector);

        if inner.removed {
            let fat = self.fs.fat();
            if !inner.disk.start.is_free() {
                fat.remove_chain(inner.disk.start, None);
            }
            fat.release_sector(self.sector);
            log::debug!("released inode at sector {}", self.sector);
        }
    }
}

impl fmt::Debug for Inode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inode")
            .field("sector", &self.sector)
            .field("inner", &*self.inner.lock())
            .finish()
    }
}
