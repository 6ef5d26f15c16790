use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::volume::data::DirEntry;
use crate::{Error, FatFileSystem, Inode, Result, SectorId};

/// 打开的目录：目录 inode 加上[`Dir::readdir`]的游标。
///
/// 目录的内容是定长目录项组成的数组。
/// 删除只会把目录项标记为未使用，空位留给之后的[`Dir::add`]。
#[derive(Debug)]
pub struct Dir {
    inode: Inode,
    /// 读目录的字节偏移
    pos: usize,
}

impl Dir {
    /// 在`sector`处创建可容纳`entry_cnt`个目录项的空目录
    pub fn create(fs: &FatFileSystem, sector: SectorId, entry_cnt: usize) -> Result<()> {
        Inode::create(fs, sector, entry_cnt * DirEntry::SIZE, true)
    }

    /// 以目录方式打开`inode`，接管它的所有权
    pub fn open(inode: Inode) -> Result<Self> {
        if !inode.is_dir() {
            return Err(Error::NotADirectory);
        }
        Ok(Self { inode, pos: 0 })
    }

    pub fn open_root(fs: &Arc<FatFileSystem>) -> Self {
        Self {
            inode: Inode::open(fs, fs.root_sector()),
            pos: 0,
        }
    }

    /// 再次打开同一目录，游标从头开始
    pub fn reopen(&self) -> Self {
        Self {
            inode: self.inode.reopen(),
            pos: 0,
        }
    }

    #[inline]
    pub fn inode(&self) -> &Inode {
        &self.inode
    }

    /// 查找名为`name`的目录项，返回它和它的字节偏移
    pub fn lookup(&self, name: &str) -> Option<(DirEntry, usize)> {
        self.slots()
            .find(|(entry, _)| entry.in_use() && entry.name() == name)
    }

    /// 打开名为`name`的目录项指向的 inode
    pub fn find(&self, name: &str) -> Option<Inode> {
        let (entry, _) = self.lookup(name)?;
        Some(Inode::open(self.inode.fs(), entry.inode_sector()))
    }

    /// 添加名为`name`、指向`sector`处 inode 的目录项。
    ///
    /// 优先复用第一个未使用的目录项，没有时在末尾追加，目录随之扩张。
    pub fn add(&self, name: &str, sector: SectorId) -> Result<()> {
        if name.is_empty() || name.contains('/') {
            return Err(Error::InvalidName);
        }
        let entry = DirEntry::new(name, sector).ok_or(Error::InvalidName)?;

        if self.inode.is_removed() {
            return Err(Error::NotFound);
        }
        if self.lookup(name).is_some() {
            return Err(Error::AlreadyExists);
        }

        let offset = self
            .slots()
            .find(|(entry, _)| !entry.in_use())
            .map_or(self.inode.length(), |(_, offset)| offset);

        if self.inode.write_at(offset, &entry.encode()) != DirEntry::SIZE {
            return Err(Error::NoSpace);
        }

        log::debug!("{name:?} -> sector {sector} added at offset {offset}");
        Ok(())
    }

    /// 删除名为`name`的目录项，并把它指向的 inode 标记为删除
    pub fn remove(&self, name: &str) -> Result<()> {
        let (mut entry, offset) = self.lookup(name).ok_or(Error::NotFound)?;
        let inode = Inode::open(self.inode.fs(), entry.inode_sector());

        entry.release();
        let written = self.inode.write_at(offset, &entry.encode());
        assert_eq!(DirEntry::SIZE, written, "entry {name:?} rewrites in place");

        inode.remove();
        log::debug!("{name:?} removed from offset {offset}");
        Ok(())
    }

    /// 读出下一个使用中的名称，读完时返回空
    pub fn readdir(&mut self) -> Option<String> {
        let mut buf = [0; DirEntry::SIZE];
        while self.inode.read_at(self.pos, &mut buf) == DirEntry::SIZE {
            self.pos += DirEntry::SIZE;
            let entry = DirEntry::decode(&buf);
            if entry.in_use() {
                return Some(entry.name_owned());
            }
        }
        None
    }

    /// 游标回到目录开头
    #[inline]
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// 没有使用中的目录项
    pub fn is_empty(&self) -> bool {
        !self.slots().any(|(entry, _)| entry.in_use())
    }

    /// 全部使用中的目录项
    pub fn entries(&self) -> Vec<DirEntry> {
        self.slots()
            .filter_map(|(entry, _)| entry.in_use().then_some(entry))
            .collect()
    }
}

impl Dir {
    /// 依次读出每个目录项及其偏移，包括未使用的
    fn slots(&self) -> impl Iterator<Item = (DirEntry, usize)> + '_ {
        (0..)
            .step_by(DirEntry::SIZE)
            .map_while(|offset| {
                let mut buf = [0; DirEntry::SIZE];
                (self.inode.read_at(offset, &mut buf) == DirEntry::SIZE)
                    .then(|| (DirEntry::decode(&buf), offset))
            })
    }
}
