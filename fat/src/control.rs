use alloc::sync::Arc;

use block_dev::BlockDevice;

use crate::inode::InodeTable;
use crate::path::{self, Path};
use crate::sector::{self, SECTOR_SIZE, SectorBuf};
use crate::volume::data::DirEntry;
use crate::volume::fat::FatArea;
use crate::volume::reserved::BootRecord;
use crate::{Dir, Error, File, Inode, Result, SectorId};

/// 已挂载的文件系统：设备、启动记录、分配表与打开的 inode 表
#[derive(Debug)]
pub struct FatFileSystem {
    dev: Arc<dyn BlockDevice>,
    boot: BootRecord,
    fat: FatArea,
    inodes: InodeTable,
}

impl FatFileSystem {
    /// 新建目录能容纳的目录项个数，根目录亦然
    pub const DIR_ENTRIES: usize = 16;

    /// 在`dev`上建立空的文件系统：写入启动记录、清空分配表、创建根目录
    ///
    /// # Panics
    ///
    /// 设备不足[`BootRecord::MIN_SECTORS`]个扇区。
    pub fn format(dev: &Arc<dyn BlockDevice>) -> Arc<Self> {
        let total = dev.num_blocks();
        assert!(
            total >= BootRecord::MIN_SECTORS,
            "device of {total} sectors is too small to format, at least {} needed",
            BootRecord::MIN_SECTORS
        );
        let boot = BootRecord::new(total);
        let fs = Self {
            dev: Arc::clone(dev),
            fat: FatArea::new(&boot),
            boot,
            inodes: InodeTable::default(),
        };

        let root = fs.fat.create_chain(None);
        assert_eq!(
            Some(fs.boot.root_dir_cluster()),
            root,
            "the root directory takes the first data cluster"
        );
        if Dir::create(&fs, fs.root_sector(), Self::DIR_ENTRIES).is_err() {
            panic!("root directory creation failed on a {} sector device", dev.num_blocks());
        }
        fs.flush();

        log::info!(
            "formatted {} sectors: {} FAT sectors, {} usable clusters",
            fs.boot.total_sectors(),
            fs.boot.fat_sectors(),
            fs.fat.usable_clusters()
        );
        Arc::new(fs)
    }

    /// 挂载`dev`上的文件系统。
    /// 启动记录的魔数不符时，按设备容量重新生成启动记录。
    pub fn mount(dev: &Arc<dyn BlockDevice>) -> Arc<Self> {
        let mut buf: SectorBuf = [0; SECTOR_SIZE];
        sector::read(dev.as_ref(), BootRecord::SECTOR, &mut buf);

        let mut boot = BootRecord::decode(&buf);
        if !boot.is_valid() {
            log::warn!("bad boot record magic, synthesizing one from the device size");
            boot = BootRecord::new(dev.num_blocks());
        }

        let fat = FatArea::new(&boot);
        fat.load(dev.as_ref());

        Arc::new(Self {
            dev: Arc::clone(dev),
            boot,
            fat,
            inodes: InodeTable::default(),
        })
    }

    /// 写回启动记录与分配表
    pub fn unmount(&self) {
        let open = self.inodes.len();
        if open > 0 {
            log::warn!("unmounting with {open} inodes still open");
        }
        self.flush();
        log::debug!("unmounted");
    }

    /// 根目录 inode 所在扇区
    #[inline]
    pub fn root_sector(&self) -> SectorId {
        self.fat.cluster_to_sector(self.boot.root_dir_cluster())
    }

    #[inline]
    pub fn fat(&self) -> &FatArea {
        &self.fat
    }

    #[inline]
    pub fn boot_record(&self) -> &BootRecord {
        &self.boot
    }

    #[inline]
    pub fn device(&self) -> &Arc<dyn BlockDevice> {
        &self.dev
    }

    #[inline]
    pub(crate) fn dev(&self) -> &dyn BlockDevice {
        self.dev.as_ref()
    }

    #[inline]
    pub(crate) fn inodes(&self) -> &InodeTable {
        &self.inodes
    }

    fn flush(&self) {
        let mut buf: SectorBuf = [0; SECTOR_SIZE];
        self.boot.encode(&mut buf);
        sector::write(self.dev(), BootRecord::SECTOR, &buf);
        self.fat.flush(self.dev());
    }
}

impl FatFileSystem {
    /// 创建初始长度为`initial_size`字节、以0填充的文件
    pub fn create_file(
        self: &Arc<Self>,
        cwd: Option<&Dir>,
        path: &str,
        initial_size: usize,
    ) -> Result<()> {
        self.create(cwd, path, initial_size, false)
    }

    pub fn mkdir(self: &Arc<Self>, cwd: Option<&Dir>, path: &str) -> Result<()> {
        self.create(cwd, path, Self::DIR_ENTRIES * DirEntry::SIZE, true)
    }

    /// 打开文件或目录，`/`打开根目录
    pub fn open_file(self: &Arc<Self>, cwd: Option<&Dir>, path: &str) -> Result<File> {
        self.open_inode(cwd, path).map(File::open)
    }

    pub fn open_dir(self: &Arc<Self>, cwd: Option<&Dir>, path: &str) -> Result<Dir> {
        Dir::open(self.open_inode(cwd, path)?)
    }

    /// 把`cwd`换成`path`指向的目录
    pub fn chdir(self: &Arc<Self>, cwd: &mut Option<Dir>, path: &str) -> Result<()> {
        let dir = self.open_dir(cwd.as_ref(), path)?;
        *cwd = Some(dir);
        Ok(())
    }

    /// 删除文件或空目录。
    /// 仍被打开的 inode 要等到最后一次关闭才释放空间。
    pub fn remove_file(self: &Arc<Self>, cwd: Option<&Dir>, path: &str) -> Result<()> {
        let (dir, name) = path::resolve(self, cwd, path)?;
        // 根目录没有文件名
        let name = name.ok_or(Error::InvalidName)?;

        let inode = dir.find(name).ok_or(Error::NotFound)?;
        if inode.is_dir() && !Dir::open(inode)?.is_empty() {
            return Err(Error::DirectoryNotEmpty);
        }

        dir.remove(name)
    }
}

impl FatFileSystem {
    fn open_inode(self: &Arc<Self>, cwd: Option<&Dir>, path: &str) -> Result<Inode> {
        let (dir, name) = path::resolve(self, cwd, path)?;
        match name {
            Some(name) => dir.find(name).ok_or(Error::NotFound),
            None => Ok(dir.inode().reopen()),
        }
    }

    fn create(
        self: &Arc<Self>,
        cwd: Option<&Dir>,
        path: &str,
        length: usize,
        is_dir: bool,
    ) -> Result<()> {
        let (dir, name) = path::resolve(self, cwd, path)?;
        let name = name.ok_or(Error::InvalidName)?;
        if dir.lookup(name).is_some() {
            return Err(Error::AlreadyExists);
        }

        let sector = self.fat.allocate_sector().ok_or(Error::NoSpace)?;
        if let Err(e) = Inode::create(self, sector, length, is_dir) {
            self.fat.release_sector(sector);
            return Err(e);
        }

        if let Err(e) = dir.add(name, sector) {
            // 关闭时连同簇链表一起归还
            let inode = Inode::open(self, sector);
            inode.remove();
            log::debug!("creating {:?} failed: {e}", path.file_name());
            return Err(e);
        }

        Ok(())
    }
}
