use alloc::vec;
use alloc::vec::Vec;

use block_dev::BlockDevice;
use spin::Mutex;

use crate::sector::{self, SECTOR_SIZE, SectorBuf};
use crate::volume::reserved::BootRecord;
use crate::{ClusterId, SectorId};

/// 文件分配表。
///
/// 整张表在挂载时读入内存，卸载时写回；
/// 每次访问都要经过同一把锁。
#[derive(Debug)]
pub struct FatArea {
    /// FAT区的起始扇区
    start: SectorId,
    /// FAT区的扇区数
    sectors: usize,
    /// 数据区的起始扇区
    data_area: SectorId,
    inner: Mutex<FatTable>,
}

#[derive(Debug)]
struct FatTable {
    entries: Vec<ClusterId>,
    /// 最近分配的簇，下一次适配从它的后一个开始
    last_alloc: ClusterId,
    /// 可分配簇编号的上界（不含），不超过数据区的实际大小
    limit: usize,
}

impl FatArea {
    /// 全部条目为空闲的新表
    pub fn new(boot: &BootRecord) -> Self {
        let entries = boot.fat_entries();
        let limit = entries.min(boot.data_sectors() + usize::from(ClusterId::MIN));

        Self {
            start: boot.fat_area(),
            sectors: boot.fat_sectors(),
            data_area: boot.data_area(),
            inner: Mutex::new(FatTable {
                entries: vec![ClusterId::FREE; entries],
                last_alloc: ClusterId::RESERVED,
                limit,
            }),
        }
    }

    /// 从设备读入整张表
    pub fn load(&self, dev: &dyn BlockDevice) {
        let mut table = self.inner.lock();
        let mut buf: SectorBuf = [0; SECTOR_SIZE];

        for (i, chunk) in table
            .entries
            .chunks_mut(BootRecord::ENTRIES_PER_SECTOR)
            .enumerate()
        {
            sector::read(dev, self.start + i, &mut buf);
            for (entry, bytes) in chunk.iter_mut().zip(buf.chunks_exact(size_of::<u32>())) {
                *entry = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]).into();
            }
        }
        table.last_alloc = ClusterId::RESERVED;

        log::debug!(
            "FAT loaded: {} sectors, {} free clusters",
            self.sectors,
            table.free_count()
        );
    }

    /// 把整张表写回设备
    pub fn flush(&self, dev: &dyn BlockDevice) {
        let table = self.inner.lock();
        let mut buf: SectorBuf = [0; SECTOR_SIZE];

        for (i, chunk) in table
            .entries
            .chunks(BootRecord::ENTRIES_PER_SECTOR)
            .enumerate()
        {
            buf.fill(0);
            for (bytes, &entry) in buf.chunks_exact_mut(size_of::<u32>()).zip(chunk) {
                bytes.copy_from_slice(&u32::from(entry).to_le_bytes());
            }
            sector::write(dev, self.start + i, &buf);
        }
    }

    /// 分配一个簇，并在`prev`所在链表的末尾链接它。
    /// `prev`为空时新建一条链表。
    ///
    /// 若没有空闲簇，则返回空；
    /// 传入链表尾部可免去遍历。
    pub fn create_chain(&self, prev: Option<ClusterId>) -> Option<ClusterId> {
        let mut table = self.inner.lock();

        let new = table.find_free()?;
        table.put(new, ClusterId::EOC);
        table.last_alloc = new;

        if let Some(mut tail) = prev {
            loop {
                let next = table.get(tail);
                if next.is_eoc() {
                    break;
                }
                tail = next;
            }
            table.put(tail, new);
        }

        log::trace!("allocated cluster {new} after {prev:?}");
        Some(new)
    }

    /// 移除从`start`开始的整个簇链表。
    /// 若`prev`非空，它会先成为新的链表尾。
    pub fn remove_chain(&self, start: ClusterId, prev: Option<ClusterId>) {
        let mut table = self.inner.lock();

        if let Some(prev) = prev {
            table.put(prev, ClusterId::EOC);
        }

        let mut id = start;
        loop {
            let next = table.get(id);
            table.put(id, ClusterId::FREE);
            if table.last_alloc == id {
                table.last_alloc = ClusterId::RESERVED;
            }
            if next.is_eoc() {
                break;
            }
            assert!(!next.is_free(), "chain broken after cluster {id}");
            id = next;
        }

        log::trace!("removed chain from {start}");
    }

    /// 一次分配`count`个簇组成的链表，返回其首个簇。
    /// 中途耗尽时，已分配的部分会被归还。
    pub fn allocate(&self, count: usize) -> Option<ClusterId> {
        let mut head = None;
        let mut tail = None;

        for _ in 0..count {
            let Some(new) = self.create_chain(tail) else {
                if let Some(head) = head {
                    self.remove_chain(head, None);
                }
                return None;
            };
            head.get_or_insert(new);
            tail = Some(new);
        }

        head
    }

    /// 分配单个簇，返回其扇区。用来存放 inode 记录。
    #[inline]
    pub fn allocate_sector(&self) -> Option<SectorId> {
        self.create_chain(None).map(|id| self.cluster_to_sector(id))
    }

    /// 归还[`FatArea::allocate_sector`]得到的扇区
    #[inline]
    pub fn release_sector(&self, sector: SectorId) {
        self.remove_chain(self.sector_to_cluster(sector), None);
    }

    /// 获取下一个簇编号。
    /// `None`表示`id`为链表上最后一个簇。
    pub fn next(&self, id: ClusterId) -> Option<ClusterId> {
        let next = self.get(id);
        (!next.is_eoc()).then_some(next)
    }

    /// 从`start`出发，沿链表前进`steps`步。
    /// 链表提前结束时返回空。
    pub fn walk(&self, start: ClusterId, steps: usize) -> Option<ClusterId> {
        let table = self.inner.lock();

        let mut id = start;
        for _ in 0..steps {
            let next = table.get(id);
            if next.is_eoc() {
                return None;
            }
            id = next;
        }
        Some(id)
    }

    /// 链表的最后一个簇
    pub fn last(&self, start: ClusterId) -> ClusterId {
        let table = self.inner.lock();

        let mut id = start;
        loop {
            let next = table.get(id);
            if next.is_eoc() {
                return id;
            }
            id = next;
        }
    }

    #[inline]
    pub fn get(&self, id: ClusterId) -> ClusterId {
        self.inner.lock().get(id)
    }

    #[inline]
    pub fn put(&self, id: ClusterId, value: ClusterId) {
        self.inner.lock().put(id, value);
    }

    /// 返回簇编号指向的扇区
    ///
    /// 数据区不占有`ClusterId::MIN`前面的簇，所以需要转换计算得到扇区。
    pub fn cluster_to_sector(&self, id: ClusterId) -> SectorId {
        assert!(id >= ClusterId::MIN, "cluster {id} has no sector");
        self.data_area + (usize::from(id) - usize::from(ClusterId::MIN))
    }

    pub fn sector_to_cluster(&self, sector: SectorId) -> ClusterId {
        assert!(sector >= self.data_area, "sector {sector} is outside the data area");
        let index = sector.raw() - self.data_area.raw() + usize::from(ClusterId::MIN);
        ClusterId::new(index as u32)
    }

    /// 空闲的可分配簇个数
    pub fn free_clusters(&self) -> usize {
        self.inner.lock().free_count()
    }

    /// 可分配簇的总数
    pub fn usable_clusters(&self) -> usize {
        let table = self.inner.lock();
        table.limit.saturating_sub(usize::from(ClusterId::MIN))
    }

    /// 表的条目数
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub const fn data_area(&self) -> SectorId {
        self.data_area
    }
}

impl FatTable {
    fn get(&self, id: ClusterId) -> ClusterId {
        self.entries[self.index(id)]
    }

    fn put(&mut self, id: ClusterId, value: ClusterId) {
        let index = self.index(id);
        self.entries[index] = value;
    }

    fn index(&self, id: ClusterId) -> usize {
        let index = usize::from(id);
        assert!(
            id >= ClusterId::MIN && index < self.entries.len(),
            "cluster {id} is out of the FAT (len {})",
            self.entries.len()
        );
        index
    }

    /// 下一次适配：从最近分配的簇之后开始，
    /// 到达上界后绕回首个可用簇，至多检查每个可用簇一次。
    fn find_free(&self) -> Option<ClusterId> {
        let min = usize::from(ClusterId::MIN);
        if self.limit <= min {
            return None;
        }
        let span = self.limit - min;
        let first = usize::from(self.last_alloc.succ()).max(min);

        (0..span)
            .map(|i| min + (first - min + i) % span)
            .find(|&index| self.entries[index].is_free())
            .map(|index| ClusterId::new(index as u32))
    }

    fn free_count(&self) -> usize {
        let min = usize::from(ClusterId::MIN);
        self.entries
            .get(min..self.limit)
            .map_or(0, |usable| usable.iter().filter(|id| id.is_free()).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(total: usize) -> FatArea {
        FatArea::new(&BootRecord::new(total))
    }

    #[test]
    fn next_fit_wraps() {
        let fat = area(64);
        let a = fat.create_chain(None).unwrap();
        let b = fat.create_chain(None).unwrap();
        assert_eq!(ClusterId::MIN, a);
        assert_eq!(ClusterId::new(3), b);

        // 释放前面的簇后，游标仍从后面继续
        fat.remove_chain(a, None);
        let c = fat.create_chain(None).unwrap();
        assert_eq!(ClusterId::new(4), c);
    }

    #[test]
    fn extend_links_after_tail() {
        let fat = area(64);
        let head = fat.create_chain(None).unwrap();
        let second = fat.create_chain(Some(head)).unwrap();
        // 传入链表头也会被遍历到尾部
        let third = fat.create_chain(Some(head)).unwrap();

        assert_eq!(Some(second), fat.next(head));
        assert_eq!(Some(third), fat.next(second));
        assert_eq!(None, fat.next(third));
        assert_eq!(third, fat.last(head));
        assert_eq!(Some(third), fat.walk(head, 2));
        assert_eq!(None, fat.walk(head, 3));
    }

    #[test]
    fn truncate_with_prev() {
        let fat = area(64);
        let head = fat.allocate(4).unwrap();
        let second = fat.next(head).unwrap();
        let third = fat.next(second).unwrap();

        fat.remove_chain(third, Some(second));
        assert_eq!(None, fat.next(second));
        assert!(fat.get(third).is_free());
        assert_eq!(fat.usable_clusters() - 2, fat.free_clusters());
    }

    #[test]
    fn cursor_never_points_at_freed() {
        let fat = area(64);
        let head = fat.allocate(3).unwrap();
        let tail = fat.last(head);
        assert_eq!(tail, fat.inner.lock().last_alloc);

        fat.remove_chain(head, None);
        assert_eq!(ClusterId::RESERVED, fat.inner.lock().last_alloc);
        assert_eq!(Some(ClusterId::MIN), fat.create_chain(None));
    }

    #[test]
    #[should_panic]
    fn reserved_cluster_is_out_of_range() {
        area(64).get(ClusterId::RESERVED);
    }

    #[test]
    #[should_panic]
    fn index_past_table_panics() {
        let fat = area(64);
        let len = fat.len() as u32;
        fat.put(ClusterId::new(len), ClusterId::EOC);
    }
}
