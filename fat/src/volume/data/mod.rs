//! 数据区，使用**簇编号**索引。
//!
//! 因为FAT条目存放着下一个簇的编号，
//! 其中`0`表示簇未分配，`1`保留，
//! 所以数据区第一个可用的簇编号为2，它也是根目录 inode 所在的簇。
//!
//! 数据区的扇区要么存放 inode 记录，要么存放文件内容；
//! 目录的内容是一串紧密排列的 [`DirEntry`]。

mod dir_entry;
mod inode;

pub use self::{
    dir_entry::{DirEntry, NAME_MAX},
    inode::{DiskInode, InodeFlag},
};
