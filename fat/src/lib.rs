//! # 基于FAT的文件系统
//!
//! 自下而上：
//!
//! - 卷布局层（[`volume`]）：启动扇区、FAT区、数据区的磁盘数据结构，
//!   以及内存中的簇链表分配表；
//! - 索引节点层（[`Inode`]）：一个扇区大小的 inode 记录，
//!   按字节偏移读写其簇链表，写越界时自动扩张；
//! - 目录层（[`Dir`]）：内容为定长目录项数组的文件；
//! - 路径层（[`path`]）：把路径逐段交给目录层解析。
//!
//! 写入不是原子的：扩张途中崩溃可能留下已链接但长度未更新的簇链表，
//! 没有日志可供恢复。

#![no_std]

extern crate alloc;

mod cluster;
mod control;
mod dir;
mod error;
mod file;
mod inode;
pub mod path;
mod sector;
pub mod volume;

pub use self::{
    cluster::ClusterId,
    control::FatFileSystem,
    dir::Dir,
    error::{Error, Result},
    file::File,
    inode::Inode,
    sector::{SECTOR_SIZE, SectorBuf, SectorId},
};
