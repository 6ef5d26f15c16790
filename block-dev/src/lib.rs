//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、U盘、镜像文件等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 文件系统只通过块设备驱动读写设备，每次恰好一块，不做缓存。

#![no_std]

use core::any::Any;
use core::fmt::Debug;

/// 块的字节数，也是扇区的字节数
pub const BLOCK_SIZE: usize = 512;

/// 块设备驱动特质
pub trait BlockDevice: Send + Sync + Any + Debug {
    /// 读出第`block_id`块，`buf`的长度必须为[`BLOCK_SIZE`]
    fn read_block(&self, block_id: usize, buf: &mut [u8]);

    /// 写入第`block_id`块，`buf`的长度必须为[`BLOCK_SIZE`]
    fn write_block(&self, block_id: usize, buf: &[u8]);

    /// 设备的总块数
    fn num_blocks(&self) -> usize;
}
