//! 卷的布局
//!
//! 启动扇区 | FAT区 | 数据区（根目录 inode 位于数据区首个扇区）

pub mod data;
pub mod fat;
pub mod reserved;

