use derive_more::Display;

/// 可恢复的失败。
///
/// 越界的簇编号、损坏的 inode 魔数这类不变式被破坏的情况不在此列，
/// 它们直接`panic`，继续运行只会进一步破坏分配表。
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// 没有空闲簇
    #[display(fmt = "no space left on device")]
    NoSpace,
    #[display(fmt = "no such file or directory")]
    NotFound,
    #[display(fmt = "file exists")]
    AlreadyExists,
    #[display(fmt = "not a directory")]
    NotADirectory,
    #[display(fmt = "is a directory")]
    IsADirectory,
    #[display(fmt = "directory not empty")]
    DirectoryNotEmpty,
    /// 名称为空、过长，或者路径没有最后一段
    #[display(fmt = "invalid file name")]
    InvalidName,
}

pub type Result<T> = core::result::Result<T, Error>;
