//! # 路径解析
//!
//! 路径以`/`分隔，空的分段被忽略，不处理`.`与`..`。

use alloc::sync::Arc;

use crate::{Dir, Error, FatFileSystem, Result};

pub trait Path {
    fn is_absolute(&self) -> bool;

    /// 非空的各个分段
    fn components(&self) -> impl DoubleEndedIterator<Item = &Self>;

    /// 最后一个分段，没有分段时（如`/`）返回`None`
    fn file_name(&self) -> Option<&Self>;

    fn is_relative(&self) -> bool {
        !self.is_absolute()
    }
}

impl Path for str {
    fn is_absolute(&self) -> bool {
        self.starts_with('/')
    }

    fn components(&self) -> impl DoubleEndedIterator<Item = &Self> {
        self.split('/').filter(|cmp| !cmp.is_empty())
    }

    fn file_name(&self) -> Option<&Self> {
        self.components().next_back()
    }
}

/// 解析`path`，返回`(所在目录, 文件名)`。
///
/// 绝对路径从根目录出发；相对路径从`cwd`出发，
/// `cwd`为空或已被删除时退回根目录。
/// 除最后一段外，每段都必须是已存在的目录。空路径视为不存在。
pub fn resolve<'p>(
    fs: &Arc<FatFileSystem>,
    cwd: Option<&Dir>,
    path: &'p str,
) -> Result<(Dir, Option<&'p str>)> {
    if path.is_empty() {
        return Err(Error::NotFound);
    }

    let mut dir = match cwd {
        Some(cwd) if path.is_relative() && !cwd.inode().is_removed() => cwd.reopen(),
        _ => Dir::open_root(fs),
    };

    let mut cmps = path.components();
    let Some(name) = cmps.next_back() else {
        return Ok((dir, None));
    };

    for cmp in cmps {
        let inode = dir.find(cmp).ok_or(Error::NotFound)?;
        if !inode.is_dir() {
            log::debug!("{cmp:?} in {path:?} isn't a directory");
            return Err(Error::NotADirectory);
        }
        // 上一层目录在这里被关闭
        dir = Dir::open(inode)?;
    }

    Ok((dir, Some(name)))
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::Path;

    #[test]
    fn components_skip_empty() {
        let cmps: Vec<_> = "//a/b//c/".components().collect();
        assert_eq!(["a", "b", "c"], cmps.as_slice());
        assert_eq!(0, "/".components().count());
        assert_eq!(0, "".components().count());
    }

    #[test]
    fn file_name() {
        assert_eq!(Some("c"), "/a/b/c".file_name());
        assert_eq!(Some("b"), "a/b/".file_name());
        assert_eq!(None, "///".file_name());
    }

    #[test]
    fn absolute() {
        assert!("/a".is_absolute());
        assert!("a/b".is_relative());
        assert!("".is_relative());
    }
}
