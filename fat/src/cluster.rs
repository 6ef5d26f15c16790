use core::fmt;

/// 簇编号，也是FAT条目的值。
///
/// 一个簇恰好是一个扇区。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct ClusterId(u32);

impl From<u32> for ClusterId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<ClusterId> for u32 {
    fn from(id: ClusterId) -> Self {
        id.0
    }
}

impl From<ClusterId> for usize {
    fn from(id: ClusterId) -> Self {
        id.0 as usize
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl ClusterId {
    /// 空闲条目；作为起始簇时表示空链表
    pub const FREE: Self = Self(0);

    /// 保留簇，也是下一次适配游标的初始值
    pub const RESERVED: Self = Self(1);

    /// 最小的可用簇号
    pub const MIN: Self = Self(2);

    /// 链表结束
    pub const EOC: Self = Self(0x0FFF_FFFF);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn is_free(self) -> bool {
        self.0 == Self::FREE.0
    }

    #[inline]
    pub const fn is_eoc(self) -> bool {
        self.0 == Self::EOC.0
    }

    #[inline]
    pub(crate) const fn succ(self) -> Self {
        Self(self.0 + 1)
    }
}
