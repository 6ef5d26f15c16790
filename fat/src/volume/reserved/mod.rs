//! 保留区：只有启动扇区（0号扇区）

mod boot;

pub use self::boot::BootRecord;
