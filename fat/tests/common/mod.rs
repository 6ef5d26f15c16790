#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use block_dev::{BLOCK_SIZE, BlockDevice};
use fat::FatFileSystem;

/// 内存中的块设备
#[derive(Debug)]
pub struct MemDisk(Mutex<Vec<u8>>);

impl MemDisk {
    pub fn new(blocks: usize) -> Arc<dyn BlockDevice> {
        Arc::new(Self(Mutex::new(vec![0; blocks * BLOCK_SIZE])))
    }
}

impl BlockDevice for MemDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        let disk = self.0.lock().unwrap();
        let start = block_id * BLOCK_SIZE;
        buf.copy_from_slice(&disk[start..start + BLOCK_SIZE]);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        let mut disk = self.0.lock().unwrap();
        let start = block_id * BLOCK_SIZE;
        disk[start..start + BLOCK_SIZE].copy_from_slice(buf);
    }

    fn num_blocks(&self) -> usize {
        self.0.lock().unwrap().len() / BLOCK_SIZE
    }
}

/// 新格式化的文件系统
pub fn formatted(blocks: usize) -> Arc<FatFileSystem> {
    FatFileSystem::format(&MemDisk::new(blocks))
}
