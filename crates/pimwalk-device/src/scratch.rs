//! Scratch heap shared by the tasklets of one accelerator.
//!
//! A bump allocator over a fixed budget. Tasklet 0 resets it once per launch,
//! before the startup barrier; after that every tasklet carves out its own
//! caches. Buffers are word-backed so they can be viewed as any record type
//! the kernels use.

use std::sync::atomic::{AtomicUsize, Ordering};

use bytemuck::Pod;
use pimwalk_common::{DeviceFault, align_up};

const WORD: usize = std::mem::size_of::<u64>();

#[derive(Debug)]
pub struct ScratchHeap {
    capacity: usize,
    used: AtomicUsize,
}

impl ScratchHeap {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, used: AtomicUsize::new(0) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn used(&self) -> usize {
        self.used.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.used.store(0, Ordering::Release);
    }

    /// Reserve `bytes` (rounded up to a word).
    pub fn alloc(&self, bytes: usize) -> Result<ScratchBuffer, DeviceFault> {
        let size = align_up(bytes, WORD);
        let mut used = self.used.load(Ordering::Acquire);
        loop {
            let remaining = self.capacity.saturating_sub(used);
            if size > remaining {
                return Err(DeviceFault::ScratchExhausted { requested: size, remaining });
            }
            match self.used.compare_exchange_weak(used, used + size, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return Ok(ScratchBuffer { words: vec![0; size / WORD] }),
                Err(actual) => used = actual,
            }
        }
    }
}

/// One tasklet's cache, reused across blocks.
#[derive(Debug)]
pub struct ScratchBuffer {
    words: Vec<u64>,
}

impl ScratchBuffer {
    pub fn len(&self) -> usize {
        self.words.len() * WORD
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// First `len` bytes, for DMA.
    pub fn bytes_mut(&mut self, len: usize) -> &mut [u8] {
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut self.words);
        &mut bytes[..len]
    }

    /// First `len` bytes viewed as `T` records.
    pub fn view<T: Pod>(&self, len: usize) -> Result<&[T], DeviceFault> {
        let bytes: &[u8] = bytemuck::cast_slice(&self.words);
        bytemuck::try_cast_slice(&bytes[..len])
            .map_err(|_| DeviceFault::UnalignedAccess { len, ty: std::any::type_name::<T>() })
    }

    pub fn view_mut<T: Pod>(&mut self, len: usize) -> Result<&mut [T], DeviceFault> {
        bytemuck::try_cast_slice_mut(self.bytes_mut(len))
            .map_err(|_| DeviceFault::UnalignedAccess { len, ty: std::any::type_name::<T>() })
    }
}
