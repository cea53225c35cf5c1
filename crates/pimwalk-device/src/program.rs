//! Program image: the binary loaded onto every accelerator of a set.
//!
//! Layout (little endian):
//!
//! | bytes | field |
//! |-------|-------|
//! | 4 | magic `PIMW` |
//! | 4 | format version |
//! | 4 | tasklets per accelerator |
//! | 4 | kernel count `n` |
//! | 4 × n | kernel ids in dispatch-table order |

use std::path::Path;

use pimwalk_common::{KernelId, LoadError};

use crate::dispatch::KERNEL_TABLE;

pub const MAGIC: [u8; 4] = *b"PIMW";
pub const VERSION: u32 = 1;
const HEADER_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    pub nr_tasklets: u32,
    pub kernels: Vec<KernelId>,
}

impl ProgramImage {
    /// Image carrying this build's full dispatch table.
    pub fn for_device(nr_tasklets: usize) -> Self {
        Self { nr_tasklets: nr_tasklets as u32, kernels: KERNEL_TABLE.to_vec() }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + 4 * self.kernels.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&self.nr_tasklets.to_le_bytes());
        out.extend_from_slice(&(self.kernels.len() as u32).to_le_bytes());
        for kernel in &self.kernels {
            out.extend_from_slice(&kernel.index().to_le_bytes());
        }
        out
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, LoadError> {
        let word = |at: usize| -> Result<u32, LoadError> {
            bytes
                .get(at..at + 4)
                .and_then(|b| b.try_into().ok())
                .map(u32::from_le_bytes)
                .ok_or(LoadError::Truncated { expected: at + 4, actual: bytes.len() })
        };

        if bytes.len() < HEADER_LEN {
            return Err(LoadError::Truncated { expected: HEADER_LEN, actual: bytes.len() });
        }
        let mut found = [0u8; 4];
        found.copy_from_slice(&bytes[..4]);
        if found != MAGIC {
            return Err(LoadError::BadMagic { found });
        }
        let version = word(4)?;
        if version != VERSION {
            return Err(LoadError::UnsupportedVersion(version));
        }
        let nr_tasklets = word(8)?;
        let nr_kernels = word(12)? as usize;
        if nr_kernels == 0 {
            return Err(LoadError::EmptyKernelTable);
        }
        let expected = HEADER_LEN + 4 * nr_kernels;
        if bytes.len() < expected {
            return Err(LoadError::Truncated { expected, actual: bytes.len() });
        }
        let kernels = (0..nr_kernels)
            .map(|slot| {
                let id = word(HEADER_LEN + 4 * slot)?;
                KernelId::try_from(id).map_err(|_| LoadError::UnknownKernel { slot, id })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { nr_tasklets, kernels })
    }

    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        Self::parse(&std::fs::read(path)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), LoadError> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }

    /// Reject images built for a different tasklet count or dispatch table.
    pub fn check_compatible(&self, nr_tasklets: usize) -> Result<(), LoadError> {
        if self.nr_tasklets as usize != nr_tasklets {
            return Err(LoadError::TaskletMismatch { image: self.nr_tasklets, device: nr_tasklets });
        }
        for slot in 0..self.kernels.len().max(KERNEL_TABLE.len()) {
            let expected = KERNEL_TABLE.get(slot);
            let found = self.kernels.get(slot);
            if expected != found {
                let show = |k: Option<&KernelId>| k.map_or_else(|| "nothing".to_string(), KernelId::to_string);
                return Err(LoadError::KernelTableMismatch { slot, expected: show(expected), found: show(found) });
            }
        }
        Ok(())
    }
}
