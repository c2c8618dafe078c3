//! Access to the flat linear address space targeted by commands.
//!
//! The executor only ever performs aligned 32-bit loads and stores, via
//! [`MemoryIo`].  Two implementations are provided:
//!
//! - [`VolatileMemory`] - direct volatile access to the target's memory map,
//!   for use on the device itself.
//! - [`RamMemory`] - a bounded window of words held in a plain array, for
//!   hosts, simulators and tests.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use crate::{Error, Result};

/// Trait for 32-bit access to the address space.
pub trait MemoryIo {
    /// Load the word at `addr`
    fn read_u32(&mut self, addr: u32) -> Result<u32>;

    /// Store `value` at `addr`
    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()>;
}

impl<T: MemoryIo + ?Sized> MemoryIo for &mut T {
    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        (**self).read_u32(addr)
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()> {
        (**self).write_u32(addr, value)
    }
}

fn check_aligned(addr: u32) -> Result<()> {
    if addr % 4 != 0 {
        Err(Error::NotAligned)
    } else {
        Ok(())
    }
}

/// Memory-mapped access using volatile loads and stores.
#[derive(Clone, Copy)]
pub struct VolatileMemory;

impl VolatileMemory {
    /// Create a new VolatileMemory instance.
    ///
    /// # Safety
    ///
    /// Every address subsequently passed to [`MemoryIo`] methods must be
    /// valid for 32-bit volatile access on this target.  Commands carry
    /// arbitrary addresses from the host, so the host is trusted.
    // new() rather than default() as it must be const, and unsafe.
    #[allow(clippy::new_without_default)]
    pub const unsafe fn new() -> Self {
        Self {}
    }
}

impl MemoryIo for VolatileMemory {
    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        check_aligned(addr)?;
        Ok(unsafe { core::ptr::read_volatile(addr as usize as *const u32) })
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()> {
        check_aligned(addr)?;
        unsafe { core::ptr::write_volatile(addr as usize as *mut u32, value) };
        Ok(())
    }
}

/// `N` words of RAM appearing at `base` in the address space.
///
/// Accesses outside `base..base + 4 * N` fail with [`Error::OutOfRange`].
#[derive(Debug, Clone)]
pub struct RamMemory<const N: usize> {
    base: u32,
    words: [u32; N],
}

impl<const N: usize> RamMemory<N> {
    /// Zeroed memory with its first word at `base`.  `base` must be
    /// 32-bit aligned for any access to succeed.
    pub const fn new(base: u32) -> Self {
        Self {
            base,
            words: [0; N],
        }
    }

    /// Address of the first word
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Current contents
    pub fn words(&self) -> &[u32; N] {
        &self.words
    }

    fn index(&self, addr: u32) -> Result<usize> {
        check_aligned(addr)?;
        let offset = addr.checked_sub(self.base).ok_or(Error::OutOfRange)? as usize / 4;
        if offset < N {
            Ok(offset)
        } else {
            Err(Error::OutOfRange)
        }
    }
}

impl<const N: usize> MemoryIo for RamMemory<N> {
    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        let idx = self.index(addr)?;
        Ok(self.words[idx])
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()> {
        let idx = self.index(addr)?;
        self.words[idx] = value;
        Ok(())
    }
}
