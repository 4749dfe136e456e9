//! Sources of arena memory.
//!
//! ```text
//!   arena base                                    program break
//!   ▼                                                         ▼
//!   ┌────────┬─────────┬────────┬──────────────┬────────┬─────┐
//!   │ header │ payload │ header │   payload    │ header │ ... │
//!   └────────┴─────────┴────────┴──────────────┴────────┴─────┘
//!                                                  grow(n) ──▶
//!                                             ◀── shrink(n)
//! ```
//!
//! A heap only moves its break from inside its lock, so implementations
//! take `&mut self` and need no synchronization of their own.

use std::{
  alloc::{self, Layout},
  ptr::NonNull,
};

use libc::{c_void, intptr_t, sbrk};

use crate::{align::HEADER_ALIGN, error::AllocError};

/// A movable end-of-arena pointer.
pub trait ProgramBreak {
  /// Moves the break up by `n` bytes and returns where it was before.
  ///
  /// The returned address is 16-aligned. On failure the break is left
  /// exactly where it was.
  fn grow(
    &mut self,
    n: usize,
  ) -> Result<*mut u8, AllocError>;

  /// Moves the break down by `n` bytes.
  ///
  /// # Safety
  ///
  /// The last `n` bytes below the break must have been obtained through
  /// `grow` and nothing may reference them anymore.
  unsafe fn shrink(
    &mut self,
    n: usize,
  );

  fn current_break(&self) -> *mut u8;
}

/// The process program break, moved with `sbrk(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sbrk;

fn sbrk_failed(address: *mut c_void) -> bool {
  address == usize::MAX as *mut c_void
}

impl ProgramBreak for Sbrk {
  fn grow(
    &mut self,
    n: usize,
  ) -> Result<*mut u8, AllocError> {
    unsafe {
      let current = sbrk(0);
      if sbrk_failed(current) {
        return Err(AllocError::OutOfMemory);
      }

      // Whoever moved the break before us may have left it unaligned. The
      // padding is skipped and never becomes part of a block.
      let pad = (current as usize).wrapping_neg() & (HEADER_ALIGN - 1);
      let total = n
        .checked_add(pad)
        .filter(|total| *total <= isize::MAX as usize)
        .ok_or(AllocError::OutOfMemory)?;

      let previous = sbrk(total as intptr_t);
      if sbrk_failed(previous) {
        return Err(AllocError::OutOfMemory);
      }

      Ok((previous as *mut u8).add(pad))
    }
  }

  unsafe fn shrink(
    &mut self,
    n: usize,
  ) {
    unsafe {
      sbrk(-(n as intptr_t));
    }
  }

  fn current_break(&self) -> *mut u8 {
    unsafe { sbrk(0) as *mut u8 }
  }
}

/// A simulated program break over a fixed-size region.
///
/// The region is reserved once up front. Growing past its capacity fails
/// with [`AllocError::OutOfMemory`], the same way `sbrk` fails when the
/// data segment limit is hit.
#[derive(Debug)]
pub struct FixedArena {
  base: NonNull<u8>,
  layout: Layout,
  used: usize,
}

// The region is owned exclusively by the arena.
unsafe impl Send for FixedArena {}

impl FixedArena {
  pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
    let layout = Layout::from_size_align(capacity.max(HEADER_ALIGN), HEADER_ALIGN)
      .map_err(|_| AllocError::OutOfMemory)?;

    let base = NonNull::new(unsafe { alloc::alloc(layout) }).ok_or(AllocError::OutOfMemory)?;

    Ok(Self {
      base,
      layout,
      used: 0,
    })
  }

  pub fn base(&self) -> *mut u8 {
    self.base.as_ptr()
  }

  pub fn capacity(&self) -> usize {
    self.layout.size()
  }

  /// Bytes currently between the base and the break.
  pub fn used(&self) -> usize {
    self.used
  }
}

impl ProgramBreak for FixedArena {
  fn grow(
    &mut self,
    n: usize,
  ) -> Result<*mut u8, AllocError> {
    let remaining = self.capacity() - self.used;
    if n > remaining {
      return Err(AllocError::OutOfMemory);
    }

    let previous = self.current_break();
    self.used += n;
    Ok(previous)
  }

  unsafe fn shrink(
    &mut self,
    n: usize,
  ) {
    debug_assert!(n <= self.used);
    self.used -= n;
  }

  fn current_break(&self) -> *mut u8 {
    self.base.as_ptr().wrapping_add(self.used)
  }
}

impl Drop for FixedArena {
  fn drop(&mut self) {
    unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) };
  }
}
