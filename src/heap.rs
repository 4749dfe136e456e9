use std::{
  alloc::{GlobalAlloc, Layout},
  fmt,
  ptr::{self, NonNull},
};

use log::{debug, trace, warn};
use spin::Mutex;

use crate::{
  align::{HEADER_ALIGN, checked_align},
  arena::ProgramBreak,
  block::{HEADER_SIZE, Header},
  config::HeapConfig,
  error::AllocError,
  free_list::FreeList,
};

/// A first-fit heap carved from a single growable arena.
///
/// One lock guards the block list and the break together, so every call
/// mutates heap state atomically with respect to every other call.
/// [`Heap::resize`] and [`Heap::zero_allocate`] are built from separate
/// locked steps and are not atomic as a whole.
///
/// A heap is meant to be built once and live until the process exits;
/// dropping it does not hand the arena back.
pub struct Heap<B> {
  state: Mutex<HeapState<B>>,
  config: HeapConfig,
}

struct HeapState<B> {
  blocks: FreeList,
  brk: B,
}

// The raw block pointers all point into the arena owned by `brk`.
unsafe impl<B: Send> Send for HeapState<B> {}

/// A snapshot of the block list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeapStats {
  pub blocks: usize,
  pub free_blocks: usize,
  /// Headers and payloads of every block, i.e. the arena size.
  pub arena_bytes: usize,
  /// Payload bytes sitting in free blocks.
  pub free_bytes: usize,
}

enum Placement {
  Reused,
  Grown,
}

enum Release {
  Trimmed(usize),
  Kept,
}

impl<B: ProgramBreak> HeapState<B> {
  fn allocate(
    &mut self,
    size: usize,
    payload_size: usize,
    align: usize,
  ) -> Result<(NonNull<u8>, Placement), AllocError> {
    if let Some(block) = self.blocks.find_fit(size, align) {
      unsafe { (*block).is_free = false };
      return Ok((payload_of(block), Placement::Reused));
    }

    // The break is 16-aligned, so `align - 16` spare bytes are always enough
    // to slide the payload onto `align`. Whatever the lead does not use stays
    // in the payload, keeping the block's end on the break.
    let footprint = HEADER_SIZE
      .checked_add(payload_size)
      .and_then(|footprint| footprint.checked_add(align - HEADER_ALIGN))
      .ok_or(AllocError::OutOfMemory)?;
    let start = self.brk.grow(footprint)?;
    let lead = (start as usize + HEADER_SIZE).wrapping_neg() & (align - 1);

    unsafe {
      let block = Header::init(start, lead, footprint - lead - HEADER_SIZE);
      self.blocks.append(block);
      Ok((payload_of(block), Placement::Grown))
    }
  }

  unsafe fn free(
    &mut self,
    block: *mut Header,
  ) -> Release {
    unsafe {
      if block == self.blocks.tail() && Header::end(block) == self.brk.current_break() {
        let footprint = (*block).footprint();
        self.blocks.unlink_tail(block);
        self.brk.shrink(footprint);
        return Release::Trimmed(footprint);
      }

      (*block).is_free = true;
      Release::Kept
    }
  }

  fn stats(&self) -> HeapStats {
    self
      .blocks
      .iter()
      .fold(HeapStats::default(), |mut stats, block| {
        let block = unsafe { &*block };
        stats.blocks += 1;
        stats.arena_bytes += block.footprint();
        if block.is_free {
          stats.free_blocks += 1;
          stats.free_bytes += block.payload_size;
        }
        stats
      })
  }
}

fn payload_of(block: *mut Header) -> NonNull<u8> {
  // A header address is never null, and neither is the address after it.
  unsafe { NonNull::new_unchecked(Header::payload(block)) }
}

impl<B> Heap<B> {
  pub const fn new(
    brk: B,
    config: HeapConfig,
  ) -> Self {
    Self {
      state: Mutex::new(HeapState {
        blocks: FreeList::new(),
        brk,
      }),
      config,
    }
  }
}

impl<B: ProgramBreak> Heap<B> {
  /// Returns a 16-aligned pointer to at least `size` writable bytes.
  ///
  /// The first free block large enough is reused whole. Otherwise the
  /// arena grows by one header plus `size` rounded up to 16.
  pub fn allocate(
    &self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    self.allocate_aligned(size, HEADER_ALIGN)
  }

  /// Like [`Heap::allocate`], with the payload on an `align` boundary.
  ///
  /// `align` must be a power of two; anything up to 16 is served exactly
  /// like [`Heap::allocate`]. A free block is only reused if its payload
  /// already sits on the boundary. A grown block may start with up to
  /// `align - 16` bytes of lead in front of its header.
  pub fn allocate_aligned(
    &self,
    size: usize,
    align: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if size == 0 || !align.is_power_of_two() {
      self.log_failure("allocate", format_args!("{}, {}", size, align), AllocError::InvalidArgument);
      return Err(AllocError::InvalidArgument);
    }
    let align = align.max(HEADER_ALIGN);

    let Some(payload_size) = checked_align(size) else {
      self.log_failure("allocate", format_args!("{}, {}", size, align), AllocError::OutOfMemory);
      return Err(AllocError::OutOfMemory);
    };

    let outcome = self.state.lock().allocate(size, payload_size, align);

    match outcome {
      Ok((payload, placement)) => {
        if self.config.log_events {
          match placement {
            Placement::Reused => trace!("[ffalloc] allocate({}, {}) -> {:p} reused", size, align, payload),
            Placement::Grown => trace!("[ffalloc] allocate({}, {}) -> {:p} grown", size, align, payload),
          }
        }
        Ok(payload)
      }
      Err(error) => {
        self.log_failure("allocate", format_args!("{}, {}", size, align), error);
        Err(error)
      }
    }
  }

  /// Releases a block.
  ///
  /// The tail block goes back to the break source; any other block is
  /// flagged free and stays where it is for a later [`Heap::allocate`].
  /// Null is ignored.
  ///
  /// # Safety
  ///
  /// `address` must be null or a pointer returned by this heap that has
  /// not been freed yet, and it must not be freed or resized from another
  /// thread at the same time.
  pub unsafe fn free(
    &self,
    address: *mut u8,
  ) {
    if address.is_null() {
      return;
    }

    let release = unsafe {
      let block = Header::from_payload(address);
      self.state.lock().free(block)
    };

    if self.config.log_events {
      match release {
        Release::Trimmed(bytes) => debug!("[ffalloc] free({:p}) trimmed {} bytes", address, bytes),
        Release::Kept => trace!("[ffalloc] free({:p}) kept", address),
      }
    }
  }

  /// Allocates `count * element_size` bytes and zeroes them.
  pub fn zero_allocate(
    &self,
    count: usize,
    element_size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if count == 0 || element_size == 0 {
      self.log_failure(
        "zero_allocate",
        format_args!("{}, {}", count, element_size),
        AllocError::InvalidArgument,
      );
      return Err(AllocError::InvalidArgument);
    }

    let Some(size) = count.checked_mul(element_size) else {
      self.log_failure(
        "zero_allocate",
        format_args!("{}, {}", count, element_size),
        AllocError::Overflow,
      );
      return Err(AllocError::Overflow);
    };

    let payload = self.allocate(size)?;
    zero_payload(payload);
    Ok(payload)
  }

  /// Grows a block, preserving its contents.
  ///
  /// A null `address` or a zero `new_size` behaves exactly like
  /// [`Heap::allocate`]; in particular resizing to zero fails and does not
  /// free anything. A block that already holds `new_size` bytes is returned
  /// untouched. Otherwise the contents move to a new block and the old one
  /// is freed. If that new allocation fails the old block stays valid.
  ///
  /// # Safety
  ///
  /// Same contract as [`Heap::free`].
  pub unsafe fn resize(
    &self,
    address: *mut u8,
    new_size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    unsafe { self.relocate(address, new_size, HEADER_ALIGN) }
  }

  /// [`Heap::resize`] for a block that has to stay on `align`.
  unsafe fn relocate(
    &self,
    address: *mut u8,
    new_size: usize,
    align: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let Some(current) = NonNull::new(address) else {
      return self.allocate_aligned(new_size, align);
    };
    if new_size == 0 {
      return self.allocate_aligned(new_size, align);
    }

    let old_size = {
      let _guard = self.state.lock();
      unsafe { (*Header::from_payload(address)).payload_size }
    };

    if old_size >= new_size {
      return Ok(current);
    }

    let moved = self.allocate_aligned(new_size, align)?;

    unsafe {
      ptr::copy_nonoverlapping(address, moved.as_ptr(), old_size);
      self.free(address);
    }

    if self.config.log_events {
      trace!("[ffalloc] resize({:p}, {}) -> {:p}", address, new_size, moved);
    }

    Ok(moved)
  }

  pub fn stats(&self) -> HeapStats {
    self.state.lock().stats()
  }

  pub fn program_break(&self) -> *mut u8 {
    self.state.lock().brk.current_break()
  }

  /// Runs `f` against the break source while holding the heap lock.
  pub fn with_break<R>(
    &self,
    f: impl FnOnce(&B) -> R,
  ) -> R {
    f(&self.state.lock().brk)
  }

  fn log_failure(
    &self,
    operation: &str,
    arguments: fmt::Arguments<'_>,
    error: AllocError,
  ) {
    if self.config.log_events {
      warn!("[ffalloc] {}({}) failed: {}", operation, arguments, error);
    }
  }
}

/// Zeroes every payload byte of a block the caller just received.
fn zero_payload(payload: NonNull<u8>) {
  // The block is exclusively ours and its size never changes.
  unsafe {
    let payload_size = (*Header::from_payload(payload.as_ptr())).payload_size;
    ptr::write_bytes(payload.as_ptr(), 0, payload_size);
  }
}

unsafe impl<B: ProgramBreak + Send> GlobalAlloc for Heap<B> {
  unsafe fn alloc(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    self
      .allocate_aligned(layout.size(), layout.align())
      .map_or(ptr::null_mut(), NonNull::as_ptr)
  }

  unsafe fn dealloc(
    &self,
    address: *mut u8,
    _layout: Layout,
  ) {
    unsafe { self.free(address) }
  }

  unsafe fn alloc_zeroed(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    match self.allocate_aligned(layout.size(), layout.align()) {
      Ok(payload) => {
        zero_payload(payload);
        payload.as_ptr()
      }
      Err(_) => ptr::null_mut(),
    }
  }

  unsafe fn realloc(
    &self,
    address: *mut u8,
    layout: Layout,
    new_size: usize,
  ) -> *mut u8 {
    unsafe { self.relocate(address, new_size, layout.align()) }.map_or(ptr::null_mut(), NonNull::as_ptr)
  }
}
