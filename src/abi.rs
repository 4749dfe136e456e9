//! C entry points over the process heap.
//!
//! These mirror `malloc`, `free`, `calloc` and `realloc`: failures come back
//! as a null pointer with `errno` set. The names carry an `ffalloc_` prefix
//! so linking this crate never interposes the system allocator.

use std::ptr::{self, NonNull};

use libc::c_void;

use crate::{arena::Sbrk, config::HeapConfig, error::AllocError, heap::Heap};

static PROCESS_HEAP: Heap<Sbrk> = Heap::new(Sbrk, HeapConfig::new());

/// The heap behind the C entry points, growing the real program break.
pub fn process_heap() -> &'static Heap<Sbrk> {
  &PROCESS_HEAP
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn set_errno(value: libc::c_int) {
  unsafe { *libc::__errno_location() = value };
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
fn set_errno(value: libc::c_int) {
  unsafe { *libc::__error() = value };
}

#[cfg(not(any(
  target_os = "linux",
  target_os = "android",
  target_os = "macos",
  target_os = "ios",
  target_os = "freebsd"
)))]
fn set_errno(_value: libc::c_int) {}

fn into_raw(result: Result<NonNull<u8>, AllocError>) -> *mut c_void {
  match result {
    Ok(payload) => payload.as_ptr().cast(),
    Err(error) => {
      set_errno(error.errno());
      ptr::null_mut()
    }
  }
}

/// Allocates `size` bytes, or returns null.
#[unsafe(no_mangle)]
pub extern "C" fn ffalloc_malloc(size: usize) -> *mut c_void {
  into_raw(PROCESS_HEAP.allocate(size))
}

/// Releases a pointer from this family. Null is ignored.
///
/// # Safety
///
/// `pointer` must be null or come from `ffalloc_malloc`, `ffalloc_calloc`
/// or `ffalloc_realloc` and not have been freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ffalloc_free(pointer: *mut c_void) {
  unsafe { PROCESS_HEAP.free(pointer.cast()) }
}

/// Allocates `count * size` zeroed bytes, or returns null.
#[unsafe(no_mangle)]
pub extern "C" fn ffalloc_calloc(
  count: usize,
  size: usize,
) -> *mut c_void {
  into_raw(PROCESS_HEAP.zero_allocate(count, size))
}

/// Grows a block to `size` bytes, or returns null and leaves it intact.
///
/// # Safety
///
/// Same contract as [`ffalloc_free`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ffalloc_realloc(
  pointer: *mut c_void,
  size: usize,
) -> *mut c_void {
  into_raw(unsafe { PROCESS_HEAP.resize(pointer.cast(), size) })
}
