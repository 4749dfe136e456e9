use thiserror::Error;

/// Failures the heap can detect and report.
///
/// Passing a pointer this heap never handed out (or one already freed) is
/// not in here: it is undefined behavior under the `unsafe` contracts of
/// [`Heap::free`](crate::Heap::free) and [`Heap::resize`](crate::Heap::resize)
/// and is never checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
  #[error("zero-sized request")]
  InvalidArgument,
  #[error("element count times element size overflows usize")]
  Overflow,
  #[error("the program break could not be extended")]
  OutOfMemory,
}

impl AllocError {
  /// The `errno` value a libc routine reports for this failure.
  pub fn errno(self) -> libc::c_int {
    match self {
      AllocError::InvalidArgument => libc::EINVAL,
      AllocError::Overflow | AllocError::OutOfMemory => libc::ENOMEM,
    }
  }
}
