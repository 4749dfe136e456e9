/// Boundary every block header and payload starts on.
pub const HEADER_ALIGN: usize = 16;

/// Rounds `value` up to the next multiple of `boundary`.
///
/// `boundary` must be a power of two. The addition is unchecked, callers that
/// take sizes from the outside world go through [`checked_align`] instead.
///
/// # Examples
///
/// ```rust
/// use ffalloc::align_to;
///
/// assert_eq!(align_to!(13, 8), 16);
/// assert_eq!(align_to!(32, 16), 32);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $boundary:expr) => {
    ($value + $boundary - 1) & !($boundary - 1)
  };
}

/// Rounds `value` up to the heap alignment ([`HEADER_ALIGN`]).
///
/// ```rust
/// use ffalloc::align;
///
/// assert_eq!(align!(1), 16);
/// assert_eq!(align!(17), 32);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, $crate::align::HEADER_ALIGN)
  };
}

/// Same as [`align!`] but returns `None` when rounding would wrap.
pub const fn checked_align(value: usize) -> Option<usize> {
  match value.checked_add(HEADER_ALIGN - 1) {
    Some(padded) => Some(padded & !(HEADER_ALIGN - 1)),
    None => None,
  }
}
