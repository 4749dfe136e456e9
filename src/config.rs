/// Knobs fixed when a [`Heap`](crate::Heap) is constructed.
///
/// Everything here is `const`, so a heap living in a `static` can be
/// configured without running code before `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeapConfig {
  /// Emit `log` records for allocations, frees and failures.
  ///
  /// Leave this off for a heap that backs the global allocator unless the
  /// installed logger never allocates: the records are emitted outside the
  /// heap lock, so an allocating logger would re-enter the heap for every
  /// record it writes.
  pub log_events: bool,
}

impl HeapConfig {
  pub const fn new() -> Self {
    Self { log_events: false }
  }

  pub const fn with_log_events(
    mut self,
    log_events: bool,
  ) -> Self {
    self.log_events = log_events;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_is_quiet() {
    assert_eq!(HeapConfig::default(), HeapConfig::new());
    assert!(!HeapConfig::new().log_events);
    assert!(HeapConfig::new().with_log_events(true).log_events);
  }
}
