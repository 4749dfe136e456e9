use std::{mem, ptr};

use crate::align::HEADER_ALIGN;

/// Metadata placed immediately in front of every payload.
///
/// The alignment keeps the payload that follows on a 16-byte boundary no
/// matter what was requested. Blocks grown for a stricter alignment start
/// `lead` bytes before their header; those bytes belong to the block and go
/// back to the break with it.
#[repr(C, align(16))]
pub struct Header {
  pub payload_size: usize,
  pub is_free: bool,
  pub next: *mut Header,
  pub lead: usize,
}

pub const HEADER_SIZE: usize = mem::size_of::<Header>();

const _: () = assert!(HEADER_SIZE % HEADER_ALIGN == 0);

impl Header {
  pub fn new(
    lead: usize,
    payload_size: usize,
  ) -> Self {
    Self {
      payload_size,
      is_free: false,
      next: ptr::null_mut(),
      lead,
    }
  }

  /// Writes a fresh in-use header `lead` bytes past `start` and returns it.
  ///
  /// # Safety
  ///
  /// `start` must be 16-aligned, `lead` a multiple of 16, and the region
  /// must be valid for `lead + HEADER_SIZE + payload_size` bytes of writes.
  pub unsafe fn init(
    start: *mut u8,
    lead: usize,
    payload_size: usize,
  ) -> *mut Header {
    unsafe {
      let header = start.add(lead) as *mut Header;
      header.write(Header::new(lead, payload_size));
      header
    }
  }

  /// Recovers the header sitting right before `payload`.
  ///
  /// # Safety
  ///
  /// `payload` must come from [`Header::payload`] on a live header.
  pub unsafe fn from_payload(payload: *mut u8) -> *mut Header {
    unsafe { payload.sub(HEADER_SIZE) as *mut Header }
  }

  pub fn payload(header: *mut Header) -> *mut u8 {
    (header as *mut u8).wrapping_add(HEADER_SIZE)
  }

  /// First address past the payload.
  ///
  /// # Safety
  ///
  /// `header` must point to an initialized header.
  pub unsafe fn end(header: *mut Header) -> *mut u8 {
    unsafe { Header::payload(header).wrapping_add((*header).payload_size) }
  }

  /// Bytes this block occupies in the arena, lead and header included.
  pub fn footprint(&self) -> usize {
    self.lead + HEADER_SIZE + self.payload_size
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[repr(C, align(16))]
  struct Backing([u8; 256]);

  #[test]
  fn test_header_layout() {
    assert_eq!(mem::align_of::<Header>(), HEADER_ALIGN);
    assert_eq!(HEADER_SIZE % HEADER_ALIGN, 0);
    assert!(HEADER_SIZE >= mem::size_of::<usize>() * 3 + 1);
  }

  #[test]
  fn test_payload_round_trip() {
    let mut backing = Backing([0; 256]);
    let base = backing.0.as_mut_ptr();

    unsafe {
      let header = Header::init(base, 0, 64);
      let payload = Header::payload(header);

      assert_eq!(payload as usize - base as usize, HEADER_SIZE);
      assert_eq!(payload as usize % HEADER_ALIGN, 0);
      assert_eq!(Header::from_payload(payload), header);
      assert_eq!(Header::end(header), payload.add(64));
      assert_eq!((*header).footprint(), HEADER_SIZE + 64);
      assert!(!(*header).is_free);
      assert!((*header).next.is_null());
    }
  }

  #[test]
  fn test_lead_counts_towards_footprint() {
    let mut backing = Backing([0; 256]);
    let base = backing.0.as_mut_ptr();

    unsafe {
      let header = Header::init(base, 32, 48);

      assert_eq!(header as *mut u8, base.add(32));
      assert_eq!(Header::payload(header), base.add(32 + HEADER_SIZE));
      assert_eq!((*header).footprint(), 32 + HEADER_SIZE + 48);
      assert_eq!(Header::end(header), base.add((*header).footprint()));
    }
  }
}
