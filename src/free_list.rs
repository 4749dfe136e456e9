use std::{marker::PhantomData, ptr};

use crate::block::Header;

/// Every block of the arena, linked in address order.
///
/// The list never reorders: a new block is always created at the break, so
/// appending keeps `head..=tail` ascending, and `tail` is the block that
/// touches the break.
pub struct FreeList {
  head: *mut Header,
  tail: *mut Header,
}

impl FreeList {
  pub const fn new() -> Self {
    Self {
      head: ptr::null_mut(),
      tail: ptr::null_mut(),
    }
  }

  pub fn tail(&self) -> *mut Header {
    self.tail
  }

  /// First free block holding at least `size` payload bytes whose payload
  /// starts on an `align` boundary.
  ///
  /// The block is returned whole; any excess stays with it.
  pub fn find_fit(
    &self,
    size: usize,
    align: usize,
  ) -> Option<*mut Header> {
    self.iter().find(|&block| unsafe {
      (*block).is_free
        && (*block).payload_size >= size
        && Header::payload(block) as usize & (align - 1) == 0
    })
  }

  /// Links a block freshly carved at the break as the new tail.
  ///
  /// # Safety
  ///
  /// `block` must be an initialized header with a null `next`, placed
  /// right after the current tail.
  pub unsafe fn append(
    &mut self,
    block: *mut Header,
  ) {
    unsafe {
      if self.head.is_null() {
        self.head = block;
      } else {
        (*self.tail).next = block;
      }
      self.tail = block;
    }
  }

  /// Detaches the tail block, making its predecessor the new tail.
  ///
  /// There are no back links, so finding the predecessor walks the list
  /// from the head.
  ///
  /// # Safety
  ///
  /// `block` must be the current tail.
  pub unsafe fn unlink_tail(
    &mut self,
    block: *mut Header,
  ) {
    debug_assert_eq!(block, self.tail);

    unsafe {
      if self.head == block {
        self.head = ptr::null_mut();
        self.tail = ptr::null_mut();
        return;
      }

      let mut current = self.head;
      while !(*current).next.is_null() && (*current).next != block {
        current = (*current).next;
      }

      (*current).next = ptr::null_mut();
      self.tail = current;
    }
  }

  pub fn iter(&self) -> Iter<'_> {
    Iter {
      current: self.head,
      _list: PhantomData,
    }
  }
}

impl Default for FreeList {
  fn default() -> Self {
    Self::new()
  }
}

/// Walks block headers from head to tail.
pub struct Iter<'a> {
  current: *mut Header,
  _list: PhantomData<&'a FreeList>,
}

impl Iterator for Iter<'_> {
  type Item = *mut Header;

  fn next(&mut self) -> Option<Self::Item> {
    if self.current.is_null() {
      return None;
    }

    let block = self.current;
    self.current = unsafe { (*block).next };
    Some(block)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{align::HEADER_ALIGN, block::HEADER_SIZE};

  #[repr(C, align(16))]
  struct Backing([u8; 1024]);

  /// Lays out blocks of the given payload sizes back to back.
  unsafe fn build(
    backing: &mut Backing,
    sizes: &[usize],
  ) -> (FreeList, Vec<*mut Header>) {
    let mut list = FreeList::new();
    let mut blocks = Vec::new();
    let mut cursor = backing.0.as_mut_ptr();

    for &size in sizes {
      unsafe {
        let block = Header::init(cursor, 0, size);
        list.append(block);
        blocks.push(block);
        cursor = cursor.add(HEADER_SIZE + size);
      }
    }

    (list, blocks)
  }

  #[test]
  fn test_append_keeps_address_order() {
    let mut backing = Backing([0; 1024]);
    let (list, blocks) = unsafe { build(&mut backing, &[16, 32, 48]) };

    assert_eq!(list.iter().next(), Some(blocks[0]));
    assert_eq!(list.tail(), blocks[2]);
    assert_eq!(list.iter().collect::<Vec<_>>(), blocks);
    assert!(list.iter().zip(list.iter().skip(1)).all(|(a, b)| a < b));
  }

  #[test]
  fn test_find_fit_is_first_fit() {
    let mut backing = Backing([0; 1024]);
    let (list, mut blocks) = unsafe { build(&mut backing, &[16, 64, 32, 64]) };

    assert_eq!(list.find_fit(16, HEADER_ALIGN), None);

    unsafe {
      (*blocks[1]).is_free = true;
      (*blocks[2]).is_free = true;
      (*blocks[3]).is_free = true;
    }

    // The 64-byte block comes first, so it wins even though 32 fits better.
    assert_eq!(list.find_fit(32, HEADER_ALIGN), Some(blocks[1]));
    assert_eq!(list.find_fit(64, HEADER_ALIGN), Some(blocks[1]));
    assert_eq!(list.find_fit(65, HEADER_ALIGN), None);

    unsafe { (*blocks[1]).is_free = false };
    assert_eq!(list.find_fit(32, HEADER_ALIGN), Some(blocks[2]));
    assert_eq!(list.find_fit(48, HEADER_ALIGN), Some(blocks[3]));
  }

  #[test]
  fn test_find_fit_skips_misaligned_payloads() {
    let mut backing = Backing([0; 1024]);
    let (list, blocks) = unsafe { build(&mut backing, &[16, 16, 16, 16]) };

    for &block in &blocks {
      unsafe { (*block).is_free = true };
    }

    let aligned: Vec<_> = blocks
      .iter()
      .copied()
      .filter(|&block| Header::payload(block) as usize % 64 == 0)
      .collect();

    assert_eq!(list.find_fit(16, HEADER_ALIGN), Some(blocks[0]));
    assert_eq!(list.find_fit(16, 64), aligned.first().copied());
  }

  #[test]
  fn test_unlink_tail() {
    let mut backing = Backing([0; 1024]);
    let (mut list, blocks) = unsafe { build(&mut backing, &[16, 32, 48]) };

    unsafe { list.unlink_tail(blocks[2]) };
    assert_eq!(list.tail(), blocks[1]);
    assert!(unsafe { (*blocks[1]).next.is_null() });
    assert_eq!(list.iter().count(), 2);

    unsafe { list.unlink_tail(blocks[1]) };
    assert_eq!(list.iter().next(), Some(blocks[0]));
    assert_eq!(list.tail(), blocks[0]);

    unsafe { list.unlink_tail(blocks[0]) };
    assert_eq!(list.iter().next(), None);
    assert!(list.tail().is_null());
    assert_eq!(list.iter().count(), 0);
  }
}
