//! Runs against the real program break, so everything lives in one test to
//! keep this binary from moving the break from several threads.

use std::{ptr, slice};

use ffalloc::abi::{ffalloc_calloc, ffalloc_free, ffalloc_malloc, ffalloc_realloc, process_heap};

#[test]
fn process_heap_round_trip() {
  unsafe {
    let first = ffalloc_malloc(24) as *mut u8;
    assert!(!first.is_null());
    assert_eq!(first as usize % 16, 0);
    assert!(process_heap().program_break() >= first.add(24));

    for i in 0..24 {
      *first.add(i) = i as u8;
    }

    let zeroed = ffalloc_calloc(10, 10) as *mut u8;
    assert!(!zeroed.is_null());
    assert!(slice::from_raw_parts(zeroed, 100).iter().all(|&b| b == 0));

    let grown = ffalloc_realloc(first.cast(), 200) as *mut u8;
    assert!(!grown.is_null());
    assert_eq!(
      slice::from_raw_parts(grown, 24),
      (0..24).collect::<Vec<u8>>().as_slice()
    );

    let same = ffalloc_realloc(grown.cast(), 100) as *mut u8;
    assert_eq!(same, grown);

    let refused = ffalloc_malloc(isize::MAX as usize);
    assert!(refused.is_null());
    assert_eq!(
      std::io::Error::last_os_error().raw_os_error(),
      Some(libc::ENOMEM)
    );

    ffalloc_free(same.cast());
    ffalloc_free(zeroed.cast());
    ffalloc_free(ptr::null_mut());

    let stats = process_heap().stats();
    assert_eq!(stats.free_blocks, stats.blocks);
  }
}
