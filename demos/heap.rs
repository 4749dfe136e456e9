use std::{io::Read, ptr::NonNull};

use ffalloc::{HEADER_SIZE, Heap, HeapConfig, Sbrk};

// Everything this program allocates, `println!` included, goes through here.
#[global_allocator]
static HEAP: Heap<Sbrk> = Heap::new(Sbrk, HeapConfig::new());

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`,
/// `gdb`, or just visually track how allocations move the program break.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn print_program_break(label: &str) {
  let stats = HEAP.stats();
  println!(
    "[{}] PID = {}, program break = {:?}, blocks = {} ({} free), arena = {} bytes",
    label,
    std::process::id(),
    HEAP.program_break(),
    stats.blocks,
    stats.free_blocks,
    stats.arena_bytes,
  );
}

fn print_alloc(
  size: usize,
  block: NonNull<u8>,
) {
  println!(
    "Allocated {} bytes, address = {:?}, program break = {:?}",
    size,
    block,
    HEAP.program_break()
  );
}

fn main() {
  println!("Header size: {} bytes", HEADER_SIZE);
  print_program_break("start");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Two blocks back to back: the second starts right after the first.
  // --------------------------------------------------------------------
  let first = HEAP.allocate(16).expect("allocate 16");
  print_alloc(16, first);
  let second = HEAP.allocate(32).expect("allocate 32");
  print_alloc(32, second);

  unsafe { first.as_ptr().cast::<u64>().write(0xDEADBEEF) };
  println!(
    "[1] second - first = {} bytes",
    second.as_ptr() as usize - first.as_ptr() as usize
  );
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Freeing a block that is not the tail keeps the arena size.
  // --------------------------------------------------------------------
  let before = HEAP.program_break();
  unsafe { HEAP.free(first.as_ptr()) };
  println!("\n[2] Freed first block at {:?}", first);
  println!("[2] program break unchanged? {}", before == HEAP.program_break());
  print_program_break("after non-tail free");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) A smaller request takes the freed block back (first-fit).
  // --------------------------------------------------------------------
  let third = HEAP.allocate(8).expect("allocate 8");
  print_alloc(8, third);
  println!(
    "[3] third == first? {}",
    if third == first {
      "Yes, it reused the freed block"
    } else {
      "No, something else got there first"
    }
  );
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) Resize keeps the contents.
  // --------------------------------------------------------------------
  unsafe { third.as_ptr().write_bytes(0xAB, 16) };
  let moved = unsafe { HEAP.resize(third.as_ptr(), 256) }.expect("resize to 256");
  println!("\n[4] Resized {:?} -> {:?}", third, moved);
  println!("[4] first byte after resize = 0x{:X}", unsafe { moved.as_ptr().read() });
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 5) A large zeroed block grows the break; freeing it, while it is the
  //    tail, hands the memory back.
  // --------------------------------------------------------------------
  print_program_break("before large alloc");
  let big = HEAP.zero_allocate(64, 1024).expect("zero_allocate 64 KiB");
  print_alloc(64 * 1024, big);
  print_program_break("after large alloc");

  unsafe { HEAP.free(big.as_ptr()) };
  print_program_break("after freeing large block");
  block_until_enter_pressed();

  println!("\n[6] End of demo. Process will exit and the OS will reclaim all memory.");
}
