//! # ffalloc - A First-Fit Program Break Allocator
//!
//! This crate provides a small **first-fit heap** that grows and shrinks a
//! single contiguous arena by moving the program break with `sbrk(2)`, and
//! serves `allocate`, `free`, `zero_allocate` and `resize` from it.
//!
//! ## Overview
//!
//! Every block ever created stays in one singly linked list, in address
//! order. Freed blocks are only flagged; the next request that fits takes the
//! first of them:
//!
//! ```text
//!   First-Fit Reuse:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                            ARENA                                     │
//!   │                                                                      │
//!   │   ┌──────┬──────────┬──────┬──────────┬──────┬──────────┐            │
//!   │   │ H:16 │  in use  │ H:64 │   FREE   │ H:32 │  in use  │            │
//!   │   └──────┴──────────┴──────┴──────────┴──────┴──────────┘            │
//!   │   ▲ head                   ▲                 ▲ tail     ▲            │
//!   │                            │                            │            │
//!   │               allocate(40) lands here           Program Break        │
//!   │               (all 64 bytes are handed out)                          │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only the tail block can give memory back to the OS. A freed block in the
//! middle of the arena is kept forever and never split or merged with its
//! neighbours:
//!
//! ```text
//!   free(tail):                         free(middle):
//!
//!   ┌────┬────┬────┐                     ┌────┬────┬────┐
//!   │ A  │ B  │ C  │ ◀ break             │ A  │ B  │ C  │ ◀ break
//!   └────┴────┴────┘                     └────┴────┴────┘
//!          │                                    │
//!          ▼                                    ▼
//!   ┌────┬────┐                          ┌────┬────┬────┐
//!   │ A  │ B  │ ◀ break (shrunk)         │ A  │free│ C  │ ◀ break (same)
//!   └────┴────┘                          └────┴────┴────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   ffalloc
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── block      - Block header placed before every payload
//!   ├── arena      - ProgramBreak trait, Sbrk and FixedArena
//!   ├── free_list  - Address-ordered block list (first-fit search)
//!   ├── heap       - Heap: locking, allocation engines, GlobalAlloc
//!   ├── abi        - extern "C" malloc/free/calloc/realloc family
//!   ├── config     - HeapConfig
//!   └── error      - AllocError
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use ffalloc::{FixedArena, Heap, HeapConfig};
//!
//! let heap = Heap::new(FixedArena::with_capacity(4096).unwrap(), HeapConfig::new());
//!
//! let first = heap.allocate(16).unwrap();
//! let second = heap.allocate(32).unwrap();
//!
//! unsafe {
//!     // `first` is not the tail, so it becomes a free entry.
//!     heap.free(first.as_ptr());
//! }
//!
//! // First-fit hands the same block back.
//! assert_eq!(heap.allocate(8).unwrap(), first);
//!
//! unsafe { heap.free(second.as_ptr()) };
//! ```
//!
//! Installing it as the Rust global allocator:
//!
//! ```rust,ignore
//! use ffalloc::{Heap, HeapConfig, Sbrk};
//!
//! #[global_allocator]
//! static HEAP: Heap<Sbrk> = Heap::new(Sbrk, HeapConfig::new());
//! ```
//!
//! ## Block Layout
//!
//! ```text
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Header             │         Payload                │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ payload_size: N │  │  N = request rounded up to 16  │
//!   │  │ is_free         │  │                                │
//!   │  │ next            │  │                                │
//!   │  │ lead            │  │                                │
//!   │  └─────────────────┘  │                                │
//!   │  HEADER_SIZE (x16)    │                                │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to the caller (16-aligned)
//! ```
//!
//! ## Concurrency
//!
//! A single `spin::Mutex` serializes every change to the list and to the
//! break. Waiting on it never allocates, so the heap can back the global
//! allocator of a multithreaded program. `resize` and `zero_allocate` take
//! it several times, so they are not atomic as a whole; a pointer must never
//! be freed or resized from two threads at once.
//!
//! ## Limitations
//!
//! - **No splitting**: a reused block is handed out whole
//! - **No coalescing**: adjacent free blocks stay separate
//! - **Tail-only release**: only the block at the break goes back to the OS
//! - **Over-aligned lead**: a block grown for an alignment above 16 keeps up
//!   to `align - 16` bytes of padding in front of its header
//! - **Unix-only**: `Sbrk` needs `libc::sbrk`

pub mod abi;
pub mod align;
mod arena;
mod block;
mod config;
mod error;
mod free_list;
mod heap;

pub use arena::{FixedArena, ProgramBreak, Sbrk};
pub use block::HEADER_SIZE;
pub use config::HeapConfig;
pub use error::AllocError;
pub use heap::{Heap, HeapStats};
