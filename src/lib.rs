//! # fitalloc - A Fixed-Region Heap Allocator Library
//!
//! This crate provides a **fixed-region allocator**: a user-space memory
//! manager that carves variable-sized blocks out of a single contiguous byte
//! region supplied at initialization, tracks free blocks with an intrusive
//! singly-linked free list, and reunites adjacent free blocks on release.
//!
//! ## Overview
//!
//! ```text
//!   Fixed-Region Allocator Concept:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                     BACKING REGION (caller-supplied)                 │
//!   │                                                                      │
//!   │   ┌────────┬───────┬───────┬─────────────┬───────┬───────────────┐   │
//!   │   │ Header │  A1   │ free  │     A2      │  A3   │     free      │   │
//!   │   └────────┴───────┴───────┴─────────────┴───────┴───────────────┘   │
//!   │      │               ▲                              ▲               │
//!   │      │    first      │            next              │               │
//!   │      └───────────────┴──────────────────────────────┘               │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Allocation splits a free block; release re-inserts and coalesces.
//!   The region never grows: out-of-memory is an answer, not an event.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   fitalloc
//!   ├── align      - Alignment macros (align!, align_to!) and ALIGNMENT
//!   ├── block      - Block prefix layout (internal)
//!   ├── policy     - Placement policies (first_fit, best_fit, worst_fit)
//!   ├── region     - RegionAllocator: init, alloc, free, walk, set_policy
//!   └── host       - MappedRegion: mmap-backed region supplier
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use fitalloc::{MappedRegion, RegionAllocator, best_fit};
//!
//! // The host supplies the backing region; here, an anonymous mapping.
//! let mem = MappedRegion::map(64 * 1024).unwrap();
//! let mut region = unsafe { RegionAllocator::init(mem.base(), mem.len()) }.unwrap();
//!
//! // Allocate, use, release.
//! let p = region.alloc(32) as *mut u64;
//! assert!(!p.is_null());
//! unsafe {
//!   *p = 42;
//!   assert_eq!(*p, 42);
//!   region.free(p as *mut u8);
//! }
//!
//! // Placement is pluggable.
//! region.set_policy(best_fit);
//! ```
//!
//! ## Diagnostics
//!
//! The allocator never prints; front ends build their own reporting on top of
//! [`RegionAllocator::walk`], which visits every block in physical order:
//!
//! ```rust
//! # use fitalloc::{MappedRegion, RegionAllocator};
//! # let mem = MappedRegion::map(4096).unwrap();
//! # let region = unsafe { RegionAllocator::init(mem.base(), mem.len()) }.unwrap();
//! region.walk(|addr, size, is_free| {
//!   println!("{addr:p} {size:>6} {}", if is_free { "free" } else { "used" });
//! });
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: a region must be externally serialized
//! - **No growth**: the region never acquires more memory than it was given
//! - **No compaction**: fragmentation is managed only by coalescing
//! - **Unix host module**: `MappedRegion` requires `mmap` (POSIX systems);
//!   the core itself is host-agnostic
//!
//! ## Safety
//!
//! The region's interior bookkeeping is encapsulated behind safe calls;
//! `unsafe` remains where it belongs: vouching for the backing memory at
//! `init`, writing through returned payload pointers, and honoring the
//! free-exactly-once contract.

pub mod align;
mod block;
pub mod host;
pub mod policy;
mod region;

pub use block::PREFIX_SIZE;
pub use host::MappedRegion;
pub use policy::{FitFn, FreeBlocks, FreeRef, best_fit, first_fit, worst_fit};
pub use region::{MIN_REGION_SIZE, RegionAllocator, RegionError};
