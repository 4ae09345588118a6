//! # Region Allocator
//!
//! A fixed-region allocator that carves variable-sized blocks out of one
//! contiguous byte range supplied by the caller, with an intrusive free list
//! and coalescing on free.
//!
//! ## Region Layout
//!
//! The first bytes of the region hold the region header; everything after it
//! is tiled by blocks, back to back, with no gaps:
//!
//! ```text
//!   base                                                       base + memory_size
//!   │                                                                         │
//!   ▼                                                                         ▼
//!   ┌───────────────┬───────────────┬──────────┬───────────────┬─────────────┐
//!   │ RegionHeader  │  Block (used) │ Block    │  Block (used) │ Block (free)│
//!   │ memory_size   │               │ (free)   │               │             │
//!   │ fit           │               │          │               │             │
//!   │ first ────────┼──────────────►│ next ────┼──────────────►│ next: null  │
//!   └───────────────┴───────────────┴──────────┴───────────────┴─────────────┘
//!
//!   The free list threads through the free blocks in ascending address
//!   order; occupied blocks are only reachable by walking the region
//!   physically, prefix to prefix.
//! ```
//!
//! Every block starts with a one-word prefix holding its total size. Free
//! blocks keep one extra word, the `next` link, in space that becomes payload
//! once the block is handed out.
//!
//! ## Allocation (split)
//!
//! ```text
//!   BEFORE: chosen free block, size = 96
//!   ┌──────────┬──────────────────────────────────────┐
//!   │ size: 96 │              free space              │
//!   └──────────┴──────────────────────────────────────┘
//!
//!   AFTER alloc of need = 32: carved off the low-address side
//!   ┌──────────┬──────────┬──────────┬────────────────┐
//!   │ size: 32 │ payload  │ size: 64 │   free space   │
//!   └──────────┴──────────┴──────────┴────────────────┘
//!              ▲          ▲
//!              │          └── remainder, spliced into the free list
//!              └── pointer returned to the caller (ALIGNMENT-aligned)
//! ```
//!
//! ## Free (coalesce)
//!
//! A freed block is inserted between its free-list address neighbors, then
//! merged with the right neighbor and the left neighbor when they touch:
//!
//! ```text
//!   ┌────────┬────────┬────────┐      ┌──────────────────────────┐
//!   │  free  │ freed  │  free  │  ──► │           free           │
//!   └────────┴────────┴────────┘      └──────────────────────────┘
//! ```
//!
//! No two adjacent blocks are ever both free between public calls.
//!
//! ## Thread Safety
//!
//! A region is strictly single-threaded. [`RegionAllocator`] holds raw
//! pointers and is deliberately neither `Send` nor `Sync`; synchronization is
//! a wrapper concern.

use std::{mem, ptr, ptr::NonNull};

use log::trace;
use thiserror::Error;

use crate::align;
use crate::block::{self, BlockHeader, FreeBlock, PREFIX_SIZE};
use crate::policy::{FitFn, FreeBlocks, first_fit};

/// Metadata written at offset 0 of the managed region.
#[repr(C)]
struct RegionHeader {
  /// Total bytes of the region, header included.
  memory_size: usize,
  /// The installed placement policy.
  fit: FitFn,
  /// Lowest-address free block, or null when the region is fully occupied.
  first: *mut FreeBlock,
}

/// Byte offset of the first block.
///
/// Chosen as the smallest offset that both covers the region header and puts
/// every payload (block base + prefix) on an [`ALIGNMENT`](align::ALIGNMENT)
/// boundary, given that block sizes are ALIGNMENT multiples.
const BLOCKS_OFFSET: usize =
  align!(mem::size_of::<RegionHeader>() + PREFIX_SIZE) - PREFIX_SIZE;

/// Smallest region `init` accepts: the header reserve plus one minimal block.
pub const MIN_REGION_SIZE: usize = BLOCKS_OFFSET + align::ALIGNMENT;

/// Why [`RegionAllocator::init`] refused a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegionError {
  /// The base pointer was null.
  #[error("region base pointer is null")]
  NullBase,

  /// The base pointer was not aligned to the platform maximum alignment.
  #[error("region base {addr:#x} is not aligned to {align} bytes")]
  Misaligned { addr: usize, align: usize },

  /// The region cannot hold the header and one minimal block.
  #[error("region of {size} bytes is too small (minimum {min})")]
  TooSmall { size: usize, min: usize },
}

/// Handle over one initialized region.
///
/// Created by [`init`](Self::init); every operation takes the handle, so there
/// is no process-wide state and multiple regions can coexist.
pub struct RegionAllocator {
  base: NonNull<RegionHeader>,
}

impl RegionAllocator {
  /// Takes ownership of the byte range `[base, base + size)` and formats it:
  /// a fresh header at `base` and a single free block spanning the rest.
  ///
  /// The installed placement policy is [`first_fit`]. A tail too small to
  /// form a whole [`ALIGNMENT`](align::ALIGNMENT) multiple is left out of the
  /// recorded `memory_size` and never touched.
  ///
  /// # Errors
  ///
  /// [`RegionError::NullBase`] / [`RegionError::Misaligned`] /
  /// [`RegionError::TooSmall`] when the preconditions on `base` and `size`
  /// do not hold.
  ///
  /// # Safety
  ///
  /// - `[base, base + size)` must be valid, writable memory, exclusively
  ///   owned by the returned handle until it is dropped.
  /// - The caller must keep the backing memory alive for the handle's whole
  ///   lifetime, and must not read or write the range except through
  ///   payload pointers returned by [`alloc`](Self::alloc).
  pub unsafe fn init(
    base: *mut u8,
    size: usize,
  ) -> Result<Self, RegionError> {
    let Some(header) = NonNull::new(base as *mut RegionHeader) else {
      return Err(RegionError::NullBase);
    };
    if base as usize % align::ALIGNMENT != 0 {
      return Err(RegionError::Misaligned {
        addr: base as usize,
        align: align::ALIGNMENT,
      });
    }
    if size < MIN_REGION_SIZE {
      return Err(RegionError::TooSmall {
        size,
        min: MIN_REGION_SIZE,
      });
    }

    // Whole blocks only: round the block space down to an ALIGNMENT multiple.
    let block_space = (size - BLOCKS_OFFSET) & !(align::ALIGNMENT - 1);
    let memory_size = BLOCKS_OFFSET + block_space;

    unsafe {
      let first = base.add(BLOCKS_OFFSET) as *mut FreeBlock;
      ptr::write(
        first,
        FreeBlock {
          header: BlockHeader { size: block_space },
          next: ptr::null_mut(),
        },
      );
      ptr::write(
        header.as_ptr(),
        RegionHeader {
          memory_size,
          fit: first_fit,
          first,
        },
      );
    }

    trace!("region initialized: {memory_size} bytes at {base:p}, {block_space} for blocks");

    Ok(Self { base: header })
  }

  /// Allocates `n` bytes and returns the payload pointer, or null when no
  /// free block satisfies the request.
  ///
  /// The returned pointer lies on an [`ALIGNMENT`](align::ALIGNMENT)
  /// boundary and spans at least `n` writable bytes. Writing through it is
  /// the caller's `unsafe`; the bookkeeping itself is safe.
  pub fn alloc(
    &mut self,
    n: usize,
  ) -> *mut u8 {
    // The block must carry its own prefix, and its size must keep every
    // later block on an aligned boundary. Requests near usize::MAX cannot
    // be rounded without wrapping; no block holds them anyway.
    let Some(padded) = n.checked_add(PREFIX_SIZE + align::ALIGNMENT - 1) else {
      return ptr::null_mut();
    };
    let need = padded & !(align::ALIGNMENT - 1);

    let fit = self.header().fit;
    let Some(chosen) = fit(self.free_blocks(), need) else {
      return ptr::null_mut();
    };
    let victim = chosen.as_ptr();

    unsafe {
      let vsize = (*victim).header.size;
      let vnext = (*victim).next;
      debug_assert!(vsize >= need, "policy returned an undersized block");

      // Whatever takes victim's slot in the free list: the split remainder,
      // or victim's successor when the block is consumed whole.
      let replacement = if vsize == need {
        vnext
      } else {
        // Sizes are ALIGNMENT multiples, so vsize > need leaves at least
        // ALIGNMENT bytes: enough for a free-block prefix.
        let rest = (victim as *mut u8).add(need) as *mut FreeBlock;
        ptr::write(
          rest,
          FreeBlock {
            header: BlockHeader { size: vsize - need },
            next: vnext,
          },
        );
        rest
      };

      if self.header().first == victim {
        self.header_mut().first = replacement;
      } else {
        // The list is address-sorted, so victim's predecessor is the node
        // linking to it. The policy contract guarantees victim is on the
        // list, hence the walk terminates.
        let mut prev = self.header().first;
        while (*prev).next != victim {
          prev = (*prev).next;
        }
        (*prev).next = replacement;
      }

      (*victim).header.size = need;

      block::payload(victim as *mut BlockHeader)
    }
  }

  /// Returns the block holding `address` to the free list, merging it with
  /// any adjacent free neighbor.
  ///
  /// Freeing null is a no-op.
  ///
  /// # Safety
  ///
  /// `address` must be null or a pointer previously returned by
  /// [`alloc`](Self::alloc) on this region and not freed since. The caller
  /// must not use the pointer afterwards.
  pub unsafe fn free(
    &mut self,
    address: *mut u8,
  ) {
    if address.is_null() {
      return;
    }

    unsafe {
      let block = block::from_payload(address) as *mut FreeBlock;
      let bsize = (*block).header.size;
      self.debug_check_block(block as usize, bsize);

      // Locate the free-list neighbors straddling the block: prev is the
      // last free block below it, next the first above it.
      let mut prev: *mut FreeBlock = ptr::null_mut();
      let mut next = self.header().first;
      while !next.is_null() && (next as usize) < (block as usize) {
        prev = next;
        next = (*next).next;
      }

      (*block).next = next;
      if prev.is_null() {
        self.header_mut().first = block;
      } else {
        (*prev).next = block;
      }

      // Merge with the right neighbor first, so block.next is not re-read
      // after being merged away.
      if !next.is_null() && block as usize + (*block).header.size == next as usize {
        (*block).header.size += (*next).header.size;
        (*block).next = (*next).next;
      }
      if !prev.is_null() && prev as usize + (*prev).header.size == block as usize {
        (*prev).header.size += (*block).header.size;
        (*prev).next = (*block).next;
      }
    }
  }

  /// Replaces the installed placement policy. The free list is untouched.
  pub fn set_policy(
    &mut self,
    fit: FitFn,
  ) {
    self.header_mut().fit = fit;
    trace!("placement policy replaced");
  }

  /// Visits every block in physical address order as
  /// `visit(address, size, is_free)`.
  ///
  /// `address` is the block's base (not the payload) and `size` includes the
  /// prefix. The visitor cannot call back into [`alloc`](Self::alloc) or
  /// [`free`](Self::free): those need `&mut self` while the walk holds
  /// `&self`.
  pub fn walk<F>(
    &self,
    mut visit: F,
  ) where
    F: FnMut(*const u8, usize, bool),
  {
    let base = self.base.as_ptr() as usize;
    let end = base + self.header().memory_size;

    // Run the free-list cursor alongside the physical walk: a block is free
    // exactly when it is the cursor's current target.
    let mut cursor = self.header().first as *const FreeBlock;
    let mut addr = base + BLOCKS_OFFSET;

    while addr < end {
      let size = unsafe { (*(addr as *const BlockHeader)).size };
      let is_free = addr == cursor as usize;
      if is_free {
        cursor = unsafe { (*cursor).next };
      }

      visit(addr as *const u8, size, is_free);

      addr += size;
    }
  }

  /// Iterates the free list in ascending address order.
  ///
  /// This is the view handed to placement policies; it is also useful for
  /// diagnostics and tests.
  pub fn free_blocks(&self) -> FreeBlocks<'_> {
    FreeBlocks::new(self.header().first)
  }

  /// The number of payload bytes usable through `address`.
  ///
  /// This is the block's size minus its prefix: at least the `n` the block
  /// was allocated for, possibly more after alignment rounding.
  ///
  /// # Safety
  ///
  /// `address` must be a pointer previously returned by
  /// [`alloc`](Self::alloc) on this region and not freed since.
  pub unsafe fn payload_size(
    &self,
    address: *const u8,
  ) -> usize {
    unsafe {
      let block = block::from_payload(address as *mut u8);
      self.debug_check_block(block as usize, (*block).size);
      (*block).size - PREFIX_SIZE
    }
  }

  /// Total bytes of the region, header included.
  pub fn total_size(&self) -> usize {
    self.header().memory_size
  }

  /// Bytes available for blocks: the region minus its header reserve.
  pub fn capacity(&self) -> usize {
    self.header().memory_size - BLOCKS_OFFSET
  }

  fn header(&self) -> &RegionHeader {
    unsafe { self.base.as_ref() }
  }

  fn header_mut(&mut self) -> &mut RegionHeader {
    unsafe { self.base.as_mut() }
  }

  /// Debug-mode sanity checks on a block handed back by the caller.
  fn debug_check_block(
    &self,
    addr: usize,
    size: usize,
  ) {
    let base = self.base.as_ptr() as usize;
    debug_assert!(
      addr >= base + BLOCKS_OFFSET && addr + size <= base + self.header().memory_size,
      "block {addr:#x} (+{size}) lies outside the region"
    );
    debug_assert!(
      size >= align::ALIGNMENT && size % align::ALIGNMENT == 0,
      "block {addr:#x} has a corrupt size prefix ({size})"
    );
    debug_assert!(
      addr % align::ALIGNMENT == BLOCKS_OFFSET % align::ALIGNMENT,
      "block {addr:#x} is not on a block boundary"
    );
  }
}
