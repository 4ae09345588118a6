//! Placement policies.
//!
//! A placement policy decides which free block satisfies an allocation
//! request. It is a pure function over a read-only view of the free list:
//!
//! ```text
//!   (free list in ascending address order, required size)
//!        │
//!        ▼
//!   ┌────────────┐    ┌────────────┐    ┌────────────┐
//!   │ size: 32   │───►│ size: 128  │───►│ size: 64   │───► (end)
//!   └────────────┘    └────────────┘    └────────────┘
//!                           ▲
//!                           └── chosen block (or none)
//! ```
//!
//! The policy never rewires the list. The allocator core splits the chosen
//! block and splices the list based on the returned reference.
//!
//! [`first_fit`] is the default installed by
//! [`RegionAllocator::init`](crate::RegionAllocator::init); [`best_fit`] and
//! [`worst_fit`] are alternative strategies that trade a full scan of the
//! list for tighter (or deliberately looser) placement. Callers may also
//! install their own [`FitFn`].

use std::{cmp::Reverse, marker::PhantomData, ptr::NonNull};

use crate::block::{FreeBlock, PREFIX_SIZE};

/// A placement policy: selects a free block able to hold `need` bytes
/// (prefix included, already rounded to [`ALIGNMENT`](crate::align::ALIGNMENT))
/// or `None` when no block qualifies.
///
/// The function must not assume anything about the list other than that it is
/// sorted by ascending address, and must return either `None` or a block
/// large enough for the request.
pub type FitFn = for<'a> fn(FreeBlocks<'a>, usize) -> Option<FreeRef<'a>>;

/// Read-only view of one free block, as handed to placement policies.
#[derive(Clone, Copy)]
pub struct FreeRef<'a> {
  block: NonNull<FreeBlock>,
  _region: PhantomData<&'a ()>,
}

impl FreeRef<'_> {
  /// The block's base address (the prefix, not the would-be payload).
  pub fn addr(&self) -> *const u8 {
    self.block.as_ptr() as *const u8
  }

  /// Total size of the block in bytes, prefix included.
  pub fn size(&self) -> usize {
    unsafe { self.block.as_ref().header.size }
  }

  pub(crate) fn as_ptr(&self) -> *mut FreeBlock {
    self.block.as_ptr()
  }
}

/// Iterator over the free list in ascending address order.
///
/// Obtained from [`RegionAllocator::free_blocks`](crate::RegionAllocator::free_blocks)
/// and passed to placement policies. Holding it borrows the region, so the
/// list cannot change while it is alive.
pub struct FreeBlocks<'a> {
  cur: *mut FreeBlock,
  _region: PhantomData<&'a ()>,
}

impl FreeBlocks<'_> {
  pub(crate) fn new(head: *mut FreeBlock) -> Self {
    Self {
      cur: head,
      _region: PhantomData,
    }
  }
}

impl<'a> Iterator for FreeBlocks<'a> {
  type Item = FreeRef<'a>;

  fn next(&mut self) -> Option<FreeRef<'a>> {
    let block = NonNull::new(self.cur)?;
    self.cur = unsafe { (*self.cur).next };
    Some(FreeRef {
      block,
      _region: PhantomData,
    })
  }
}

/// First-fit: the first block able to hold the request wins.
///
/// A block qualifies when its size covers the request plus one extra prefix,
/// so that a split never produces a remainder too small to carry a free-block
/// prefix. Runs in O(length of the free list) and stops at the first match.
///
/// A zero request qualifies nowhere and returns `None` immediately.
pub fn first_fit<'a>(
  mut list: FreeBlocks<'a>,
  need: usize,
) -> Option<FreeRef<'a>> {
  if need == 0 {
    return None;
  }
  list.find(|block| block.size() >= need + PREFIX_SIZE)
}

/// Best-fit: the smallest block able to hold the request wins.
///
/// Scans the entire list. Ties go to the lowest address.
pub fn best_fit<'a>(
  list: FreeBlocks<'a>,
  need: usize,
) -> Option<FreeRef<'a>> {
  if need == 0 {
    return None;
  }
  list
    .filter(|block| block.size() >= need + PREFIX_SIZE)
    .min_by_key(FreeRef::size)
}

/// Worst-fit: the largest block able to hold the request wins.
///
/// Scans the entire list. Ties go to the lowest address.
pub fn worst_fit<'a>(
  list: FreeBlocks<'a>,
  need: usize,
) -> Option<FreeRef<'a>> {
  if need == 0 {
    return None;
  }
  // min_by_key keeps the first of equal keys, so inverting the size keeps
  // the tie-break on the lowest address.
  list
    .filter(|block| block.size() >= need + PREFIX_SIZE)
    .min_by_key(|block| Reverse(block.size()))
}

#[cfg(test)]
mod tests {
  use std::ptr;

  use super::*;
  use crate::block::BlockHeader;

  #[repr(align(16))]
  struct Backing([u8; 512]);

  /// Builds a detached free list over `backing`, one block per entry of
  /// `sizes`, laid out back to back.
  fn build_list(
    backing: &mut Backing,
    sizes: &[usize],
  ) -> *mut FreeBlock {
    assert!(sizes.iter().sum::<usize>() <= backing.0.len());

    let mut head: *mut FreeBlock = ptr::null_mut();
    let mut offset = sizes.iter().sum::<usize>();

    // Link back to front so the list comes out in address order.
    for size in sizes.iter().rev() {
      offset -= size;
      let block = unsafe { backing.0.as_mut_ptr().add(offset) } as *mut FreeBlock;
      unsafe {
        (*block).header = BlockHeader { size: *size };
        (*block).next = head;
      }
      head = block;
    }

    head
  }

  #[test]
  fn zero_request_is_refused() {
    let mut backing = Backing([0u8; 512]);
    let head = build_list(&mut backing, &[64, 64]);

    assert!(first_fit(FreeBlocks::new(head), 0).is_none());
    assert!(best_fit(FreeBlocks::new(head), 0).is_none());
    assert!(worst_fit(FreeBlocks::new(head), 0).is_none());
  }

  #[test]
  fn empty_list_yields_nothing() {
    assert!(first_fit(FreeBlocks::new(ptr::null_mut()), 16).is_none());
    assert_eq!(0, FreeBlocks::new(ptr::null_mut()).count());
  }

  #[test]
  fn first_fit_takes_the_first_adequate_block() {
    let mut backing = Backing([0u8; 512]);
    let head = build_list(&mut backing, &[32, 128, 256]);

    let chosen = first_fit(FreeBlocks::new(head), 64).expect("a block fits");

    // 32 is too small for 64 + prefix, 128 is the first match.
    assert_eq!(128, chosen.size());
  }

  #[test]
  fn first_fit_honors_the_prefix_margin() {
    let mut backing = Backing([0u8; 512]);
    let head = build_list(&mut backing, &[64]);

    // 64 == need: adequate only with room for one extra prefix.
    assert!(first_fit(FreeBlocks::new(head), 64).is_none());
    assert!(first_fit(FreeBlocks::new(head), 64 - PREFIX_SIZE).is_some());
  }

  #[test]
  fn best_fit_takes_the_tightest_block() {
    let mut backing = Backing([0u8; 512]);
    let head = build_list(&mut backing, &[256, 96, 128]);

    let chosen = best_fit(FreeBlocks::new(head), 64).expect("a block fits");

    assert_eq!(96, chosen.size());
  }

  #[test]
  fn worst_fit_takes_the_largest_block() {
    let mut backing = Backing([0u8; 512]);
    let head = build_list(&mut backing, &[96, 256, 128]);

    let chosen = worst_fit(FreeBlocks::new(head), 64).expect("a block fits");

    assert_eq!(256, chosen.size());
  }

  #[test]
  fn worst_fit_prefers_the_lowest_address_on_ties() {
    let mut backing = Backing([0u8; 512]);
    let head = build_list(&mut backing, &[128, 64, 128]);

    let chosen = worst_fit(FreeBlocks::new(head), 64).expect("a block fits");

    // Two 128-byte blocks tie for largest; the lower one wins.
    assert_eq!(128, chosen.size());
    assert_eq!(backing.0.as_ptr(), chosen.addr());
  }
}
