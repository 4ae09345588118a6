//! Host side of the allocator: obtaining a backing region from the OS.
//!
//! The allocator core never requests memory from anyone; it manages exactly
//! the byte range it was handed at [`init`](crate::RegionAllocator::init).
//! Something still has to produce that range, and on POSIX systems the
//! natural tool is an anonymous, private `mmap(2)`: the mapping is
//! page-aligned (comfortably beyond [`ALIGNMENT`](crate::align::ALIGNMENT)),
//! zero-filled, and disjoint from the libc heap.

use std::{io, ptr};

use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, c_void, mmap, munmap};

/// An anonymous memory mapping, unmapped on drop.
///
/// # Example
///
/// ```rust
/// use fitalloc::{MappedRegion, RegionAllocator};
///
/// let mem = MappedRegion::map(64 * 1024).unwrap();
/// let mut region = unsafe { RegionAllocator::init(mem.base(), mem.len()) }.unwrap();
///
/// let p = region.alloc(10);
/// assert!(!p.is_null());
/// unsafe { region.free(p) };
/// ```
pub struct MappedRegion {
  base: *mut u8,
  len: usize,
}

impl MappedRegion {
  /// Maps `len` bytes of zero-filled, private anonymous memory.
  ///
  /// # Errors
  ///
  /// The raw OS error when `mmap` refuses the request (address-space
  /// exhaustion, resource limits).
  pub fn map(len: usize) -> io::Result<Self> {
    let base = unsafe {
      mmap(
        ptr::null_mut(),
        len,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
      )
    };
    if base == MAP_FAILED {
      return Err(io::Error::last_os_error());
    }

    Ok(Self {
      base: base as *mut u8,
      len,
    })
  }

  /// The first byte of the mapping. Page-aligned.
  pub fn base(&self) -> *mut u8 {
    self.base
  }

  /// Length of the mapping in bytes.
  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }
}

impl Drop for MappedRegion {
  fn drop(&mut self) {
    unsafe {
      munmap(self.base as *mut c_void, self.len);
    }
  }
}
