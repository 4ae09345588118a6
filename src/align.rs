/// The platform's maximum natural alignment, in bytes.
///
/// Every block size the allocator produces is a multiple of this value, and
/// every payload pointer handed to the caller lies on such a boundary. 16 is
/// the largest alignment any fundamental type requires on the platforms this
/// crate targets (x86-64, aarch64).
pub const ALIGNMENT: usize = 16;

/// Rounds the given value up to the next multiple of `$align`.
///
/// `$align` must be a power of two.
///
/// # Examples
///
/// ```rust
/// use fitalloc::align_to;
///
/// assert_eq!(align_to!(13, 8), 16);
/// assert_eq!(align_to!(16, 8), 16);
/// assert_eq!(align_to!(17, 32), 32);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}

/// Rounds the given value up to the next multiple of [`ALIGNMENT`].
///
/// # Examples
///
/// ```rust
/// use fitalloc::{align, align::ALIGNMENT};
///
/// assert_eq!(align!(1), ALIGNMENT);
/// assert_eq!(align!(ALIGNMENT), ALIGNMENT);
/// assert_eq!(align!(ALIGNMENT + 1), 2 * ALIGNMENT);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, $crate::align::ALIGNMENT)
  };
}
