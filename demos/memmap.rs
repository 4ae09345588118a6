use std::io::Read;

use fitalloc::{MappedRegion, RegionAllocator, best_fit, first_fit, worst_fit};

/// Waits until the user presses ENTER.
/// Useful when you want to inspect the process with tools like `pmap`,
/// `htop`, `gdb`, or just follow the block map step by step.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the block map of the region: one line per block in physical order,
/// as offsets from the region base.
fn print_region_map(region: &RegionAllocator) {
  let mut base = None;

  println!("  {:>8}  {:>8}  state", "offset", "size");
  region.walk(|addr, size, is_free| {
    let base = *base.get_or_insert(addr as usize);
    println!(
      "  {:>8}  {:>8}  {}",
      addr as usize - base,
      size,
      if is_free { "free" } else { "used" },
    );
  });
}

fn main() {
  // The host side: one anonymous mapping is the whole world the allocator
  // will ever manage.
  let mem = MappedRegion::map(4 * 1024).expect("mmap failed");
  let mut region =
    unsafe { RegionAllocator::init(mem.base(), mem.len()) }.expect("init failed");

  println!(
    "Region of {} bytes at {:?} ({} usable)",
    region.total_size(),
    mem.base(),
    region.capacity(),
  );

  print_region_map(&region);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Allocate space for a u32 and write through the payload pointer.
  // --------------------------------------------------------------------
  let first_block = region.alloc(4);
  println!("\n[1] Allocate 4 bytes -> {first_block:?}");

  let first_ptr = first_block as *mut u32;
  unsafe {
    first_ptr.write(0xDEADBEEF);
    println!("[1] Value written to first_block = 0x{:X}", first_ptr.read());
    println!("[1] Usable payload = {} bytes", region.payload_size(first_block));
  }

  print_region_map(&region);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) A few more allocations to give the region some texture.
  // --------------------------------------------------------------------
  let second_block = region.alloc(100);
  let third_block = region.alloc(60);
  let fourth_block = region.alloc(200);
  println!("\n[2] Allocate 100, 60 and 200 bytes");

  print_region_map(&region);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Free the middle allocations: the two zones touch, so they come
  //    back as one coalesced free block.
  // --------------------------------------------------------------------
  unsafe {
    region.free(third_block);
    region.free(second_block);
  }
  println!("\n[3] Free the 100- and 60-byte blocks (adjacent -> one free zone)");

  print_region_map(&region);
  println!("  free zones: {}", region.free_blocks().count());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) Same request under different placement policies. first_fit grabs
  //    the hole in the middle; worst_fit prefers the big tail.
  // --------------------------------------------------------------------
  region.set_policy(first_fit);
  let refill = region.alloc(40);
  println!("\n[4] first_fit: alloc(40) -> {refill:?} (the middle hole)");

  unsafe { region.free(refill) };

  region.set_policy(worst_fit);
  let tail = region.alloc(40);
  println!("[4] worst_fit: alloc(40) -> {tail:?} (the tail)");

  print_region_map(&region);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 5) best_fit hunts for the tightest hole.
  // --------------------------------------------------------------------
  region.set_policy(best_fit);
  let snug = region.alloc(90);
  println!("\n[5] best_fit: alloc(90) -> {snug:?}");

  print_region_map(&region);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 6) Release everything: the region collapses back to a single free
  //    block spanning the whole non-header range.
  // --------------------------------------------------------------------
  unsafe {
    region.free(first_block);
    region.free(fourth_block);
    region.free(tail);
    region.free(snug);
  }
  println!("\n[6] All freed; the region is one free block again");

  print_region_map(&region);
  println!(
    "\n[6] End of example. Dropping the mapping returns the region to the OS.",
  );
}
