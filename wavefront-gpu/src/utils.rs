use glam::{uvec2, UVec2};

/// Converts a linear pixel index into screen-coordinates.
pub fn idx_to_screen(idx: u32, width: u32) -> UVec2 {
    uvec2(idx % width, idx / width)
}

/// Converts screen-coordinates into a linear pixel index.
pub fn screen_to_idx(pos: UVec2, width: u32) -> u32 {
    pos.y * width + pos.x
}

/// Increments given device-side counter, returning its previous value.
///
/// Kernels run on the reference backend one work-item at a time, so this is a
/// plain read-modify-write; GPU ports map it onto `atomicAdd()`.
pub fn atomic_increment(counter: &mut u32) -> u32 {
    let prev = *counter;

    *counter = prev.wrapping_add(1);
    prev
}
