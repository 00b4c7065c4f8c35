use wavefront_gpu::atomic_increment;

pub fn main(global_idx: u32, counter: &mut [u32]) {
    if global_idx == 0 {
        atomic_increment(&mut counter[0]);
    }
}
