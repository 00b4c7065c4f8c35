pub fn main(global_idx: u32, counter: &mut [u32]) {
    if global_idx == 0 {
        counter[0] = 0;
    }
}
