use glam::Vec4;

use crate::{atomic_increment, Ray};

/// Incoming side of a ray stream: a compacted array of rays together with the
/// pixels they belong to.
///
/// The stream's length comes from its device-side counter, clamped to the
/// stream's capacity, so a corrupted counter can't cause out-of-bounds reads.
#[derive(Clone, Copy)]
pub struct RayStream<'a> {
    rays: &'a [Vec4],
    pixel_indices: &'a [u32],
    len: u32,
}

impl<'a> RayStream<'a> {
    pub fn new(
        rays: &'a [Vec4],
        pixel_indices: &'a [u32],
        counter: &[u32],
    ) -> Self {
        let capacity = (rays.len() / Ray::STRIDE).min(pixel_indices.len());
        let len = counter.first().copied().unwrap_or(0).min(capacity as u32);

        Self {
            rays,
            pixel_indices,
            len,
        }
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    /// Returns `idx`-th live ray and its pixel index, or `None` if `idx` is
    /// past the live part of the stream.
    pub fn get(&self, idx: u32) -> Option<(Ray, u32)> {
        if idx >= self.len {
            return None;
        }

        let ray = Ray::read(self.rays, idx as usize);
        let pixel_idx = self.pixel_indices[idx as usize];

        Some((ray, pixel_idx))
    }
}

/// Outgoing side of a ray stream: an append-only channel whose length is kept
/// in a device-side counter.
///
/// Rays pushed here are compacted, i.e. their order doesn't follow the pixels
/// they belong to; that's what the pixel indices are for.
pub struct RayQueue<'a> {
    rays: &'a mut [Vec4],
    pixel_indices: &'a mut [u32],
    counter: &'a mut [u32],
}

impl<'a> RayQueue<'a> {
    pub fn new(
        rays: &'a mut [Vec4],
        pixel_indices: &'a mut [u32],
        counter: &'a mut [u32],
    ) -> Self {
        Self {
            rays,
            pixel_indices,
            counter,
        }
    }

    pub fn capacity(&self) -> u32 {
        (self.rays.len() / Ray::STRIDE).min(self.pixel_indices.len()) as u32
    }

    /// Appends a ray, returning the slot it landed in or `None` if the queue
    /// is full.
    pub fn push(&mut self, ray: Ray, pixel_idx: u32) -> Option<u32> {
        let capacity = self.capacity();
        let counter = self.counter.first_mut()?;

        if *counter >= capacity {
            return None;
        }

        let slot = atomic_increment(counter);

        ray.write(self.rays, slot as usize);
        self.pixel_indices[slot as usize] = pixel_idx;

        Some(slot)
    }
}

#[cfg(test)]
mod tests {
    use glam::{vec3, Vec3};

    use super::*;

    #[test]
    fn push_and_read() {
        let mut rays = vec![Vec4::ZERO; 2 * Ray::STRIDE];
        let mut pixel_indices = vec![0; 2];
        let mut counter = vec![0];

        let ray_a = Ray::new(vec3(1.0, 2.0, 3.0), Vec3::X);
        let ray_b = Ray::new(vec3(4.0, 5.0, 6.0), Vec3::Y);

        {
            let mut queue =
                RayQueue::new(&mut rays, &mut pixel_indices, &mut counter);

            assert_eq!(2, queue.capacity());
            assert_eq!(Some(0), queue.push(ray_a, 7));
            assert_eq!(Some(1), queue.push(ray_b, 3));
            assert_eq!(None, queue.push(ray_b, 1));
        }

        assert_eq!(2, counter[0]);

        let stream = RayStream::new(&rays, &pixel_indices, &counter);

        assert_eq!(2, stream.len());
        assert_eq!(Some((ray_a, 7)), stream.get(0));
        assert_eq!(Some((ray_b, 3)), stream.get(1));
        assert_eq!(None, stream.get(2));
    }

    #[test]
    fn corrupted_counter() {
        let rays = vec![Vec4::ZERO; 2 * Ray::STRIDE];
        let pixel_indices = vec![0; 2];

        let stream = RayStream::new(&rays, &pixel_indices, &[1234]);

        assert_eq!(2, stream.len());
        assert!(stream.get(2).is_none());
    }
}
