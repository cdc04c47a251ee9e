use image::{DynamicImage, GenericImageView};

/// Difference-hash (dHash) of an image, used by the change detector to
/// decide whether monitor content changed enough to warrant a capture
/// (§4.1).
///
/// Downsamples to 9x8 grayscale and compares each pixel to its right
/// neighbor; the resulting 64 booleans pack into a `u64`.
pub fn dhash(image: &DynamicImage) -> u64 {
    let small = image
        .grayscale()
        .resize_exact(9, 8, image::imageops::FilterType::Triangle);

    let mut hash: u64 = 0;
    let mut bit = 0u32;
    for y in 0..8 {
        for x in 0..8 {
            let left = small.get_pixel(x, y).0[0];
            let right = small.get_pixel(x + 1, y).0[0];
            if left > right {
                hash |= 1 << bit;
            }
            bit += 1;
        }
    }
    hash
}

/// Hamming distance between two dHash values.
pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(w: u32, h: u32, px: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(w, h, |_, _| Rgba(px)))
    }

    #[test]
    fn identical_images_hash_identically() {
        let a = solid(64, 64, [10, 20, 30, 255]);
        let b = solid(64, 64, [10, 20, 30, 255]);
        assert_eq!(hamming_distance(dhash(&a), dhash(&b)), 0);
    }

    #[test]
    fn solid_color_vs_checkerboard_differ() {
        let a = solid(64, 64, [0, 0, 0, 255]);
        let mut img = RgbaImage::new(64, 64);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            };
        }
        let b = DynamicImage::ImageRgba8(img);
        assert!(hamming_distance(dhash(&a), dhash(&b)) > 0);
    }
}
