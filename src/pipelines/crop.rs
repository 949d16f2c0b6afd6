// SPDX-License-Identifier: GPL-3.0-only

//! Center cropping

use image::RgbImage;
use image::imageops;

/// Region of a frame, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Compute the centred `width` x `height` window of a `frame_width` x
/// `frame_height` frame.
///
/// The window is clipped to the frame, never padded: a frame smaller than
/// the request yields a smaller rectangle anchored at the origin of the
/// overflowing axis.
pub fn center_crop_rect(frame_width: u32, frame_height: u32, width: u32, height: u32) -> CropRect {
    let x = frame_width.saturating_sub(width) / 2;
    let y = frame_height.saturating_sub(height) / 2;

    CropRect {
        x,
        y,
        width: width.min(frame_width - x),
        height: height.min(frame_height - y),
    }
}

/// Crop the centre of `image` to `width` x `height`
pub fn center_crop(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    let rect = center_crop_rect(image.width(), image.height(), width, height);
    imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_output_matches_requested_size() {
        let image = RgbImage::new(640, 480);
        let cropped = center_crop(&image, 224, 224);
        assert_eq!(cropped.dimensions(), (224, 224));
    }

    #[test]
    fn test_crop_is_centred() {
        assert_eq!(
            center_crop_rect(640, 480, 200, 100),
            CropRect {
                x: 220,
                y: 190,
                width: 200,
                height: 100
            }
        );

        // Odd leftovers round down, like integer division
        let rect = center_crop_rect(11, 11, 4, 4);
        assert_eq!((rect.x, rect.y), (3, 3));
    }

    #[test]
    fn test_crop_picks_centre_pixels() {
        // Mark the single centre pixel of a 5x5 frame
        let mut image = RgbImage::new(5, 5);
        image.put_pixel(2, 2, Rgb([255, 0, 0]));

        let cropped = center_crop(&image, 1, 1);
        assert_eq!(cropped.get_pixel(0, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_oversized_request_is_clipped() {
        let rect = center_crop_rect(320, 240, 400, 200);
        assert_eq!(
            rect,
            CropRect {
                x: 0,
                y: 20,
                width: 320,
                height: 200
            }
        );

        let cropped = center_crop(&RgbImage::new(320, 240), 400, 200);
        assert_eq!(cropped.dimensions(), (320, 200));
    }

    #[test]
    fn test_exact_size_is_identity() {
        let image = RgbImage::from_fn(6, 4, |x, y| Rgb([x as u8, y as u8, 0]));
        assert_eq!(center_crop(&image, 6, 4), image);
    }
}
