use ndarray::Array4;

use crate::shared::frame::Frame;

/// How a frame is turned into a network input tensor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlobParams {
    /// Square network input resolution.
    pub size: usize,
    /// Multiplier applied after mean subtraction.
    pub scale: f32,
    /// Per-channel mean, in the tensor's channel order.
    pub mean: [f32; 3],
    /// Emit RGB planes instead of the frame's BGR order.
    pub swap_rb: bool,
}

/// Resizes a BGR frame to `size × size` and packs it as NCHW float32.
///
/// Plain stretch resize (no letterbox), nearest-neighbour sampling at pixel
/// centers. Each value is `(pixel - mean[c]) * scale`.
pub fn blob_from_frame(frame: &Frame<'_>, params: &BlobParams) -> Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = params.size;

    let mut tensor = Array4::<f32>::zeros((1, 3, s, s));
    if src_h == 0 || src_w == 0 {
        return tensor;
    }

    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                let src_c = if params.swap_rb { 2 - c } else { c };
                let value = src[[src_y, src_x, src_c]] as f32;
                tensor[[0, c, y, x]] = (value - params.mean[c]) * params.scale;
            }
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bgr_frame(width: u32, height: u32, pixel: [u8; 3]) -> Frame<'static> {
        let data = pixel
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Frame::owned(data, width, height)
    }

    #[test]
    fn test_blob_shape() {
        let frame = bgr_frame(64, 48, [0, 0, 0]);
        let params = BlobParams {
            size: 30,
            scale: 1.0,
            mean: [0.0; 3],
            swap_rb: false,
        };
        assert_eq!(blob_from_frame(&frame, &params).shape(), &[1, 3, 30, 30]);
    }

    #[test]
    fn test_mean_subtraction_keeps_bgr_order() {
        let frame = bgr_frame(8, 8, [110, 180, 130]);
        let params = BlobParams {
            size: 4,
            scale: 1.0,
            mean: [104.0, 177.0, 123.0],
            swap_rb: false,
        };
        let blob = blob_from_frame(&frame, &params);
        assert_relative_eq!(blob[[0, 0, 1, 1]], 6.0);
        assert_relative_eq!(blob[[0, 1, 1, 1]], 3.0);
        assert_relative_eq!(blob[[0, 2, 1, 1]], 7.0);
    }

    #[test]
    fn test_swap_rb_and_scale() {
        let frame = bgr_frame(8, 8, [255, 0, 51]);
        let params = BlobParams {
            size: 4,
            scale: 1.0 / 255.0,
            mean: [0.0; 3],
            swap_rb: true,
        };
        let blob = blob_from_frame(&frame, &params);
        // Plane 0 is now red, plane 2 blue.
        assert_relative_eq!(blob[[0, 0, 2, 2]], 0.2, epsilon = 1e-6);
        assert_relative_eq!(blob[[0, 1, 2, 2]], 0.0);
        assert_relative_eq!(blob[[0, 2, 2, 2]], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_upscale_samples_nearest_pixel() {
        // 2x1 frame: left pixel black, right pixel white
        let frame = Frame::owned(vec![0, 0, 0, 255, 255, 255], 2, 1);
        let params = BlobParams {
            size: 4,
            scale: 1.0,
            mean: [0.0; 3],
            swap_rb: false,
        };
        let blob = blob_from_frame(&frame, &params);
        assert_relative_eq!(blob[[0, 0, 0, 0]], 0.0);
        assert_relative_eq!(blob[[0, 0, 0, 1]], 0.0);
        assert_relative_eq!(blob[[0, 0, 0, 2]], 255.0);
        assert_relative_eq!(blob[[0, 0, 3, 3]], 255.0);
    }
}
