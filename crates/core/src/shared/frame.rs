use ndarray::{ArrayView3, ArrayViewMut3};

enum Pixels<'a> {
    Borrowed(&'a mut [u8]),
    Owned(Vec<u8>),
}

/// A frame in the canonical layout: interleaved 3-channel BGR, row-major.
///
/// Either aliases a caller buffer (no copy) or owns the output of a color
/// conversion. Annotations are drawn straight into the pixel data.
pub struct Frame<'a> {
    pixels: Pixels<'a>,
    width: u32,
    height: u32,
}

impl<'a> Frame<'a> {
    pub const CHANNELS: u8 = 3;

    /// Wraps an existing BGR buffer without copying.
    pub fn borrowed(data: &'a mut [u8], width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            expected_len(width, height),
            "data length must equal width * height * 3"
        );
        Self {
            pixels: Pixels::Borrowed(data),
            width,
            height,
        }
    }

    pub fn owned(data: Vec<u8>, width: u32, height: u32) -> Frame<'static> {
        debug_assert_eq!(
            data.len(),
            expected_len(width, height),
            "data length must equal width * height * 3"
        );
        Frame {
            pixels: Pixels::Owned(data),
            width,
            height,
        }
    }

    pub fn data(&self) -> &[u8] {
        match &self.pixels {
            Pixels::Borrowed(data) => data,
            Pixels::Owned(data) => data,
        }
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        match &mut self.pixels {
            Pixels::Borrowed(data) => data,
            Pixels::Owned(data) => data,
        }
    }

    /// True when the frame aliases a caller-provided buffer.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.pixels, Pixels::Borrowed(_))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        Self::CHANNELS
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        let shape = self.shape();
        ArrayView3::from_shape(shape, self.data())
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        let shape = self.shape();
        ArrayViewMut3::from_shape(shape, self.data_mut())
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixel data into the front of `output`.
    ///
    /// `output` must hold at least `width * height * 3` bytes.
    pub fn copy_to(&self, output: &mut [u8]) {
        let data = self.data();
        output[..data.len()].copy_from_slice(data);
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            Self::CHANNELS as usize,
        )
    }
}

fn expected_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * Frame::CHANNELS as usize
}
