use std::iter::Sum;
use std::mem::size_of;
use std::ops::{Add, Div, Mul};

use bytemuck::checked::cast_slice_mut;
use bytemuck_derive::{Pod, Zeroable};
use log::debug;
use wgpu::{TextureFormat, COPY_BYTES_PER_ROW_ALIGNMENT};

/// Linear color, not clamped until it is quantized into a pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Sum for Color {
    fn sum<I: Iterator<Item=Self>>(iter: I) -> Self {
        iter.fold(Color::BLACK, |acc, color| acc + color)
    }
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Square-root gamma, an approximation of gamma 2 for display.
    pub fn gamma_corrected(self) -> Color {
        Color::new(self.r.max(0.0).sqrt(), self.g.max(0.0).sqrt(), self.b.max(0.0).sqrt())
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, rhs: Self) -> Self::Output {
        Color::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

/// Component-wise product, used to attenuate incoming light.
impl Mul for Color {
    type Output = Color;

    fn mul(self, rhs: Self) -> Self::Output {
        Color::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}

impl Mul<f32> for Color {
    type Output = Color;

    fn mul(self, rhs: f32) -> Self::Output {
        Color::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}

impl Mul<Color> for f32 {
    type Output = Color;

    fn mul(self, rhs: Color) -> Self::Output {
        rhs * self
    }
}

impl Div<f32> for Color {
    type Output = Color;

    fn div(self, rhs: f32) -> Self::Output {
        Color::new(self.r / rhs, self.g / rhs, self.b / rhs)
    }
}

/// Pixel in the byte order the presentation layer blits: blue, green, red, alpha.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Bgra8 {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

fn quantize(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

impl From<Color> for Bgra8 {
    fn from(value: Color) -> Self {
        Bgra8::new(quantize(value.r), quantize(value.g), quantize(value.b), u8::MAX)
    }
}

impl Bgra8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Bgra8 { b, g, r, a }
    }

    pub fn texture_format() -> TextureFormat {
        TextureFormat::Bgra8Unorm
    }
}

/// Shared pixel buffer. Rows are `stride` bytes apart, which is the row length
/// rounded up to the texture upload alignment.
pub struct Frame {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
    stride: u32,
}

impl Frame {
    /// Allocates a cleared frame.
    pub fn new(width: u32, height: u32) -> Self {
        let row_bytes = width * size_of::<Bgra8>() as u32;
        let stride = row_bytes.div_ceil(COPY_BYTES_PER_ROW_ALIGNMENT) * COPY_BYTES_PER_ROW_ALIGNMENT;
        let buffer = vec![0; stride as usize * height as usize];
        debug!(target: "app", "Allocating new frame. {}x{}, stride {}, {} bytes", width, height, stride, buffer.len());

        Frame { buffer, width, height, stride }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    fn row_range(&self, y: u32) -> std::ops::Range<usize> {
        let from = y as usize * self.stride as usize;
        from..from + self.width as usize * size_of::<Bgra8>()
    }

    #[cfg(test)]
    pub fn row(&self, y: u32) -> &[Bgra8] {
        bytemuck::checked::cast_slice(&self.buffer[self.row_range(y)])
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [Bgra8] {
        let range = self.row_range(y);
        cast_slice_mut(&mut self.buffer[range])
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }
}
