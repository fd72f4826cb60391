//! # gm20b_dma
//! gm20b_dma is a CPU implementation of the Tegra X1 (GM20B) block linear
//! texture layout and the Maxwell DMA copy engine that operates on it.
//!
//! The crate has three layers:
//! - [`layout`] computes byte sizes and per-mip descriptors for block linear
//!   surfaces.
//! - [`swizzle`] moves pixel data between pitch-linear and block linear
//!   memory, either for a whole surface or for a sub-rectangle of one.
//! - [`engine`] is the method-register front-end of the Maxwell DMA engine
//!   (class B0B5). Register writes accumulate in a flat register file and a
//!   write to the launch register classifies and performs the copy, then
//!   releases a semaphore through the guest address space.
//!
//! # Block Linear Swizzling
//! Block linear memory arranges bytes into 64x8 byte tiles called GOBs
//! ("groups of bytes"). GOBs stack vertically and in depth to form blocks,
//! and blocks are arranged linearly in row-major order across the surface.
//! The [`BlockHeight`] and [`BlockDepth`] parameters determine how many GOBs
//! form a block; the block width is fixed to a single GOB on the Tegra X1.
//!
//! # Getting Started
//! The following example swizzles a 64x64 R8G8B8A8 surface.
/*!
```rust
use gm20b_dma::{BlockDepth, BlockHeight, Dimensions, FormatBlock};
use gm20b_dma::layout::block_linear_layer_size;
use gm20b_dma::swizzle::copy_pitch_to_block_linear;

# fn main() -> Result<(), gm20b_dma::SwizzleError> {
let dimensions = Dimensions::new(64, 64, 1);
let format = FormatBlock::uncompressed(4);
let (block_height, block_depth) = (BlockHeight::Sixteen, BlockDepth::One);

let pitch = vec![0u8; 64 * 64 * 4];
let mut block_linear =
    vec![0u8; block_linear_layer_size(dimensions, format, block_height, block_depth)];
copy_pitch_to_block_linear(
    dimensions,
    format,
    0,
    block_height,
    block_depth,
    &pitch,
    &mut block_linear,
)?;
# Ok(())
# }
```
*/
pub mod engine;
pub mod layout;
pub mod swizzle;
pub mod syncpoint;

/// The width of a sector in bytes.
pub const SECTOR_WIDTH_IN_BYTES: usize = 16;

/// The height of a sector in lines.
pub const SECTOR_HEIGHT_IN_LINES: usize = 2;

/// The width of a GOB in bytes.
pub const GOB_WIDTH_IN_BYTES: usize = 64;

/// The height of a GOB in lines.
pub const GOB_HEIGHT_IN_LINES: usize = 8;

/// The size of a GOB in bytes. A GOB is always a single slice deep.
pub const GOB_SIZE_IN_BYTES: usize = GOB_WIDTH_IN_BYTES * GOB_HEIGHT_IN_LINES;

/// The number of lines of sectors inside a GOB.
pub const SECTOR_LINES_PER_GOB: usize =
    (GOB_WIDTH_IN_BYTES / SECTOR_WIDTH_IN_BYTES) * GOB_HEIGHT_IN_LINES;

/// The dimensions of a surface in texels. A depth of 1 denotes a 2D surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl Dimensions {
    pub const fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }
}

/// The compression block of a texture format together with its size in bytes.
///
/// Uncompressed formats use 1x1 blocks, so the bytes per block equal the bytes
/// per pixel. BCn formats use 4x4 blocks of 8 or 16 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatBlock {
    /// The width of the block in texels.
    pub width: usize,
    /// The height of the block in texels.
    pub height: usize,
    /// The size of the block in bytes. One of 1, 2, 4, 8, 12, or 16.
    pub bytes_per_block: usize,
}

impl FormatBlock {
    /// A 1x1 block for formats that do not use block compression like R8G8B8A8.
    pub const fn uncompressed(bytes_per_block: usize) -> Self {
        Self {
            width: 1,
            height: 1,
            bytes_per_block,
        }
    }

    /// A 4x4 compressed block. This includes any of the BCN formats like BC1, BC3, or BC7.
    pub const fn block_4x4(bytes_per_block: usize) -> Self {
        Self {
            width: 4,
            height: 4,
            bytes_per_block,
        }
    }
}

// Block height can only have certain values based on the Tegra TRM page 1189 table 79.

/// An enumeration of supported GOB block heights.
///
/// The DMA registers encode the block height using log2,
/// so a block height of 8 is encoded as 3. See [BlockHeight::from_log2].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum BlockHeight {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
    Sixteen = 16,
    ThirtyTwo = 32,
}

impl BlockHeight {
    /// Attempts to construct a block height from `value`.
    /// Returns [None] if `value` is not a supported block height.
    pub fn new(value: usize) -> Option<Self> {
        match value {
            1 => Some(BlockHeight::One),
            2 => Some(BlockHeight::Two),
            4 => Some(BlockHeight::Four),
            8 => Some(BlockHeight::Eight),
            16 => Some(BlockHeight::Sixteen),
            32 => Some(BlockHeight::ThirtyTwo),
            _ => None,
        }
    }

    /// Constructs a block height from the log2 encoding used by the DMA
    /// surface registers. Returns [None] for values above 5.
    pub fn from_log2(value: u32) -> Option<Self> {
        match value {
            0 => Some(BlockHeight::One),
            1 => Some(BlockHeight::Two),
            2 => Some(BlockHeight::Four),
            3 => Some(BlockHeight::Eight),
            4 => Some(BlockHeight::Sixteen),
            5 => Some(BlockHeight::ThirtyTwo),
            _ => None,
        }
    }
}

/// An enumeration of supported GOB block depths for 3D surfaces.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum BlockDepth {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
    Sixteen = 16,
    ThirtyTwo = 32,
}

impl BlockDepth {
    /// Attempts to construct a block depth from `value`.
    /// Returns [None] if `value` is not a supported block depth.
    pub fn new(value: usize) -> Option<Self> {
        match value {
            1 => Some(BlockDepth::One),
            2 => Some(BlockDepth::Two),
            4 => Some(BlockDepth::Four),
            8 => Some(BlockDepth::Eight),
            16 => Some(BlockDepth::Sixteen),
            32 => Some(BlockDepth::ThirtyTwo),
            _ => None,
        }
    }

    /// Constructs a block depth from the log2 encoding used by the DMA
    /// surface registers. Returns [None] for values above 5.
    pub fn from_log2(value: u32) -> Option<Self> {
        match value {
            0 => Some(BlockDepth::One),
            1 => Some(BlockDepth::Two),
            2 => Some(BlockDepth::Four),
            3 => Some(BlockDepth::Eight),
            4 => Some(BlockDepth::Sixteen),
            5 => Some(BlockDepth::ThirtyTwo),
            _ => None,
        }
    }
}

/// Errors that can occur while copying between pitch-linear and block linear memory.
#[derive(Debug, thiserror::Error)]
pub enum SwizzleError {
    /// The source or destination does not contain enough bytes for the
    /// described surface.
    #[error("not enough data, expected {expected_size} bytes but found {actual_size} bytes")]
    NotEnoughData {
        expected_size: usize,
        actual_size: usize,
    },

    /// The format block size is not one of 1, 2, 4, 8, 12, or 16 bytes.
    #[error("surfaces with {bytes_per_block} bytes per block are not supported")]
    UnsupportedBytesPerBlock { bytes_per_block: usize },

    /// The pitch rectangle does not fit inside the block linear surface at
    /// the given origin.
    #[error(
        "a {width}x{height} block rectangle at ({origin_x}, {origin_y}) exceeds \
         the {surface_width}x{surface_height} block surface"
    )]
    RectOutOfBounds {
        width: usize,
        height: usize,
        origin_x: usize,
        origin_y: usize,
        surface_width: usize,
        surface_height: usize,
    },
}

/// Calculates the division of `x` by `d` but rounds up rather than truncating.
#[inline]
pub const fn div_round_up(x: usize, d: usize) -> usize {
    (x + d - 1) / d
}

#[inline]
pub(crate) const fn align_up(x: usize, n: usize) -> usize {
    div_round_up(x, n) * n
}

#[inline]
pub(crate) const fn align_down(x: usize, n: usize) -> usize {
    (x / n) * n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gob_geometry() {
        assert_eq!(512, GOB_SIZE_IN_BYTES);
        assert_eq!(32, SECTOR_LINES_PER_GOB);
    }

    #[test]
    fn block_height_from_log2_values() {
        assert_eq!(Some(BlockHeight::One), BlockHeight::from_log2(0));
        assert_eq!(Some(BlockHeight::Sixteen), BlockHeight::from_log2(4));
        assert_eq!(Some(BlockHeight::ThirtyTwo), BlockHeight::from_log2(5));
        assert_eq!(None, BlockHeight::from_log2(6));
    }

    #[test]
    fn block_height_new_values() {
        assert_eq!(Some(BlockHeight::Eight), BlockHeight::new(8));
        assert_eq!(None, BlockHeight::new(5));
    }

    #[test]
    fn block_depth_new_values() {
        assert_eq!(Some(BlockDepth::Sixteen), BlockDepth::new(16));
        assert_eq!(None, BlockDepth::new(3));
    }

    #[test]
    fn align_helpers() {
        assert_eq!(2, div_round_up(8, 4));
        assert_eq!(3, div_round_up(10, 4));
        assert_eq!(64, align_up(1, 64));
        assert_eq!(0, align_down(63, 64));
        assert_eq!(128, align_down(191, 64));
    }
}
