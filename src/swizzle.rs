//! Functions for copying pixel data between pitch-linear and block linear memory.
//!
//! The address of a byte inside a block linear surface interleaves bits of
//! its X, Y, and Z coordinates across four stages: the sector inside a GOB,
//! the GOB inside a block, the block inside a ROB, and the ROB inside the
//! surface. The copies here walk the pitch-linear side in order and compute
//! the swizzled address for every element, recomputing only the X dependent
//! stages inside the innermost loop.
//!
//! The element width is widened whenever the row width allows it so the inner
//! loop moves up to 16 bytes at a time. Widening never changes the bytes
//! produced, only how many the inner loop moves per iteration.
use crate::{
    align_down, align_up, div_round_up, layout::block_linear_layer_size, BlockDepth, BlockHeight,
    Dimensions, FormatBlock, SwizzleError, GOB_HEIGHT_IN_LINES, GOB_SIZE_IN_BYTES,
    GOB_WIDTH_IN_BYTES,
};

/// Copies a whole block linear surface into a pitch-linear buffer.
///
/// A `pitch` of 0 uses tightly packed rows.
///
/// # Examples
/**
```rust
use gm20b_dma::{BlockDepth, BlockHeight, Dimensions, FormatBlock};
use gm20b_dma::layout::block_linear_layer_size;
use gm20b_dma::swizzle::copy_block_linear_to_pitch;

# fn main() -> Result<(), gm20b_dma::SwizzleError> {
let dimensions = Dimensions::new(128, 128, 1);
let format = FormatBlock::block_4x4(16);
let (block_height, block_depth) = (BlockHeight::Four, BlockDepth::One);

let block_linear =
    vec![0u8; block_linear_layer_size(dimensions, format, block_height, block_depth)];
let mut pitch = vec![0u8; 32 * 32 * 16];
copy_block_linear_to_pitch(
    dimensions,
    format,
    0,
    block_height,
    block_depth,
    &block_linear,
    &mut pitch,
)?;
# Ok(())
# }
```
*/
pub fn copy_block_linear_to_pitch(
    dimensions: Dimensions,
    format: FormatBlock,
    pitch: u32,
    block_height: BlockHeight,
    block_depth: BlockDepth,
    block_linear: &[u8],
    pitch_dst: &mut [u8],
) -> Result<(), SwizzleError> {
    copy_block_linear::<true>(
        dimensions,
        dimensions,
        format,
        pitch,
        block_height,
        block_depth,
        0,
        0,
        block_linear,
        pitch_dst,
    )
}

/// Copies a pitch-linear buffer into a whole block linear surface.
///
/// A `pitch` of 0 uses tightly packed rows.
pub fn copy_pitch_to_block_linear(
    dimensions: Dimensions,
    format: FormatBlock,
    pitch: u32,
    block_height: BlockHeight,
    block_depth: BlockDepth,
    pitch_src: &[u8],
    block_linear: &mut [u8],
) -> Result<(), SwizzleError> {
    copy_block_linear::<false>(
        dimensions,
        dimensions,
        format,
        pitch,
        block_height,
        block_depth,
        0,
        0,
        pitch_src,
        block_linear,
    )
}

/// Copies part of a block linear surface into a pitch-linear buffer.
///
/// The pitch texture covers the window of the block linear surface starting
/// at `(origin_x, origin_y)` texels, so `pitch_dimensions` must fit inside
/// `block_linear_dimensions` after offsetting by the origin.
pub fn copy_block_linear_to_pitch_subrect(
    pitch_dimensions: Dimensions,
    block_linear_dimensions: Dimensions,
    format: FormatBlock,
    pitch: u32,
    block_height: BlockHeight,
    block_depth: BlockDepth,
    block_linear: &[u8],
    pitch_dst: &mut [u8],
    origin_x: u32,
    origin_y: u32,
) -> Result<(), SwizzleError> {
    copy_block_linear::<true>(
        pitch_dimensions,
        block_linear_dimensions,
        format,
        pitch,
        block_height,
        block_depth,
        origin_x,
        origin_y,
        block_linear,
        pitch_dst,
    )
}

/// Copies a pitch-linear buffer into part of a block linear surface.
///
/// Only bytes inside the window starting at `(origin_x, origin_y)` texels are
/// written. The surrounding bytes of the block linear surface are untouched.
pub fn copy_pitch_to_block_linear_subrect(
    pitch_dimensions: Dimensions,
    block_linear_dimensions: Dimensions,
    format: FormatBlock,
    pitch: u32,
    block_height: BlockHeight,
    block_depth: BlockDepth,
    pitch_src: &[u8],
    block_linear: &mut [u8],
    origin_x: u32,
    origin_y: u32,
) -> Result<(), SwizzleError> {
    copy_block_linear::<false>(
        pitch_dimensions,
        block_linear_dimensions,
        format,
        pitch,
        block_height,
        block_depth,
        origin_x,
        origin_y,
        pitch_src,
        block_linear,
    )
}

/// Copies rows from a strided guest buffer into a tightly packed buffer.
pub fn copy_pitch_linear_to_linear(
    height: usize,
    row_bytes: usize,
    stride: usize,
    pitch_src: &[u8],
    linear_dst: &mut [u8],
) -> Result<(), SwizzleError> {
    check_length(pitch_src.len(), strided_size(height, stride, row_bytes))?;
    check_length(linear_dst.len(), height * row_bytes)?;

    for line in 0..height {
        linear_dst[line * row_bytes..(line + 1) * row_bytes]
            .copy_from_slice(&pitch_src[line * stride..line * stride + row_bytes]);
    }
    Ok(())
}

/// Copies rows from a tightly packed buffer into a strided guest buffer.
pub fn copy_linear_to_pitch_linear(
    height: usize,
    row_bytes: usize,
    stride: usize,
    linear_src: &[u8],
    pitch_dst: &mut [u8],
) -> Result<(), SwizzleError> {
    check_length(linear_src.len(), height * row_bytes)?;
    check_length(pitch_dst.len(), strided_size(height, stride, row_bytes))?;

    for line in 0..height {
        pitch_dst[line * stride..line * stride + row_bytes]
            .copy_from_slice(&linear_src[line * row_bytes..(line + 1) * row_bytes]);
    }
    Ok(())
}

/// The loop bounds and strides shared by every element width.
struct CopyGeometry {
    /// Elements per row after widening.
    width: usize,
    /// Rows per slice in format blocks.
    height: usize,
    slices: usize,
    /// X of the window origin in bytes from the left edge of the surface.
    origin_x_bytes: usize,
    /// Y of the window origin in format block rows.
    origin_y: usize,
    /// Bytes per ROB line of the block linear surface including padding.
    aligned_row_bytes: usize,
    /// Stride between pitch rows in bytes.
    pitch_bytes: usize,
    /// Lines per ROB.
    rob_height: usize,
    /// Slices per block including depth padding.
    aligned_depth: usize,
    /// Bytes the block linear base advances per slice.
    slice_stride: usize,
    /// Bytes per block column spanning the aligned depth.
    block_size: usize,
}

/// Copies between a pitch buffer and a window of a block linear surface.
///
/// `DESWIZZLE` selects the direction: the block linear side is the source
/// when set and the destination otherwise. The full surface copies are the
/// window at the origin covering the whole surface.
#[allow(clippy::too_many_arguments)]
fn copy_block_linear<const DESWIZZLE: bool>(
    pitch_dimensions: Dimensions,
    block_linear_dimensions: Dimensions,
    format: FormatBlock,
    pitch: u32,
    block_height: BlockHeight,
    block_depth: BlockDepth,
    origin_x: u32,
    origin_y: u32,
    source: &[u8],
    destination: &mut [u8],
) -> Result<(), SwizzleError> {
    if !matches!(format.bytes_per_block, 1 | 2 | 4 | 8 | 12 | 16) {
        return Err(SwizzleError::UnsupportedBytesPerBlock {
            bytes_per_block: format.bytes_per_block,
        });
    }

    let mut width = div_round_up(pitch_dimensions.width, format.width);
    let width_bytes = width * format.bytes_per_block;

    let surface_width = div_round_up(block_linear_dimensions.width, format.width);
    let surface_height = div_round_up(block_linear_dimensions.height, format.height);
    let aligned_row_bytes = align_up(
        surface_width * format.bytes_per_block,
        GOB_WIDTH_IN_BYTES,
    );

    let origin_x_blocks = div_round_up(origin_x as usize, format.width);
    let origin_x_bytes = origin_x_blocks * format.bytes_per_block;
    let origin_y = div_round_up(origin_y as usize, format.height);

    let height = div_round_up(pitch_dimensions.height, format.height);
    if origin_x_blocks + width > surface_width || origin_y + height > surface_height {
        return Err(SwizzleError::RectOutOfBounds {
            width,
            height,
            origin_x: origin_x_blocks,
            origin_y,
            surface_width,
            surface_height,
        });
    }

    // Widen the element until a 16 byte element no longer divides both the
    // row and the window origin evenly. A misaligned origin would split an
    // element across two sectors. Three channel 32-bit formats can never
    // widen cleanly.
    let mut bytes_per_block = format.bytes_per_block;
    if bytes_per_block != 12 {
        while bytes_per_block != 16
            && width_bytes % (bytes_per_block * 2) == 0
            && origin_x_bytes % (bytes_per_block * 2) == 0
        {
            width /= 2;
            bytes_per_block *= 2;
        }
    }

    let rob_height = block_height as usize * GOB_HEIGHT_IN_LINES;
    let aligned_depth = align_up(block_linear_dimensions.depth, block_depth as usize);
    let pitch_bytes = if pitch != 0 { pitch as usize } else { width_bytes };

    let geometry = CopyGeometry {
        width,
        height,
        slices: block_linear_dimensions.depth,
        origin_x_bytes,
        origin_y,
        aligned_row_bytes,
        pitch_bytes,
        rob_height,
        aligned_depth,
        slice_stride: GOB_SIZE_IN_BYTES * block_height as usize,
        block_size: rob_height * GOB_WIDTH_IN_BYTES * aligned_depth,
    };

    let pitch_size = strided_size(height * geometry.slices, pitch_bytes, width_bytes);
    let block_linear_size = block_linear_layer_size(
        block_linear_dimensions,
        format,
        block_height,
        block_depth,
    );
    let (source_size, destination_size) = if DESWIZZLE {
        (block_linear_size, pitch_size)
    } else {
        (pitch_size, block_linear_size)
    };
    check_length(source.len(), source_size)?;
    check_length(destination.len(), destination_size)?;

    match bytes_per_block {
        1 => copy_elements::<DESWIZZLE, 1>(&geometry, source, destination),
        2 => copy_elements::<DESWIZZLE, 2>(&geometry, source, destination),
        4 => copy_elements::<DESWIZZLE, 4>(&geometry, source, destination),
        8 => copy_elements::<DESWIZZLE, 8>(&geometry, source, destination),
        12 => copy_elements::<DESWIZZLE, 12>(&geometry, source, destination),
        16 => copy_elements::<DESWIZZLE, 16>(&geometry, source, destination),
        _ => unreachable!("widening only produces supported element sizes"),
    }
    Ok(())
}

/// The monomorphized inner loop for a single element width.
fn copy_elements<const DESWIZZLE: bool, const BPB: usize>(
    geometry: &CopyGeometry,
    source: &[u8],
    destination: &mut [u8],
) {
    let mut pitch_offset = 0;
    for slice in 0..geometry.slices {
        let slice_offset = slice * geometry.slice_stride;
        for line in 0..geometry.height {
            let y = geometry.origin_y + line;
            let rob_offset =
                geometry.aligned_row_bytes * align_down(y, geometry.rob_height) * geometry.aligned_depth;
            let gob_line = (y & (geometry.rob_height - 1)) / GOB_HEIGHT_IN_LINES;
            // Y offset of the GOB inside the block, then of the line inside the GOB.
            let gob_y_offset =
                gob_line * GOB_SIZE_IN_BYTES + (((y & 0x07) >> 1) << 6) + ((y & 0x01) << 4);

            let line_offset = slice_offset + rob_offset + gob_y_offset;

            for pixel in 0..geometry.width {
                let x_bytes = geometry.origin_x_bytes + pixel * BPB;
                let block_offset = (x_bytes / GOB_WIDTH_IN_BYTES) * geometry.block_size;
                let gob_x_offset =
                    (((x_bytes & 0x3F) >> 5) << 8) + (((x_bytes & 0x1F) >> 4) << 5) + (x_bytes & 0x0F);

                let swizzled = line_offset + block_offset + gob_x_offset;
                let deswizzled = pitch_offset + pixel * BPB;

                if DESWIZZLE {
                    destination[deswizzled..deswizzled + BPB]
                        .copy_from_slice(&source[swizzled..swizzled + BPB]);
                } else {
                    destination[swizzled..swizzled + BPB]
                        .copy_from_slice(&source[deswizzled..deswizzled + BPB]);
                }
            }

            pitch_offset += geometry.pitch_bytes;
        }
    }
}

/// The minimum buffer size for `rows` rows of `row_bytes` at `stride`.
fn strided_size(rows: usize, stride: usize, row_bytes: usize) -> usize {
    if rows == 0 {
        0
    } else {
        (rows - 1) * stride + row_bytes
    }
}

fn check_length(actual_size: usize, expected_size: usize) -> Result<(), SwizzleError> {
    if actual_size < expected_size {
        return Err(SwizzleError::NotEnoughData {
            expected_size,
            actual_size,
        });
    }
    Ok(())
}
