//! Functions for calculating the byte layout of block linear surfaces.
//!
//! Sizes are always in bytes and include the padding GOBs the hardware
//! requires on the right, bottom, and depth edges of a surface. The swizzled
//! size of a surface is therefore at least as large as its tightly packed
//! pitch-linear size.
use crate::{
    align_up, div_round_up, BlockDepth, BlockHeight, Dimensions, FormatBlock,
    GOB_HEIGHT_IN_LINES, GOB_SIZE_IN_BYTES, GOB_WIDTH_IN_BYTES,
};

/// The layout of a single mip level inside a block linear surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipLevelLayout {
    /// The dimensions of this level in texels.
    pub dimensions: Dimensions,

    /// The tightly packed size of this level in its own format.
    pub linear_size: usize,

    /// The tightly packed size of this level in the target format, used when
    /// a compressed surface is viewed through a decompressed format.
    /// Equal to [Self::linear_size] when no target format is given.
    pub target_linear_size: usize,

    /// The swizzled size of this level including padding GOBs.
    pub block_linear_size: usize,

    /// The GOB block height of this level after collapsing.
    pub block_height: BlockHeight,

    /// The GOB block depth of this level after collapsing.
    pub block_depth: BlockDepth,
}

/// Calculates the size in bytes of a single layer of a block linear surface
/// without mipmaps.
///
/// # Examples
/**
```rust
use gm20b_dma::{BlockDepth, BlockHeight, Dimensions, FormatBlock};
use gm20b_dma::layout::block_linear_layer_size;

// A 128x16 R8G8B8A8 surface with 16 line blocks packs without padding.
assert_eq!(
    8192,
    block_linear_layer_size(
        Dimensions::new(128, 16, 1),
        FormatBlock::uncompressed(4),
        BlockHeight::Two,
        BlockDepth::One,
    )
);
```
*/
pub fn block_linear_layer_size(
    dimensions: Dimensions,
    format: FormatBlock,
    block_height: BlockHeight,
    block_depth: BlockDepth,
) -> usize {
    // The width of a ROB line in format blocks and in bytes including padding.
    let rob_line_width = div_round_up(dimensions.width, format.width);
    let rob_line_bytes = align_up(rob_line_width * format.bytes_per_block, GOB_WIDTH_IN_BYTES);

    let rob_height = GOB_HEIGHT_IN_LINES * block_height as usize;
    let surface_height_lines = div_round_up(dimensions.height, format.height);
    // The height of the surface in ROBs including the padding ROB.
    let surface_height_robs = div_round_up(surface_height_lines, rob_height);

    // The depth of the surface in slices, aligned to include padding Z-axis GOBs.
    let rob_depth = align_up(dimensions.depth, block_depth as usize);

    rob_line_bytes * rob_height * surface_height_robs * rob_depth
}

/// Calculates the GOB block dimension for a surface of `surface_gobs` GOBs.
///
/// Small mip levels can't fill large blocks, so the hardware rounds the block
/// dimension down to the smallest power of two GOB count that still contains
/// the surface.
pub fn calculate_block_gobs(block_gobs: usize, surface_gobs: usize) -> usize {
    if surface_gobs > block_gobs {
        block_gobs
    } else {
        surface_gobs.next_power_of_two()
    }
}

/// Calculates the size in bytes of a full mip chain of a block linear surface.
///
/// When `is_multi_layer` is set, the total is aligned so every layer of an
/// array texture starts on a block boundary of the level 0 block
/// configuration.
pub fn block_linear_surface_size(
    dimensions: Dimensions,
    format: FormatBlock,
    block_height: BlockHeight,
    block_depth: BlockDepth,
    level_count: usize,
    is_multi_layer: bool,
) -> usize {
    // The size of the surface in GOBs on every axis.
    let mut gobs_width = div_round_up(
        div_round_up(dimensions.width, format.width) * format.bytes_per_block,
        GOB_WIDTH_IN_BYTES,
    );
    let mut gobs_height = div_round_up(
        div_round_up(dimensions.height, format.height),
        GOB_HEIGHT_IN_LINES,
    );
    let mut gobs_depth = dimensions.depth;

    let mut gob_block_height = block_height as usize;
    let mut gob_block_depth = block_depth as usize;

    // Layer alignment uses the level 0 block configuration before collapsing.
    let layer_alignment = GOB_SIZE_IN_BYTES * block_height as usize * block_depth as usize;

    let mut total_size = 0;
    for _ in 0..level_count {
        total_size += (GOB_WIDTH_IN_BYTES * gobs_width)
            * (GOB_HEIGHT_IN_LINES * align_up(gobs_height, gob_block_height))
            * align_up(gobs_depth, gob_block_depth);

        // Successively divide every dimension by 2 until the final level is reached.
        gobs_width = std::cmp::max(gobs_width / 2, 1);
        gobs_height = std::cmp::max(gobs_height / 2, 1);
        gobs_depth = std::cmp::max(gobs_depth / 2, 1);

        gob_block_height = calculate_block_gobs(gob_block_height, gobs_height);
        gob_block_depth = calculate_block_gobs(gob_block_depth, gobs_depth);
    }

    if is_multi_layer {
        align_up(total_size, layer_alignment)
    } else {
        total_size
    }
}

/// Calculates the layout of every mip level of a block linear surface.
///
/// `target_format` describes the format a compressed surface is decompressed
/// into. Pass [None] when the surface is only viewed in its own format.
pub fn block_linear_mip_layout(
    dimensions: Dimensions,
    format: FormatBlock,
    target_format: Option<FormatBlock>,
    block_height: BlockHeight,
    block_depth: BlockDepth,
    level_count: usize,
) -> Vec<MipLevelLayout> {
    let mut mip_levels = Vec::with_capacity(level_count);

    let mut gobs_width = div_round_up(
        div_round_up(dimensions.width, format.width) * format.bytes_per_block,
        GOB_WIDTH_IN_BYTES,
    );
    let mut gobs_height = div_round_up(
        div_round_up(dimensions.height, format.height),
        GOB_HEIGHT_IN_LINES,
    );
    // A GOB is always a single slice deep, so the surface depth in GOBs is
    // the depth dimension itself.

    let mut gob_block_height = block_height as usize;
    let mut gob_block_depth = block_depth as usize;

    let mut dimensions = dimensions;
    for _ in 0..level_count {
        let linear_size = div_round_up(dimensions.width, format.width)
            * format.bytes_per_block
            * div_round_up(dimensions.height, format.height)
            * dimensions.depth;
        let target_linear_size = match target_format {
            Some(target) => {
                div_round_up(dimensions.width, target.width)
                    * target.bytes_per_block
                    * div_round_up(dimensions.height, target.height)
                    * dimensions.depth
            }
            None => linear_size,
        };

        mip_levels.push(MipLevelLayout {
            dimensions,
            linear_size,
            target_linear_size,
            block_linear_size: (GOB_WIDTH_IN_BYTES * gobs_width)
                * (GOB_HEIGHT_IN_LINES * align_up(gobs_height, gob_block_height))
                * align_up(dimensions.depth, gob_block_depth),
            block_height: BlockHeight::new(gob_block_height).unwrap(),
            block_depth: BlockDepth::new(gob_block_depth).unwrap(),
        });

        gobs_width = std::cmp::max(gobs_width / 2, 1);
        gobs_height = std::cmp::max(gobs_height / 2, 1);

        dimensions.width = std::cmp::max(dimensions.width / 2, 1);
        dimensions.height = std::cmp::max(dimensions.height / 2, 1);
        dimensions.depth = std::cmp::max(dimensions.depth / 2, 1);

        gob_block_height = calculate_block_gobs(gob_block_height, gobs_height);
        gob_block_depth = calculate_block_gobs(gob_block_depth, dimensions.depth);
    }

    mip_levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_size_rgba8_packed() {
        // Two ROBs tall and two blocks wide with no padding in any dimension.
        assert_eq!(
            128 * 16 * 4,
            block_linear_layer_size(
                Dimensions::new(128, 16, 1),
                FormatBlock::uncompressed(4),
                BlockHeight::Two,
                BlockDepth::One,
            )
        );
    }

    #[test]
    fn layer_size_rgba8_block16() {
        assert_eq!(
            1048576,
            block_linear_layer_size(
                Dimensions::new(512, 512, 1),
                FormatBlock::uncompressed(4),
                BlockHeight::Sixteen,
                BlockDepth::One,
            )
        );
    }

    #[test]
    fn layer_size_bc7_block16() {
        assert_eq!(
            163840,
            block_linear_layer_size(
                Dimensions::new(320, 320, 1),
                FormatBlock::block_4x4(16),
                BlockHeight::Sixteen,
                BlockDepth::One,
            )
        );
        assert_eq!(
            1024,
            block_linear_layer_size(
                Dimensions::new(32, 32, 1),
                FormatBlock::block_4x4(16),
                BlockHeight::One,
                BlockDepth::One,
            )
        );
    }

    #[test]
    fn layer_size_3d() {
        assert_eq!(
            16384,
            block_linear_layer_size(
                Dimensions::new(16, 16, 16),
                FormatBlock::uncompressed(4),
                BlockHeight::One,
                BlockDepth::One,
            )
        );
    }

    #[test]
    fn layer_size_width_padding() {
        // 65 texels at 1 byte each require two GOBs per ROB line.
        assert_eq!(
            2 * 512,
            block_linear_layer_size(
                Dimensions::new(65, 8, 1),
                FormatBlock::uncompressed(1),
                BlockHeight::One,
                BlockDepth::One,
            )
        );
    }

    #[test]
    fn layer_size_monotonic() {
        let size = |w, h, d| {
            block_linear_layer_size(
                Dimensions::new(w, h, d),
                FormatBlock::uncompressed(4),
                BlockHeight::Four,
                BlockDepth::One,
            )
        };
        for dim in 1..96 {
            assert!(size(dim, 32, 1) <= size(dim + 1, 32, 1));
            assert!(size(32, dim, 1) <= size(32, dim + 1, 1));
            assert!(size(32, 32, dim) <= size(32, 32, dim + 1));
        }
    }

    #[test]
    fn block_gobs_collapse() {
        assert_eq!(8, calculate_block_gobs(8, 32));
        assert_eq!(8, calculate_block_gobs(8, 8));
        assert_eq!(4, calculate_block_gobs(8, 3));
        assert_eq!(1, calculate_block_gobs(8, 1));
        assert_eq!(1, calculate_block_gobs(8, 0));

        for block in [1usize, 2, 4, 8, 16, 32] {
            for surface in 0..80 {
                let gobs = calculate_block_gobs(block, surface);
                assert!(gobs.is_power_of_two());
                assert!(gobs <= block);
                assert!(gobs >= std::cmp::min(block, surface));
            }
        }
    }

    #[test]
    fn surface_size_mip_chain_collapses() {
        // Level sizes: 262144, 65536, 16384, 4096, 1024.
        // The block height collapses from 4 to 2 for the final level.
        assert_eq!(
            349184,
            block_linear_surface_size(
                Dimensions::new(256, 256, 1),
                FormatBlock::uncompressed(4),
                BlockHeight::Four,
                BlockDepth::One,
                5,
                false,
            )
        );
    }

    #[test]
    fn surface_size_multi_layer_alignment() {
        // Levels of 1024 and 512 bytes with a layer alignment of 1024.
        let unaligned = block_linear_surface_size(
            Dimensions::new(16, 16, 1),
            FormatBlock::uncompressed(4),
            BlockHeight::Two,
            BlockDepth::One,
            2,
            false,
        );
        let aligned = block_linear_surface_size(
            Dimensions::new(16, 16, 1),
            FormatBlock::uncompressed(4),
            BlockHeight::Two,
            BlockDepth::One,
            2,
            true,
        );
        assert_eq!(1536, unaligned);
        assert_eq!(2048, aligned);
    }

    #[test]
    fn mip_layout_sizes_match_surface_size() {
        let cases = [
            (Dimensions::new(256, 256, 1), FormatBlock::uncompressed(4), BlockHeight::Four, BlockDepth::One, 5),
            (Dimensions::new(100, 80, 1), FormatBlock::block_4x4(16), BlockHeight::Eight, BlockDepth::One, 6),
            (Dimensions::new(64, 64, 48), FormatBlock::uncompressed(1), BlockHeight::One, BlockDepth::Sixteen, 4),
            (Dimensions::new(1, 1, 1), FormatBlock::uncompressed(16), BlockHeight::ThirtyTwo, BlockDepth::One, 1),
            (Dimensions::new(320, 128, 1), FormatBlock::block_4x4(8), BlockHeight::Sixteen, BlockDepth::One, 9),
        ];
        for (dimensions, format, block_height, block_depth, levels) in cases {
            let mip_levels = block_linear_mip_layout(
                dimensions,
                format,
                None,
                block_height,
                block_depth,
                levels,
            );
            assert_eq!(levels, mip_levels.len());

            let mip_sum: usize = mip_levels.iter().map(|m| m.block_linear_size).sum();
            assert_eq!(
                block_linear_surface_size(dimensions, format, block_height, block_depth, levels, false),
                mip_sum,
            );
        }
    }

    #[test]
    fn mip_layout_block_heights_collapse() {
        let mip_levels = block_linear_mip_layout(
            Dimensions::new(256, 256, 1),
            FormatBlock::uncompressed(4),
            None,
            BlockHeight::Four,
            BlockDepth::One,
            5,
        );
        let block_heights: Vec<_> = mip_levels.iter().map(|m| m.block_height).collect();
        assert_eq!(
            vec![
                BlockHeight::Four,
                BlockHeight::Four,
                BlockHeight::Four,
                BlockHeight::Four,
                BlockHeight::Two,
            ],
            block_heights
        );
    }

    #[test]
    fn mip_layout_linear_sizes() {
        let mip_levels = block_linear_mip_layout(
            Dimensions::new(256, 256, 1),
            FormatBlock::block_4x4(16),
            Some(FormatBlock::uncompressed(4)),
            BlockHeight::Sixteen,
            BlockDepth::One,
            3,
        );

        assert_eq!(64 * 64 * 16, mip_levels[0].linear_size);
        assert_eq!(256 * 256 * 4, mip_levels[0].target_linear_size);

        assert_eq!(Dimensions::new(128, 128, 1), mip_levels[1].dimensions);
        assert_eq!(32 * 32 * 16, mip_levels[1].linear_size);
        assert_eq!(128 * 128 * 4, mip_levels[1].target_linear_size);

        assert_eq!(16 * 16 * 16, mip_levels[2].linear_size);
    }
}
