#![no_main]
use libfuzzer_sys::fuzz_target;

extern crate arbitrary;
use arbitrary::{Arbitrary, Result, Unstructured};

use gm20b_dma::layout::{block_linear_mip_layout, block_linear_surface_size};
use gm20b_dma::{BlockDepth, BlockHeight, Dimensions, FormatBlock};

#[derive(Debug)]
struct Input {
    width: usize,
    height: usize,
    depth: usize,
    block_width: usize,
    block_height: usize,
    bytes_per_block: usize,
    gob_block_height: BlockHeight,
    gob_block_depth: BlockDepth,
    level_count: usize,
}

impl<'a> Arbitrary<'a> for Input {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        Ok(Input {
            width: u.int_in_range(0..=4096)?,
            height: u.int_in_range(0..=4096)?,
            depth: u.int_in_range(0..=256)?,
            block_width: u.int_in_range(1..=16)?,
            block_height: u.int_in_range(1..=16)?,
            bytes_per_block: *u.choose(&[1, 2, 4, 8, 12, 16])?,
            gob_block_height: u.arbitrary()?,
            gob_block_depth: u.arbitrary()?,
            level_count: u.int_in_range(0..=17)?,
        })
    }
}

fuzz_target!(|input: Input| {
    let dimensions = Dimensions::new(input.width, input.height, input.depth);
    let format = FormatBlock {
        width: input.block_width,
        height: input.block_height,
        bytes_per_block: input.bytes_per_block,
    };

    // The per level descriptors always account for the same bytes as the
    // whole chain.
    let mip_levels = block_linear_mip_layout(
        dimensions,
        format,
        None,
        input.gob_block_height,
        input.gob_block_depth,
        input.level_count,
    );
    let mip_sum: usize = mip_levels.iter().map(|m| m.block_linear_size).sum();

    let surface_size = block_linear_surface_size(
        dimensions,
        format,
        input.gob_block_height,
        input.gob_block_depth,
        input.level_count,
        false,
    );

    if mip_sum != surface_size {
        panic!("Mip level layouts disagree with the surface size");
    }
});
