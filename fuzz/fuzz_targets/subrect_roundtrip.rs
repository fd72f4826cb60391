#![no_main]
use libfuzzer_sys::fuzz_target;

extern crate arbitrary;
use arbitrary::{Arbitrary, Result, Unstructured};

extern crate rand;
use rand::{rngs::StdRng, Rng, SeedableRng};

use gm20b_dma::layout::block_linear_layer_size;
use gm20b_dma::swizzle::{
    copy_block_linear_to_pitch_subrect, copy_pitch_to_block_linear_subrect,
};
use gm20b_dma::{BlockDepth, BlockHeight, Dimensions, FormatBlock};

#[derive(Debug)]
struct Input {
    surface_width: usize,
    surface_height: usize,
    rect_width: usize,
    rect_height: usize,
    origin_x: u32,
    origin_y: u32,
    block_height: BlockHeight,
    bytes_per_block: usize,
}

impl<'a> Arbitrary<'a> for Input {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        Ok(Input {
            surface_width: u.int_in_range(1..=512)?,
            surface_height: u.int_in_range(1..=512)?,
            rect_width: u.int_in_range(1..=512)?,
            rect_height: u.int_in_range(1..=512)?,
            origin_x: u.int_in_range(0..=512)?,
            origin_y: u.int_in_range(0..=512)?,
            block_height: u.arbitrary()?,
            bytes_per_block: *u.choose(&[1, 2, 4, 8, 12, 16])?,
        })
    }
}

fuzz_target!(|input: Input| {
    let surface_dimensions = Dimensions::new(input.surface_width, input.surface_height, 1);
    let rect_dimensions = Dimensions::new(input.rect_width, input.rect_height, 1);
    let format = FormatBlock::uncompressed(input.bytes_per_block);

    let rect_size = input.rect_width * input.rect_height * input.bytes_per_block;
    let seed = [13u8; 32];
    let mut rng: StdRng = SeedableRng::from_seed(seed);
    let rect: Vec<_> = (0..rect_size)
        .map(|_| rng.gen_range::<u8, _>(0..=255))
        .collect();

    let mut surface = vec![
        0u8;
        block_linear_layer_size(surface_dimensions, format, input.block_height, BlockDepth::One)
    ];

    // Rectangles that don't fit return an error and must never panic.
    let written = copy_pitch_to_block_linear_subrect(
        rect_dimensions,
        surface_dimensions,
        format,
        0,
        input.block_height,
        BlockDepth::One,
        &rect,
        &mut surface,
        input.origin_x,
        input.origin_y,
    );
    if written.is_err() {
        return;
    }

    let mut read_back = vec![0u8; rect_size];
    copy_block_linear_to_pitch_subrect(
        rect_dimensions,
        surface_dimensions,
        format,
        0,
        input.block_height,
        BlockDepth::One,
        &surface,
        &mut read_back,
        input.origin_x,
        input.origin_y,
    )
    .unwrap();

    if rect != read_back {
        panic!("Subrect write then read is not 1:1");
    }
});
