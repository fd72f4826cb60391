#![no_main]
use libfuzzer_sys::fuzz_target;

extern crate arbitrary;
use arbitrary::{Arbitrary, Result, Unstructured};

extern crate rand;
use rand::{rngs::StdRng, Rng, SeedableRng};

use gm20b_dma::layout::block_linear_layer_size;
use gm20b_dma::swizzle::{copy_block_linear_to_pitch, copy_pitch_to_block_linear};
use gm20b_dma::{BlockDepth, BlockHeight, Dimensions, FormatBlock};

#[derive(Debug)]
struct Input {
    width: usize,
    height: usize,
    depth: usize,
    block_height: BlockHeight,
    block_depth: BlockDepth,
    bytes_per_block: usize,
}

impl<'a> Arbitrary<'a> for Input {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        Ok(Input {
            width: u.int_in_range(1..=256)?,
            height: u.int_in_range(1..=256)?,
            depth: u.int_in_range(1..=16)?,
            block_height: u.arbitrary()?,
            block_depth: u.arbitrary()?,
            bytes_per_block: *u.choose(&[1, 2, 4, 8, 12, 16])?,
        })
    }
}

fuzz_target!(|input: Input| {
    let dimensions = Dimensions::new(input.width, input.height, input.depth);
    let format = FormatBlock::uncompressed(input.bytes_per_block);

    let linear_size = input.width * input.height * input.depth * input.bytes_per_block;
    let seed = [13u8; 32];
    let mut rng: StdRng = SeedableRng::from_seed(seed);
    let linear: Vec<_> = (0..linear_size)
        .map(|_| rng.gen_range::<u8, _>(0..=255))
        .collect();

    let mut swizzled = vec![
        0u8;
        block_linear_layer_size(dimensions, format, input.block_height, input.block_depth)
    ];
    copy_pitch_to_block_linear(
        dimensions,
        format,
        0,
        input.block_height,
        input.block_depth,
        &linear,
        &mut swizzled,
    )
    .unwrap();

    let mut deswizzled = vec![0u8; linear_size];
    copy_block_linear_to_pitch(
        dimensions,
        format,
        0,
        input.block_height,
        input.block_depth,
        &swizzled,
        &mut deswizzled,
    )
    .unwrap();

    if linear != deswizzled {
        panic!("Swizzle deswizzle is not 1:1");
    }
});
