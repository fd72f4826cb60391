//! The method register front-end of the Maxwell DMA engine (class B0B5).
//!
//! The command processor forwards method writes to [MaxwellDma::call_method].
//! Writes accumulate in the register file until the launch register is
//! written, which classifies the copy from the launch flags, resolves guest
//! addresses through the channel's address space, performs the copy, and
//! releases a semaphore.
//!
//! Each channel owns an independent engine instance. All methods of one
//! instance arrive serialized from its command processor, so nothing here is
//! synchronized.
use std::sync::Arc;

use tracing::{debug, error, trace, warn};

use crate::{
    align_down,
    layout::block_linear_layer_size,
    swizzle,
    syncpoint::Syncpoints,
    BlockDepth, BlockHeight, Dimensions, FormatBlock,
};

pub mod registers;

pub use registers::{
    method, LaunchDma, MemoryLayout, Registers, SemaphoreType, Surface, REGISTER_COUNT,
};

/// A contiguous region of host memory backing part of a guest range.
///
/// Spans index the host storage of the [ChannelContext] that produced them
/// and are only valid until the next address space mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSpan {
    pub offset: usize,
    pub len: usize,
}

/// The collaborators of one channel the DMA engine copies through.
pub trait ChannelContext {
    /// Flushes pending GPU command recording. Returns once all prior GPU work
    /// observable to this channel is complete.
    fn submit(&mut self);

    /// Copies `size` bytes between two guest virtual address ranges through
    /// the GPU interconnect.
    fn copy(&mut self, dst_addr: u64, src_addr: u64, size: u64);

    /// Translates a guest virtual address range into host spans. A result
    /// with more than one span means the range is split across host mappings.
    fn translate_range(&mut self, addr: u64, size: usize) -> Vec<HostSpan>;

    /// Borrows the host bytes of a span returned by [Self::translate_range].
    fn span(&self, span: HostSpan) -> &[u8];

    /// Mutably borrows the host bytes of a span.
    fn span_mut(&mut self, span: HostSpan) -> &mut [u8];

    /// Writes a little endian 64-bit word through the guest address space.
    fn write_u64(&mut self, addr: u64, value: u64);

    /// The current GPU timestamp in hardware ticks.
    fn gpu_time_ticks(&self) -> u64;
}

/// One instance of the Maxwell DMA engine.
pub struct MaxwellDma<C> {
    registers: Registers,
    channel: C,
    /// Host1x syncpoints of the SoC. Carried for syncpoint based releases,
    /// which the copy path does not use.
    #[allow(dead_code)]
    syncpoints: Arc<Syncpoints>,
}

impl<C: ChannelContext> MaxwellDma<C> {
    pub fn new(channel: C, syncpoints: Arc<Syncpoints>) -> Self {
        Self {
            registers: Registers::new(),
            channel,
            syncpoints,
        }
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Stores `argument` at `method`, launching the copy when `method` is the
    /// launch register.
    pub fn call_method(&mut self, method: u32, argument: u32) {
        trace!("called method: 0x{:X} args: 0x{:X}", method, argument);

        self.handle_method(method, argument);
    }

    /// Applies every argument to the same non incrementing `method` in order.
    /// Each write may trigger a launch.
    pub fn call_method_batch_non_inc(&mut self, method: u32, arguments: &[u32]) {
        for &argument in arguments {
            self.handle_method(method, argument);
        }
    }

    fn handle_method(&mut self, method: u32, argument: u32) {
        if method as usize >= REGISTER_COUNT {
            error!("method out of range: 0x{:X}", method);
            return;
        }

        self.registers.write(method, argument);

        if method == method::LAUNCH_DMA {
            self.launch_dma();
        }
    }

    fn launch_dma(&mut self) {
        if self.registers.launch_dma().remap_enable() {
            warn!("remapped DMA copies are unimplemented");
        } else {
            self.dma_copy();
        }

        self.release_semaphore();
    }

    fn dma_copy(&mut self) {
        let launch = self.registers.launch_dma();

        if launch.multi_line_enable() {
            // The copy reads guest memory on the CPU, so prior GPU work has
            // to land first.
            self.channel.submit();

            if launch.src_memory_layout() == launch.dst_memory_layout() {
                if launch.src_memory_layout() == MemoryLayout::Pitch {
                    self.copy_pitch_to_pitch();
                } else {
                    warn!("block linear to block linear DMA copies are unimplemented");
                }
            } else if launch.src_memory_layout() == MemoryLayout::BlockLinear {
                self.copy_block_linear_to_pitch();
            } else {
                self.copy_pitch_to_block_linear();
            }
        } else {
            // 1D copy.
            debug!(
                "src: 0x{:X} dst: 0x{:X} size: 0x{:X}",
                self.registers.offset_in(),
                self.registers.offset_out(),
                self.registers.line_length_in()
            );

            self.channel.copy(
                self.registers.offset_out(),
                self.registers.offset_in(),
                u64::from(self.registers.line_length_in()),
            );
        }
    }

    fn copy_pitch_to_pitch(&mut self) {
        let pitch_in = self.registers.pitch_in();
        let pitch_out = self.registers.pitch_out();
        let line_length = self.registers.line_length_in();
        let line_count = self.registers.line_count();

        if pitch_in == pitch_out && pitch_in == line_length {
            // Both sides are contiguous, copy as is.
            self.channel.copy(
                self.registers.offset_out(),
                self.registers.offset_in(),
                u64::from(line_length) * u64::from(line_count),
            );
        } else {
            for line in 0..u64::from(line_count) {
                self.channel.copy(
                    self.registers.offset_out() + line * u64::from(pitch_out),
                    self.registers.offset_in() + line * u64::from(pitch_in),
                    u64::from(line_length),
                );
            }
        }
    }

    fn copy_block_linear_to_pitch(&mut self) {
        let surface = self.registers.src_surface();
        let Some((block_height, block_depth)) = decode_block_size(&surface) else {
            return;
        };

        let src_dimensions = Dimensions::new(
            surface.width as usize,
            surface.height as usize,
            surface.depth as usize,
        );
        let format = FormatBlock::uncompressed(1);
        let src_layer_stride =
            block_linear_layer_size(src_dimensions, format, block_height, block_depth);
        let src_layer_address =
            self.registers.offset_in() + u64::from(surface.layer) * src_layer_stride as u64;

        let src_spans = self
            .channel
            .translate_range(self.registers.offset_in(), src_layer_stride);

        // Without remapping there is only a single byte per pixel.
        let dst_dimensions = Dimensions::new(
            self.registers.line_length_in() as usize,
            self.registers.line_count() as usize,
            surface.depth as usize,
        );
        let dst_size =
            self.registers.pitch_out() as usize * dst_dimensions.height * dst_dimensions.depth;

        let dst_spans = self
            .channel
            .translate_range(self.registers.offset_out(), dst_size);

        if src_spans.len() != 1 || dst_spans.len() != 1 {
            warn!("DMA copies for split surfaces are unimplemented");
            return;
        }

        debug!(
            "{}x{}@0x{:X} -> {}x{}@0x{:X}",
            src_dimensions.width,
            src_dimensions.height,
            src_layer_address,
            dst_dimensions.width,
            dst_dimensions.height,
            self.registers.offset_out()
        );

        let source = self.channel.span(src_spans[0]).to_vec();
        let destination = self.channel.span_mut(dst_spans[0]);

        let result = if subrect_copy_required(&surface, src_dimensions.width, dst_dimensions.width)
        {
            swizzle::copy_block_linear_to_pitch_subrect(
                dst_dimensions,
                src_dimensions,
                format,
                self.registers.pitch_out(),
                block_height,
                block_depth,
                &source,
                destination,
                surface.origin_x,
                surface.origin_y,
            )
        } else {
            swizzle::copy_block_linear_to_pitch(
                dst_dimensions,
                format,
                self.registers.pitch_out(),
                block_height,
                block_depth,
                &source,
                destination,
            )
        };
        if let Err(err) = result {
            warn!("block linear to pitch copy failed: {}", err);
        }
    }

    fn copy_pitch_to_block_linear(&mut self) {
        let surface = self.registers.dst_surface();
        let Some((block_height, block_depth)) = decode_block_size(&surface) else {
            return;
        };

        // Without remapping there is only a single byte per pixel.
        let src_dimensions = Dimensions::new(
            self.registers.line_length_in() as usize,
            self.registers.line_count() as usize,
            surface.depth as usize,
        );
        let src_size =
            self.registers.pitch_in() as usize * src_dimensions.height * src_dimensions.depth;

        let src_spans = self
            .channel
            .translate_range(self.registers.offset_in(), src_size);

        let dst_dimensions = Dimensions::new(
            surface.width as usize,
            surface.height as usize,
            surface.depth as usize,
        );
        let format = FormatBlock::uncompressed(1);
        let dst_layer_stride =
            block_linear_layer_size(dst_dimensions, format, block_height, block_depth);
        let dst_layer_address =
            self.registers.offset_out() + u64::from(surface.layer) * dst_layer_stride as u64;

        let dst_spans = self
            .channel
            .translate_range(self.registers.offset_out(), dst_layer_stride);

        if src_spans.len() != 1 || dst_spans.len() != 1 {
            warn!("DMA copies for split surfaces are unimplemented");
            return;
        }

        debug!(
            "{}x{}@0x{:X} -> {}x{}@0x{:X}",
            src_dimensions.width,
            src_dimensions.height,
            self.registers.offset_in(),
            dst_dimensions.width,
            dst_dimensions.height,
            dst_layer_address
        );

        let source = self.channel.span(src_spans[0]).to_vec();
        let destination = self.channel.span_mut(dst_spans[0]);

        let result = if subrect_copy_required(&surface, src_dimensions.width, dst_dimensions.width)
        {
            swizzle::copy_pitch_to_block_linear_subrect(
                src_dimensions,
                dst_dimensions,
                format,
                self.registers.pitch_in(),
                block_height,
                block_depth,
                &source,
                destination,
                surface.origin_x,
                surface.origin_y,
            )
        } else {
            swizzle::copy_pitch_to_block_linear(
                src_dimensions,
                format,
                self.registers.pitch_in(),
                block_height,
                block_depth,
                &source,
                destination,
            )
        };
        if let Err(err) = result {
            warn!("pitch to block linear copy failed: {}", err);
        }
    }

    fn release_semaphore(&mut self) {
        let launch = self.registers.launch_dma();
        if launch.reduction_enable() {
            warn!("semaphore reduction is unimplemented");
        }

        let address = self.registers.semaphore_address();
        let payload = u64::from(self.registers.semaphore_payload());
        match launch.semaphore_type() {
            SemaphoreType::ReleaseOneWordSemaphore => {
                self.channel.write_u64(address, payload);
                debug!("address: 0x{:X} payload: {}", address, payload);
            }
            SemaphoreType::ReleaseFourWordSemaphore => {
                // The timestamp has to land before the payload, guests poll
                // the payload and then read the timestamp.
                let timestamp = self.channel.gpu_time_ticks();
                self.channel.write_u64(address + 8, timestamp);
                self.channel.write_u64(address, payload);
                debug!(
                    "address: 0x{:X} payload: {} timestamp: {}",
                    address, payload, timestamp
                );
            }
            SemaphoreType::None => {}
        }
    }
}

/// Decodes the block configuration of a surface, rejecting geometry the
/// Tegra X1 can't express.
fn decode_block_size(surface: &Surface) -> Option<(BlockHeight, BlockDepth)> {
    if surface.block_size.width() != 1 {
        error!(
            "block linear surfaces with a non-one block width are unsupported on the Tegra X1: {}",
            surface.block_size.width()
        );
        return None;
    }

    let block_height = BlockHeight::from_log2(surface.block_size.height_log2());
    let block_depth = BlockDepth::from_log2(surface.block_size.depth_log2());
    match (block_height, block_depth) {
        (Some(block_height), Some(block_depth)) => Some((block_height, block_depth)),
        _ => {
            error!(
                "unsupported GOB block dimensions: {}x{}",
                surface.block_size.height(),
                surface.block_size.depth()
            );
            None
        }
    }
}

/// Whether the pitch texture only covers a window of the block linear
/// surface, requiring origin adjusted addressing.
fn subrect_copy_required(surface: &Surface, src_width: usize, dst_width: usize) -> bool {
    align_down(src_width, 64) != align_down(dst_width, 64)
        || surface.origin_x != 0
        || surface.origin_y != 0
}
