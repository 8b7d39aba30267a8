//! Tight RGBA8 texture readback.

use aft_common::GpuError;
use futures_intrusive::channel::shared::oneshot_channel;

/// Align a row length to WebGPU's copy row alignment (256 bytes).
fn align_bpr(value: usize) -> usize {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    value.div_ceil(align) * align
}

/// Copy an RGBA8 texture into a tightly packed CPU buffer (row padding removed).
pub fn read_texture_tight(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    src: &wgpu::Texture,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, GpuError> {
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }

    let tight_bpr = 4 * width as usize;
    let padded_bpr = align_bpr(tight_bpr);
    let buffer_size = (padded_bpr * height as usize) as wgpu::BufferAddress;

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("afterimage.readback.staging"),
        size: buffer_size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("afterimage.readback.encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture: src,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr as u32),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );

    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (sender, receiver) = oneshot_channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    pollster::block_on(receiver.receive())
        .ok_or_else(|| GpuError::TransferFailed("map_async callback channel dropped".into()))?
        .map_err(|e| GpuError::TransferFailed(e.to_string()))?;

    let data = slice.get_mapped_range();
    let mut tight = vec![0u8; tight_bpr * height as usize];
    for row in 0..height as usize {
        let src_offset = row * padded_bpr;
        let dst_offset = row * tight_bpr;
        tight[dst_offset..dst_offset + tight_bpr]
            .copy_from_slice(&data[src_offset..src_offset + tight_bpr]);
    }
    drop(data);
    staging.unmap();

    Ok(tight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_alignment() {
        assert_eq!(align_bpr(4), 256);
        assert_eq!(align_bpr(256), 256);
        assert_eq!(align_bpr(1024 * 4 + 4), 4352);
    }
}
