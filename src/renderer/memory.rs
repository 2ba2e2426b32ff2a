use anyhow::anyhow;
use gfx_hal::{adapter::MemoryType, memory as m, prelude::*, Backend, MemoryTypeId};
use std::iter;
use std::mem::ManuallyDrop;
use std::ptr;

use super::buffer::Buffer;

/// Host-visible memory backing one buffer. The content is copied in once on
/// creation and never written again.
pub struct Memory<'a, B: Backend, T> {
    pub buffer: ManuallyDrop<Buffer<'a, B, T>>,
    memory: ManuallyDrop<B::Memory>,
}

impl<'a, B: Backend, T> Memory<'a, B, T> {
    pub fn new(mut buffer: Buffer<'a, B, T>, memory_types: &[MemoryType]) -> anyhow::Result<Self> {
        let memory = Self::upload(&mut buffer, memory_types)?;
        Ok(Memory {
            buffer: ManuallyDrop::new(buffer),
            memory: ManuallyDrop::new(memory),
        })
    }

    fn upload(buffer: &mut Buffer<'a, B, T>, memory_types: &[MemoryType]) -> anyhow::Result<B::Memory> {
        let device = buffer.device;
        unsafe {
            let buffer_req = device.get_buffer_requirements(&buffer.buf);
            let upload_type = Self::upload_type(memory_types, &buffer_req)?;
            let memory = device
                .allocate_memory(upload_type, buffer_req.size)
                .map_err(|e| anyhow!("can't allocate buffer memory: {:?}", e))?;
            device
                .bind_buffer_memory(&memory, 0, &mut buffer.buf)
                .map_err(|e| anyhow!("can't bind buffer memory: {:?}", e))?;
            let mapping = device
                .map_memory(&memory, m::Segment::ALL)
                .map_err(|e| anyhow!("can't map buffer memory: {:?}", e))?;
            ptr::copy_nonoverlapping(
                buffer.content.as_ptr() as *const u8,
                mapping,
                buffer.len as usize,
            );
            device
                .flush_mapped_memory_ranges(iter::once((&memory, m::Segment::ALL)))
                .map_err(|e| anyhow!("can't flush buffer memory: {:?}", e))?;
            device.unmap_memory(&memory);
            Ok(memory)
        }
    }

    fn upload_type(
        properties: &[MemoryType],
        buffer_req: &m::Requirements,
    ) -> anyhow::Result<MemoryTypeId> {
        properties
            .iter()
            .enumerate()
            .position(|(id, mem_type)| {
                buffer_req.type_mask & (1 << id) != 0
                    && mem_type.properties.contains(m::Properties::CPU_VISIBLE)
            })
            .map(MemoryTypeId::from)
            .ok_or_else(|| anyhow!("no CPU visible memory type for buffer"))
    }
}

impl<'a, B: Backend, T> Drop for Memory<'a, B, T> {
    fn drop(&mut self) {
        unsafe {
            let device = self.buffer.device;
            ManuallyDrop::drop(&mut self.buffer);
            device.free_memory(ManuallyDrop::into_inner(ptr::read(&self.memory)))
        }
    }
}
