use anyhow::anyhow;
use gfx_hal::{buffer, prelude::*, Backend, Limits};
use std::mem::{self, ManuallyDrop};
use std::ptr;

/// A device buffer sized for `content`, not yet bound to memory.
pub struct Buffer<'a, B: Backend, T> {
    pub device: &'a B::Device,
    pub buf: ManuallyDrop<B::Buffer>,
    pub content: &'a [T],
    pub len: u64,
}

impl<'a, B: Backend, T> Buffer<'a, B, T> {
    pub fn new(
        device: &'a B::Device,
        content: &'a [T],
        usage: buffer::Usage,
        limits: &Limits,
    ) -> anyhow::Result<Self> {
        let buffer_len = content.len() as u64 * mem::size_of::<T>() as u64;
        assert_ne!(buffer_len, 0);
        let memory_size = aligned_size(buffer_len, limits.non_coherent_atom_size as u64);

        let buf = unsafe { device.create_buffer(memory_size, usage) }
            .map_err(|e| anyhow!("can't create {:?} buffer: {:?}", usage, e))?;

        Ok(Buffer {
            device,
            buf: ManuallyDrop::new(buf),
            content,
            len: buffer_len,
        })
    }
}

fn aligned_size(len: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return len;
    }
    ((len + alignment - 1) / alignment) * alignment
}

impl<'a, B: Backend, T> Drop for Buffer<'a, B, T> {
    fn drop(&mut self) {
        unsafe {
            self.device
                .destroy_buffer(ManuallyDrop::into_inner(ptr::read(&self.buf)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::aligned_size;

    #[test]
    fn rounds_up_to_atom_size() {
        assert_eq!(aligned_size(72, 64), 128);
        assert_eq!(aligned_size(128, 64), 128);
        assert_eq!(aligned_size(12, 256), 256);
    }

    #[test]
    fn zero_alignment_keeps_length() {
        assert_eq!(aligned_size(12, 0), 12);
    }
}
