use anyhow::anyhow;
use gfx_hal::{format as f, pass::Subpass, prelude::*, pso, Backend};
use std::iter;
use std::mem::{self, ManuallyDrop};
use std::ptr;

use super::shader::{ShaderError, ShaderStage};
use super::vertex::Vertex;

const ENTRY_NAME: &str = "main";

/// Size of the fragment uniform block holding `ourColor`.
pub const UNIFORM_SIZE: u32 = mem::size_of::<[f32; 4]>() as u32;

/// The linked shader program: graphics pipeline plus its layout.
pub struct Pipeline<'a, B: Backend> {
    device: &'a B::Device,
    pub pipeline: ManuallyDrop<B::GraphicsPipeline>,
    pub pipeline_layout: ManuallyDrop<B::PipelineLayout>,
}

impl<'a, B: Backend> Pipeline<'a, B> {
    pub fn new(
        device: &'a B::Device,
        vs_spirv: &[u32],
        fs_spirv: &[u32],
        render_pass: &B::RenderPass,
    ) -> anyhow::Result<Self> {
        let pipeline_layout = unsafe {
            device.create_pipeline_layout(
                iter::empty::<B::DescriptorSetLayout>(),
                &[(pso::ShaderStageFlags::FRAGMENT, 0..UNIFORM_SIZE)],
            )
        }
        .map_err(|e| anyhow!("can't create pipeline layout: {:?}", e))?;

        let linked = Self::link(device, vs_spirv, fs_spirv, render_pass, &pipeline_layout);
        match linked {
            Ok(pipeline) => Ok(Pipeline {
                device,
                pipeline: ManuallyDrop::new(pipeline),
                pipeline_layout: ManuallyDrop::new(pipeline_layout),
            }),
            Err(err) => {
                unsafe { device.destroy_pipeline_layout(pipeline_layout) };
                Err(err.into())
            }
        }
    }

    fn link(
        device: &B::Device,
        vs_spirv: &[u32],
        fs_spirv: &[u32],
        render_pass: &B::RenderPass,
        pipeline_layout: &B::PipelineLayout,
    ) -> Result<B::GraphicsPipeline, ShaderError> {
        let vs_module = Self::load_module(device, ShaderStage::Vertex, vs_spirv)?;
        let fs_module = match Self::load_module(device, ShaderStage::Fragment, fs_spirv) {
            Ok(module) => module,
            Err(err) => {
                unsafe { device.destroy_shader_module(vs_module) };
                return Err(err);
            }
        };

        let result = {
            let shader_entries = pso::GraphicsShaderSet {
                vertex: pso::EntryPoint {
                    entry: ENTRY_NAME,
                    module: &vs_module,
                    specialization: pso::Specialization::default(),
                },
                hull: None,
                domain: None,
                geometry: None,
                fragment: Some(pso::EntryPoint {
                    entry: ENTRY_NAME,
                    module: &fs_module,
                    specialization: pso::Specialization::default(),
                }),
            };

            let subpass = Subpass {
                index: 0,
                main_pass: render_pass,
            };

            let mut pipeline_desc = pso::GraphicsPipelineDesc::new(
                shader_entries,
                pso::Primitive::TriangleList,
                pso::Rasterizer::FILL,
                pipeline_layout,
                subpass,
            );
            pipeline_desc.blender.targets.push(pso::ColorBlendDesc {
                mask: pso::ColorMask::ALL,
                blend: None,
            });
            pipeline_desc.vertex_buffers.push(pso::VertexBufferDesc {
                binding: 0,
                stride: Vertex::STRIDE,
                rate: pso::VertexInputRate::Vertex,
            });
            pipeline_desc.attributes.push(pso::AttributeDesc {
                location: 0,
                binding: 0,
                element: pso::Element {
                    format: f::Format::Rgb32Sfloat,
                    offset: Vertex::POSITION_OFFSET,
                },
            });
            pipeline_desc.attributes.push(pso::AttributeDesc {
                location: 1,
                binding: 0,
                element: pso::Element {
                    format: f::Format::Rgb32Sfloat,
                    offset: Vertex::COLOR_OFFSET,
                },
            });

            unsafe { device.create_graphics_pipeline(&pipeline_desc, None) }
                .map_err(|e| ShaderError::link(format!("{:?}", e)))
        };

        // Stage modules are no longer needed once the pipeline exists.
        unsafe {
            device.destroy_shader_module(vs_module);
            device.destroy_shader_module(fs_module);
        }

        result
    }

    fn load_module(
        device: &B::Device,
        stage: ShaderStage,
        spirv: &[u32],
    ) -> Result<B::ShaderModule, ShaderError> {
        unsafe { device.create_shader_module(spirv) }
            .map_err(|e| ShaderError::compile(stage, format!("{:?}", e)))
    }
}

impl<'a, B: Backend> Drop for Pipeline<'a, B> {
    fn drop(&mut self) {
        unsafe {
            self.device
                .destroy_graphics_pipeline(ManuallyDrop::into_inner(ptr::read(&self.pipeline)));
            self.device
                .destroy_pipeline_layout(ManuallyDrop::into_inner(ptr::read(
                    &self.pipeline_layout,
                )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::UNIFORM_SIZE;

    #[test]
    fn uniform_block_is_one_vec4() {
        assert_eq!(UNIFORM_SIZE, 16);
        assert_eq!(UNIFORM_SIZE % 4, 0);
    }
}
