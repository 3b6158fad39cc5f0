//! The full-screen ray-tracing pipeline and its descriptor layout.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ash::vk;
use tracing::info;

use lumen_rhi::RhiResult;
use lumen_rhi::buffer::BufferUsage;
use lumen_rhi::descriptor::{self, DescriptorSetLayout};
use lumen_rhi::device::Device;
use lumen_rhi::pipeline::{CullMode, FrontFace, GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use lumen_rhi::shader::{Shader, ShaderStage};

/// Binding of [`FrameUniforms`](crate::gpu_layout::FrameUniforms).
pub const UNIFORM_BINDING: u32 = 0;
/// Binding of [`SceneGpu`](crate::gpu_layout::SceneGpu).
pub const SCENE_BINDING: u32 = 1;

pub const VERTEX_SHADER_FILE: &str = "raytracer.vert.spv";
pub const FRAGMENT_SHADER_FILE: &str = "raytracer.frag.spv";

/// Vertices drawn per frame: one triangle that covers the screen.
pub const FULLSCREEN_VERTEX_COUNT: u32 = 3;

/// Bindings of the per-slot descriptor set. Both are read by the fragment
/// stage only.
pub fn frame_bindings() -> [vk::DescriptorSetLayoutBinding<'static>; 2] {
    [
        descriptor::buffer_binding(
            UNIFORM_BINDING,
            BufferUsage::Uniform,
            vk::ShaderStageFlags::FRAGMENT,
        ),
        descriptor::buffer_binding(
            SCENE_BINDING,
            BufferUsage::Storage,
            vk::ShaderStageFlags::FRAGMENT,
        ),
    ]
}

/// Creates the per-slot descriptor set layout.
pub fn create_frame_descriptor_layout(device: Arc<Device>) -> RhiResult<DescriptorSetLayout> {
    DescriptorSetLayout::new(device, &frame_bindings())
}

/// Pipeline plus layout for the full-screen pass.
///
/// Viewport and scissor are dynamic, so only a change of color format
/// requires a new one.
pub struct FullscreenPipeline {
    pipeline: Pipeline,
    layout: PipelineLayout,
    shader_dir: PathBuf,
}

impl FullscreenPipeline {
    /// Loads the shaders from `shader_dir` and builds the pipeline for
    /// `color_format`.
    ///
    /// # Errors
    ///
    /// - [`RhiError::ShaderCompile`](lumen_rhi::RhiError::ShaderCompile) for
    ///   missing or malformed SPIR-V.
    /// - [`RhiError::PipelineCreate`](lumen_rhi::RhiError::PipelineCreate)
    ///   when the driver rejects the pipeline.
    pub fn build(
        device: Arc<Device>,
        color_format: vk::Format,
        set_layout: &DescriptorSetLayout,
        shader_dir: &Path,
    ) -> RhiResult<Self> {
        let vertex_shader = Shader::from_spirv_file(
            device.clone(),
            &shader_dir.join(VERTEX_SHADER_FILE),
            ShaderStage::Vertex,
            "main",
        )?;
        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            &shader_dir.join(FRAGMENT_SHADER_FILE),
            ShaderStage::Fragment,
            "main",
        )?;

        let layout = PipelineLayout::new(device.clone(), &[set_layout.handle()], &[])?;

        let pipeline = GraphicsPipelineBuilder::new()
            .vertex_shader(&vertex_shader)
            .fragment_shader(&fragment_shader)
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .cull_mode(CullMode::Back)
            .front_face(FrontFace::Clockwise)
            .color_attachment_format(color_format)
            .build(device, &layout)?;

        info!("Full-screen pipeline ready for {:?}", color_format);

        Ok(Self {
            pipeline,
            layout,
            shader_dir: shader_dir.to_path_buf(),
        })
    }

    #[inline]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    #[inline]
    pub fn layout(&self) -> &PipelineLayout {
        &self.layout
    }

    /// Directory the shaders were loaded from.
    #[inline]
    pub fn shader_dir(&self) -> &Path {
        &self.shader_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_bindings() {
        let [uniform, scene] = frame_bindings();

        assert_eq!(uniform.binding, 0);
        assert_eq!(uniform.descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(uniform.stage_flags, vk::ShaderStageFlags::FRAGMENT);

        assert_eq!(scene.binding, 1);
        assert_eq!(scene.descriptor_type, vk::DescriptorType::STORAGE_BUFFER);
        assert_eq!(scene.stage_flags, vk::ShaderStageFlags::FRAGMENT);
    }
}
