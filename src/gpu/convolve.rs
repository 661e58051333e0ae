// gpu/convolve.rs — GPU 3×3 edge-detection convolution.
//
// Mirrors `convolution::convolve_scalar` with one work-item per output
// pixel. Buffers, not textures: the host image is already a flat row-major
// f32 slice, so two storage buffers plus a tiny uniform carry the whole
// contract (input, output, width, height) with no stride compaction.
//
// OUTPUT ZEROING INVARIANT
// ─────────────────────────
// Border work-items return without writing, so border slots of the output
// buffer are never touched by the shader. wgpu zero-initializes buffers on
// creation, and the host-side result image starts zero-initialized before
// the copy-back, so the border reads back as exactly 0.0 on every path.
// This is a required invariant of the engine contract, not an optimization.
//
// PIPELINE LIFETIME
// ─────────────────
// `GpuConvolution::new` compiles the shader — expensive. Create it once
// (outside the timed region) and call `convolve` per run; the per-run cost
// is buffer allocation, dispatch, and the blocking readback.

use wgpu::util::DeviceExt;

use crate::convolution::{ConvolutionEngine, EngineError};
use crate::gpu::device::{GpuDevice, GpuError};
use crate::image::Image;

// ---------------------------------------------------------------------------
// Uniform params (must match the WGSL struct Params exactly)
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Params {
    width: u32,
    height: u32,
}

// ---------------------------------------------------------------------------
// GpuConvolution
// ---------------------------------------------------------------------------

/// Compiled compute pipeline for the fixed 3×3 stencil.
pub struct GpuConvolution {
    pipeline: wgpu::ComputePipeline,
    bgl: wgpu::BindGroupLayout,
}

impl GpuConvolution {
    /// Compile `convolve.wgsl` for the selected device and build the
    /// pipeline.
    ///
    /// # Errors
    /// [`GpuError::Compile`] with the driver's diagnostic log if the
    /// shader fails to build. A compile failure is fatal for the run;
    /// there is no fallback to the scalar engine.
    pub fn new(gpu: &GpuDevice) -> Result<Self, GpuError> {
        // Bake the workgroup dimensions into the source; naga does not yet
        // support `override` expressions inside @workgroup_size().
        let shader_src = include_str!("../shaders/convolve.wgsl")
            .replace("{{WG_X}}", &gpu.workgroup_size.x.to_string())
            .replace("{{WG_Y}}", &gpu.workgroup_size.y.to_string());

        let shader = compile_shader(gpu, &shader_src)?;

        let bgl = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("convolve BGL"),
            entries: &[
                // Binding 0 — input pixels (read-only storage)
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Binding 1 — output pixels (storage, written by interior
                // work-items only)
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Binding 2 — width/height uniform
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout =
            gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("convolve pipeline layout"),
                bind_group_layouts: &[&bgl],
                push_constant_ranges: &[],
            });

        let pipeline =
            gpu.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("convolve"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: "convolve",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            });

        Ok(GpuConvolution { pipeline, bgl })
    }

    /// Apply the stencil on the device and read the result back.
    ///
    /// Procedure: allocate the input buffer (copied from the host image)
    /// and a zero-initialized output buffer, bind (input, output,
    /// width/height), enqueue one 2D grid dispatch sized to cover every
    /// pixel, block until completion, and copy the output buffer back into
    /// a zero-initialized host image.
    ///
    /// Behaviorally identical to `convolve_scalar` for every interior
    /// pixel; border pixels are 0.0.
    pub fn convolve(&self, gpu: &GpuDevice, input: &Image<f32>) -> Result<Image<f32>, GpuError> {
        let width = input.width() as u32;
        let height = input.height() as u32;

        // Zero-sized bindings are invalid in wgpu; an empty image has no
        // pixels to compute anyway.
        if width == 0 || height == 0 {
            return Ok(Image::new(input.width(), input.height()));
        }

        let buffer_size = (width as u64) * (height as u64) * 4;

        let input_buf = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("convolve input"),
            contents: bytemuck::cast_slice(input.as_slice()),
            usage: wgpu::BufferUsages::STORAGE,
        });

        // wgpu guarantees new buffers are zeroed, so slots the shader never
        // writes (the border) read back as 0.0.
        let output_buf = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("convolve output"),
            size: buffer_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let params = Params { width, height };
        let params_buf = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("convolve params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let readback_buf = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("convolve readback"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("convolve bind group"),
            layout: &self.bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: input_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: output_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: params_buf.as_entire_binding() },
            ],
        });

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("GpuConvolution::convolve"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("convolve"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);

            let (dx, dy) = gpu.dispatch_size(width, height);
            pass.dispatch_workgroups(dx, dy, 1);
        }
        encoder.copy_buffer_to_buffer(&output_buf, 0, &readback_buf, 0, buffer_size);
        gpu.queue.submit(std::iter::once(encoder.finish()));

        // Block until the dispatch and the copy complete, then map.
        let buf_slice = readback_buf.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buf_slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).expect("readback channel closed");
        });
        gpu.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .expect("readback callback never fired")
            .map_err(GpuError::Readback)?;

        // Host image starts zero-initialized; the mapped range overwrites
        // it with the device contents (border slots are zero there too).
        let mut out = Image::new(input.width(), input.height());
        {
            let mapped = buf_slice.get_mapped_range();
            out.as_mut_slice().copy_from_slice(bytemuck::cast_slice(&mapped));
        }
        readback_buf.unmap();

        Ok(out)
    }
}

/// Create a shader module, surfacing build diagnostics as [`GpuError::Compile`].
///
/// wgpu reports shader build failures through validation error scopes
/// rather than a return value; the scope capture is what lets the driver
/// log reach the caller verbatim.
fn compile_shader(gpu: &GpuDevice, source: &str) -> Result<wgpu::ShaderModule, GpuError> {
    gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);
    let shader = gpu.device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("convolve.wgsl"),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    if let Some(err) = pollster::block_on(gpu.device.pop_error_scope()) {
        return Err(GpuError::Compile(err.to_string()));
    }
    Ok(shader)
}

// ---------------------------------------------------------------------------
// GpuEngine
// ---------------------------------------------------------------------------

/// The data-parallel engine: an owned device context plus the compiled
/// pipeline, behind the shared [`ConvolutionEngine`] interface.
///
/// Device buffers live only inside a single `convolve` call and are
/// released before it returns; the context itself is released when the
/// engine drops.
pub struct GpuEngine {
    gpu: GpuDevice,
    pipeline: GpuConvolution,
}

impl GpuEngine {
    /// Compile the stencil program for an opened device.
    pub fn new(gpu: GpuDevice) -> Result<Self, GpuError> {
        let pipeline = GpuConvolution::new(&gpu)?;
        Ok(GpuEngine { gpu, pipeline })
    }

    /// The device this engine is bound to.
    pub fn device(&self) -> &GpuDevice {
        &self.gpu
    }
}

impl ConvolutionEngine for GpuEngine {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn convolve(&self, input: &Image<f32>) -> Result<Image<f32>, EngineError> {
        Ok(self.pipeline.convolve(&self.gpu, input)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
