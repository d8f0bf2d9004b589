use std::iter::once;
use std::sync::Mutex;

use log::{debug, warn};
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};
use thiserror::Error;
use wgpu::{BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingResource, BindingType, CommandEncoderDescriptor, CreateSurfaceError, Device, DeviceDescriptor, Extent3d, FragmentState, ImageCopyTexture, ImageDataLayout, include_wgsl, InstanceDescriptor, LoadOp, MultisampleState, Operations, Origin3d, PipelineLayoutDescriptor, PrimitiveState, Queue, RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor, RequestAdapterOptions, RequestDeviceError, ShaderStages, Surface, SurfaceError, Texture, TextureAspect, TextureDescriptor, TextureDimension, TextureFormat, TextureSampleType, TextureUsages, TextureViewDescriptor, TextureViewDimension, VertexState};

use crate::picture::{Bgra8, Frame};
use crate::session::MIN_FRAME_SIZE;

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("no compatible graphics adapter found")]
    NoAdapter,
    #[error("failed to open graphics device: {0}")]
    Device(#[from] RequestDeviceError),
    #[error("failed to create window surface: {0}")]
    Surface(#[from] CreateSurfaceError),
    #[error("window surface is not supported by the adapter")]
    UnsupportedSurface,
    #[error("out of graphics memory")]
    OutOfMemory,
}

/// Blits the shared frame onto the window surface.
pub struct Renderer {
    gpu: Gpu,
    surface: Surface,
    screen: Option<Screen>,
}

impl Renderer {
    pub fn new(gpu: Gpu, surface: Surface) -> Self {
        Renderer { gpu, surface, screen: None }
    }

    /// Reconfigures the surface and the frame texture. Degenerate sizes are
    /// skipped, nothing is drawn until a usable size arrives.
    pub fn surface_resize(&mut self, size: (u32, u32)) -> Result<(), GpuError> {
        let (width, height) = size;
        if width < MIN_FRAME_SIZE || height < MIN_FRAME_SIZE {
            self.screen = None;
            return Ok(());
        }

        let mut surface_config = self.surface.get_default_config(&self.gpu.adapter, width, height)
            .ok_or(GpuError::UnsupportedSurface)?;
        // pixels arrive gamma corrected already
        surface_config.format = surface_config.format.remove_srgb_suffix();
        self.surface.configure(&self.gpu.device, &surface_config);
        debug!(target: "app", "Surface: {:?}", surface_config);

        self.screen = Some(Screen::new(&self.gpu.device, surface_config.format, size));
        Ok(())
    }

    pub fn render(&self, frame: &Mutex<Frame>) -> Result<(), GpuError> {
        let Some(screen) = &self.screen else {
            return Ok(());
        };
        let target = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(SurfaceError::OutOfMemory) => return Err(GpuError::OutOfMemory),
            Err(err) => {
                warn!(target: "app", "Skipping presentation: {}", err);
                return Ok(());
            }
        };
        let target_view = target.texture.create_view(&TextureViewDescriptor::default());

        screen.upload(&self.gpu.queue, &frame.lock().expect("frame upload"));

        let mut encoder = self.gpu.device.create_command_encoder(&CommandEncoderDescriptor::default());
        {
            let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: None,
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &target_view,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color::BLACK),
                        store: true,
                    },
                    resolve_target: None,
                })],
                depth_stencil_attachment: None,
            });
            render_pass.set_pipeline(&screen.pipeline);
            render_pass.set_bind_group(0, &screen.bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        self.gpu.queue.submit(once(encoder.finish()));
        target.present();
        Ok(())
    }
}

/// Frame-sized texture plus the pipeline copying it onto the surface.
struct Screen {
    size: (u32, u32),
    texture: Texture,
    pipeline: RenderPipeline,
    bind_group: BindGroup,
}

impl Screen {
    fn new(device: &Device, format: TextureFormat, size: (u32, u32)) -> Self {
        let texture = device.create_texture(&TextureDescriptor {
            label: Some("frame"),
            size: frame_extent(size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: Bgra8::texture_format(),
            usage: TextureUsages::COPY_DST | TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("frame"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: false },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });
        let view = texture.create_view(&TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("frame"),
            layout: &layout,
            entries: &[BindGroupEntry { binding: 0, resource: BindingResource::TextureView(&view) }],
        });

        Screen {
            size,
            texture,
            pipeline: blit_pipeline(device, &layout, format),
            bind_group,
        }
    }

    /// Copies the frame into the texture, rows `stride` bytes apart. A frame of
    /// another size is still being reallocated and is skipped.
    fn upload(&self, queue: &Queue, frame: &Frame) {
        let size = (frame.width(), frame.height());
        if size != self.size {
            return;
        }
        queue.write_texture(
            ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                aspect: TextureAspect::All,
                origin: Origin3d::ZERO,
            },
            frame.bytes(),
            ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(frame.stride()),
                rows_per_image: Some(frame.height()),
            },
            frame_extent(size),
        );
    }
}

fn frame_extent((width, height): (u32, u32)) -> Extent3d {
    Extent3d { width, height, depth_or_array_layers: 1 }
}

fn blit_pipeline(device: &Device, bind_group_layout: &BindGroupLayout, format: TextureFormat) -> RenderPipeline {
    let module = device.create_shader_module(include_wgsl!("shader.wgsl"));
    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("blit"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("blit"),
        layout: Some(&layout),
        vertex: VertexState {
            module: &module,
            entry_point: "vertex_main",
            buffers: &[],
        },
        primitive: PrimitiveState::default(),
        depth_stencil: None,
        multisample: MultisampleState::default(),
        fragment: Some(FragmentState {
            module: &module,
            entry_point: "fragment_main",
            targets: &[Some(format.into())],
        }),
        multiview: None,
    })
}

pub struct Gpu {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: Device,
    queue: Queue,
}

impl Gpu {
    pub async fn new() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(InstanceDescriptor::default());
        let adapter = instance.request_adapter(&RequestAdapterOptions::default())
            .await
            .ok_or(GpuError::NoAdapter)?;
        let (device, queue) = adapter.request_device(&DeviceDescriptor::default(), None).await?;

        Ok(Gpu { instance, adapter, device, queue })
    }

    pub fn surface<R>(&self, raw: &R) -> Result<Surface, GpuError>
        where R: HasRawWindowHandle + HasRawDisplayHandle {
        // SAFETY: the window outlives the surface, both live until the event loop exits
        Ok(unsafe { self.instance.create_surface(raw) }?)
    }
}
