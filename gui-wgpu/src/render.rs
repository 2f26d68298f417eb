use std::sync::Arc;

use anyhow::Context;
use wgpu::util::DeviceExt;
use wgpu::StoreOp;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::frame::{CellInstance, Vertex};

const QUAD_VERTEX_COUNT: u32 = 6;
const UI_VERTEX_CAPACITY: usize = 4096;

const QUAD: [[f32; 2]; 6] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
const CELL_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![1 => Float32x2, 2 => Float32x2, 3 => Float32x3];
const UI_ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x3];

/// GPU side of the window: surface, pipelines and the buffers they draw from.
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    cell_pipeline: wgpu::RenderPipeline,
    ui_pipeline: wgpu::RenderPipeline,
    quad_buffer: wgpu::Buffer,
    cell_buffer: wgpu::Buffer,
    cell_capacity: usize,
    ui_buffer: wgpu::Buffer,
    ui_capacity: usize,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, cell_capacity: usize) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags: wgpu::InstanceFlags::from_env_or_default(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).context("create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("request adapter")?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::default(),
            })
            .await
            .context("request device")?;

        let capabilities = surface.get_capabilities(&adapter);
        let surface_format = capabilities
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .unwrap_or(capabilities.formats[0]);

        // frames are paced by the event loop, so plain vsync is enough
        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: capabilities.alpha_modes[0],
            desired_maximum_frame_latency: 2,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let cell_pipeline = create_pipeline(
            &device,
            &layout,
            &shader,
            surface_format,
            "cell_pipeline",
            "vs_cell",
            &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &QUAD_ATTRIBUTES,
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<CellInstance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &CELL_ATTRIBUTES,
                },
            ],
        );

        let ui_pipeline = create_pipeline(
            &device,
            &layout,
            &shader,
            surface_format,
            "ui_pipeline",
            "vs_ui",
            &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &UI_ATTRIBUTES,
            }],
        );

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_buffer"),
            contents: bytemuck::cast_slice(&QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let cell_capacity = cell_capacity.max(1);
        let cell_buffer = create_vertex_buffer::<CellInstance>(&device, "cell_buffer", cell_capacity);
        let ui_buffer = create_vertex_buffer::<Vertex>(&device, "ui_buffer", UI_VERTEX_CAPACITY);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            cell_pipeline,
            ui_pipeline,
            quad_buffer,
            cell_buffer,
            cell_capacity,
            ui_buffer,
            ui_capacity: UI_VERTEX_CAPACITY,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    fn ensure_cell_capacity(&mut self, required: usize) {
        if required <= self.cell_capacity {
            return;
        }
        self.cell_capacity = required.next_power_of_two();
        self.cell_buffer = create_vertex_buffer::<CellInstance>(&self.device, "cell_buffer", self.cell_capacity);
    }

    fn ensure_ui_capacity(&mut self, required: usize) {
        if required <= self.ui_capacity {
            return;
        }
        self.ui_capacity = required.next_power_of_two();
        self.ui_buffer = create_vertex_buffer::<Vertex>(&self.device, "ui_buffer", self.ui_capacity);
    }

    pub fn render(&mut self, cells: &[CellInstance], ui_vertices: &[Vertex]) -> Result<(), wgpu::SurfaceError> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost) => {
                self.surface.configure(&self.device, &self.config);
                self.surface.get_current_texture()?
            }
            Err(err) => return Err(err),
        };

        if !cells.is_empty() {
            self.ensure_cell_capacity(cells.len());
            self.queue.write_buffer(&self.cell_buffer, 0, bytemuck::cast_slice(cells));
        }

        if !ui_vertices.is_empty() {
            self.ensure_ui_capacity(ui_vertices.len());
            self.queue.write_buffer(&self.ui_buffer, 0, bytemuck::cast_slice(ui_vertices));
        }

        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("encoder") });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if !cells.is_empty() {
                pass.set_pipeline(&self.cell_pipeline);
                pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
                let cell_bytes = std::mem::size_of_val(cells) as u64;
                pass.set_vertex_buffer(1, self.cell_buffer.slice(0..cell_bytes));
                pass.draw(0..QUAD_VERTEX_COUNT, 0..cells.len() as u32);
            }

            if !ui_vertices.is_empty() {
                pass.set_pipeline(&self.ui_pipeline);
                let vertex_bytes = std::mem::size_of_val(ui_vertices) as u64;
                pass.set_vertex_buffer(0, self.ui_buffer.slice(0..vertex_bytes));
                pass.draw(0..ui_vertices.len() as u32, 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn create_vertex_buffer<T>(device: &wgpu::Device, label: &str, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (capacity * std::mem::size_of::<T>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    label: &str,
    vertex_entry: &str,
    buffers: &[wgpu::VertexBufferLayout<'_>],
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(vertex_entry),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
