use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

use crate::diagnostics::DeviceError;
use crate::render::{BufferUsage, ShaderStage, Topology, Viewport};

use super::backend::{Backend, BufferDesc, BufferKind, PassDesc, PipelineDesc, ShaderDesc};

/// Buffer living in host memory.
#[derive(Debug)]
pub struct HeadlessBuffer {
    pub id: u64,
    pub kind: BufferKind,
    pub usage: BufferUsage,
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl HeadlessBuffer {
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.borrow().clone()
    }
}

#[derive(Debug)]
pub struct HeadlessShader {
    pub id: u64,
    pub stage: ShaderStage,
    pub entry_point: String,
}

#[derive(Debug)]
pub struct HeadlessPipeline {
    pub id: u64,
    pub topology: Topology,
    pub stride: u64,
    pub uses_uniforms: bool,
}

#[derive(Debug)]
pub struct HeadlessBinding {
    pub buffer_id: u64,
    bytes: Rc<RefCell<Vec<u8>>>,
}

/// A draw as the device saw it at submission time.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub pipeline_id: u64,
    pub topology: Topology,
    pub vertices: Range<u32>,
    pub viewport: Viewport,
    /// Snapshot of the whole vertex buffer.
    pub vertex_bytes: Vec<u8>,
    /// Snapshot of the bound uniform buffer.
    pub uniform_bytes: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPass {
    pub clear: Option<[f32; 4]>,
    pub draws: Vec<RecordedDraw>,
}

/// Device that executes nothing and records everything.
///
/// Buffer contents are kept as bytes and snapshotted into each recorded draw,
/// which makes ordering and discard behavior observable without a GPU.
/// Failures can be injected with [`HeadlessBackend::fail_next`].
#[derive(Debug)]
pub struct HeadlessBackend {
    size: (u32, u32),
    next_id: u64,
    passes: Vec<RecordedPass>,
    presents: Vec<u32>,
    writes: u64,
    pending_failure: Option<DeviceError>,
}

impl HeadlessBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            next_id: 0,
            passes: Vec::new(),
            presents: Vec::new(),
            writes: 0,
            pending_failure: None,
        }
    }

    /// Makes the next fallible device call return `err`.
    pub fn fail_next(&mut self, err: DeviceError) {
        self.pending_failure = Some(err);
    }

    pub fn passes(&self) -> &[RecordedPass] {
        &self.passes
    }

    /// All draws across every submitted pass, in submission order.
    pub fn draws(&self) -> impl Iterator<Item = &RecordedDraw> {
        self.passes.iter().flat_map(|p| p.draws.iter())
    }

    /// Vsync interval of every present call, in order.
    pub fn presents(&self) -> &[u32] {
        &self.presents
    }

    pub fn buffer_writes(&self) -> u64 {
        self.writes
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check(&mut self) -> Result<(), DeviceError> {
        match self.pending_failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl Backend for HeadlessBackend {
    type Buffer = HeadlessBuffer;
    type Shader = HeadlessShader;
    type Pipeline = HeadlessPipeline;
    type Binding = HeadlessBinding;

    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<HeadlessBuffer, DeviceError> {
        self.check()?;

        let bytes = match desc.contents {
            Some(contents) => contents.to_vec(),
            None => vec![0; desc.size as usize],
        };

        Ok(HeadlessBuffer {
            id: self.next_id(),
            kind: desc.kind,
            usage: desc.usage,
            bytes: Rc::new(RefCell::new(bytes)),
        })
    }

    fn write_buffer(
        &mut self,
        buffer: &HeadlessBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        self.check()?;

        let mut bytes = buffer.bytes.borrow_mut();
        let start = offset as usize;
        let end = start + data.len();
        if end > bytes.len() {
            return Err(DeviceError::InvalidArgument(format!(
                "write of {} bytes at {offset} overruns {}-byte buffer",
                data.len(),
                bytes.len()
            )));
        }
        bytes[start..end].copy_from_slice(data);
        self.writes += 1;
        Ok(())
    }

    fn compile_shader(&mut self, desc: &ShaderDesc<'_>) -> Result<HeadlessShader, String> {
        if desc.source.trim().is_empty() {
            return Err(format!("{}: empty shader source", desc.label));
        }

        Ok(HeadlessShader {
            id: self.next_id(),
            stage: desc.stage,
            entry_point: desc.entry_point.to_string(),
        })
    }

    fn create_uniform_binding(&mut self, buffer: &HeadlessBuffer) -> Result<HeadlessBinding, DeviceError> {
        self.check()?;
        Ok(HeadlessBinding {
            buffer_id: buffer.id,
            bytes: Rc::clone(&buffer.bytes),
        })
    }

    fn create_pipeline(
        &mut self,
        desc: &PipelineDesc<'_, Self>,
    ) -> Result<HeadlessPipeline, DeviceError> {
        self.check()?;
        Ok(HeadlessPipeline {
            id: self.next_id(),
            topology: desc.topology,
            stride: desc.layout.stride,
            uses_uniforms: desc.uses_uniforms,
        })
    }

    fn submit(&mut self, pass: &PassDesc<'_, Self>) -> Result<(), DeviceError> {
        self.check()?;

        let draws = pass
            .draws
            .iter()
            .map(|d| RecordedDraw {
                pipeline_id: d.pipeline.id,
                topology: d.pipeline.topology,
                vertices: d.vertices.clone(),
                viewport: d.viewport,
                vertex_bytes: d.vertex_buffer.contents(),
                uniform_bytes: d.uniforms.map(|u| u.bytes.borrow().clone()),
            })
            .collect();

        self.passes.push(RecordedPass {
            clear: pass.clear,
            draws,
        });
        Ok(())
    }

    fn present(&mut self, vsync_interval: u32) -> Result<(), DeviceError> {
        self.check()?;
        self.presents.push(vsync_interval);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }
}
