//! Shared handles to device resources.
//!
//! Handles are reference counted: cloning is cheap and the device object is
//! released when the last clone (including ones held by queued draws) drops.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::device::Backend;

use super::types::{BufferUsage, VertexLayout};

struct VertexBufferInner<B: Backend> {
    id: u64,
    raw: B::Buffer,
    usage: BufferUsage,
    capacity: u64,
    stride: Cell<u64>,
    count: Cell<u32>,
}

/// Fixed-stride vertex array on the device.
pub struct VertexBuffer<B: Backend> {
    inner: Rc<VertexBufferInner<B>>,
}

impl<B: Backend> Clone for VertexBuffer<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<B: Backend> fmt::Debug for VertexBuffer<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexBuffer")
            .field("id", &self.id())
            .field("usage", &self.usage())
            .field("stride", &self.stride())
            .field("count", &self.count())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

impl<B: Backend> VertexBuffer<B> {
    pub(crate) fn new(
        id: u64,
        raw: B::Buffer,
        usage: BufferUsage,
        stride: u64,
        count: u32,
        capacity: u64,
    ) -> Self {
        Self {
            inner: Rc::new(VertexBufferInner {
                id,
                raw,
                usage,
                capacity,
                stride: Cell::new(stride),
                count: Cell::new(count),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn usage(&self) -> BufferUsage {
        self.inner.usage
    }

    /// Number of vertices currently recorded as valid.
    pub fn count(&self) -> u32 {
        self.inner.count.get()
    }

    pub fn stride(&self) -> u64 {
        self.inner.stride.get()
    }

    /// Bytes allocated at creation; updates never exceed this.
    pub fn capacity(&self) -> u64 {
        self.inner.capacity
    }

    pub(crate) fn raw(&self) -> &B::Buffer {
        &self.inner.raw
    }

    pub(crate) fn set_contents_shape(&self, stride: u64, count: u32) {
        self.inner.stride.set(stride);
        self.inner.count.set(count);
    }
}

pub(crate) struct UniformSlot<B: Backend> {
    pub(crate) id: u64,
    pub(crate) buffer: B::Buffer,
    pub(crate) binding: B::Binding,
    pub(crate) size: u64,
}

struct VertexShaderInner<B: Backend> {
    id: u64,
    raw: B::Shader,
    entry: String,
    layout: VertexLayout,
    uniforms: Option<UniformSlot<B>>,
}

/// Compiled vertex program with its input layout and optional uniform buffer.
pub struct VertexShader<B: Backend> {
    inner: Rc<VertexShaderInner<B>>,
}

impl<B: Backend> Clone for VertexShader<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<B: Backend> fmt::Debug for VertexShader<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexShader")
            .field("id", &self.id())
            .field("entry", &self.entry_point())
            .field("uniform_size", &self.uniform_size())
            .finish_non_exhaustive()
    }
}

impl<B: Backend> VertexShader<B> {
    pub(crate) fn new(
        id: u64,
        raw: B::Shader,
        entry: String,
        layout: VertexLayout,
        uniforms: Option<UniformSlot<B>>,
    ) -> Self {
        Self {
            inner: Rc::new(VertexShaderInner {
                id,
                raw,
                entry,
                layout,
                uniforms,
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn entry_point(&self) -> &str {
        &self.inner.entry
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.inner.layout
    }

    /// Declared uniform buffer size, if the shader was created with one.
    pub fn uniform_size(&self) -> Option<u64> {
        self.inner.uniforms.as_ref().map(|u| u.size)
    }

    pub(crate) fn raw(&self) -> &B::Shader {
        &self.inner.raw
    }

    pub(crate) fn uniforms(&self) -> Option<&UniformSlot<B>> {
        self.inner.uniforms.as_ref()
    }
}

struct PixelShaderInner<B: Backend> {
    id: u64,
    raw: B::Shader,
    entry: String,
}

/// Compiled pixel program.
pub struct PixelShader<B: Backend> {
    inner: Rc<PixelShaderInner<B>>,
}

impl<B: Backend> Clone for PixelShader<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<B: Backend> fmt::Debug for PixelShader<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelShader")
            .field("id", &self.id())
            .field("entry", &self.entry_point())
            .finish_non_exhaustive()
    }
}

impl<B: Backend> PixelShader<B> {
    pub(crate) fn new(id: u64, raw: B::Shader, entry: String) -> Self {
        Self {
            inner: Rc::new(PixelShaderInner { id, raw, entry }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn entry_point(&self) -> &str {
        &self.inner.entry
    }

    pub(crate) fn raw(&self) -> &B::Shader {
        &self.inner.raw
    }
}
