use crate::diagnostics::ConfigError;

/// Declared CPU/GPU access rights of a buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum BufferUsage {
    /// GPU-writable, no CPU access after creation.
    #[default]
    Default,
    /// Written once at creation, immutable afterwards. Requires initial contents.
    Static,
    /// Repeatedly overwritten from the CPU, discarding previous contents.
    Dynamic,
}

impl BufferUsage {
    pub fn allows_cpu_writes(self) -> bool {
        matches!(self, BufferUsage::Dynamic)
    }
}

impl TryFrom<u32> for BufferUsage {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BufferUsage::Default),
            1 => Ok(BufferUsage::Static),
            2 => Ok(BufferUsage::Dynamic),
            other => Err(ConfigError::UnknownUsage(other)),
        }
    }
}

/// Primitive assembly mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Topology {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
}

impl TryFrom<u32> for Topology {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Topology::PointList),
            1 => Ok(Topology::LineList),
            2 => Ok(Topology::LineStrip),
            3 => Ok(Topology::TriangleList),
            4 => Ok(Topology::TriangleStrip),
            other => Err(ConfigError::UnknownTopology(other)),
        }
    }
}

/// Pipeline stage a shader program runs in.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

impl ShaderStage {
    /// WGSL attribute that marks an entry point of this stage.
    pub fn wgsl_attribute(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "@vertex",
            ShaderStage::Pixel => "@fragment",
        }
    }
}

/// Format of one vertex attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
    Uint32,
}

impl VertexFormat {
    pub const fn size(self) -> u64 {
        match self {
            VertexFormat::Float32 | VertexFormat::Uint32 => 4,
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
        }
    }
}

/// One shader input fed from the vertex buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexAttribute {
    pub format: VertexFormat,
    pub offset: u64,
    pub location: u32,
}

/// How vertex-buffer bytes map onto a vertex shader's inputs.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct VertexLayout {
    pub stride: u64,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Attributes placed back to back at locations `0..n`.
    pub fn packed(formats: &[VertexFormat]) -> Self {
        let mut offset = 0;
        let attributes = formats
            .iter()
            .enumerate()
            .map(|(location, &format)| {
                let attr = VertexAttribute {
                    format,
                    offset,
                    location: location as u32,
                };
                offset += format.size();
                attr
            })
            .collect();

        Self {
            stride: offset,
            attributes,
        }
    }
}

/// Rasterizer viewport in physical pixels.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_layout_appends_offsets() {
        let layout = VertexLayout::packed(&[
            VertexFormat::Float32x3,
            VertexFormat::Float32x3,
            VertexFormat::Float32x2,
        ]);
        assert_eq!(layout.stride, 32);
        let offsets: Vec<u64> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        let locations: Vec<u32> = layout.attributes.iter().map(|a| a.location).collect();
        assert_eq!(locations, vec![0, 1, 2]);
    }

    #[test]
    fn unknown_raw_values_are_config_errors() {
        assert_eq!(BufferUsage::try_from(2), Ok(BufferUsage::Dynamic));
        assert_eq!(BufferUsage::try_from(7), Err(ConfigError::UnknownUsage(7)));
        assert_eq!(Topology::try_from(3), Ok(Topology::TriangleList));
        assert_eq!(Topology::try_from(42), Err(ConfigError::UnknownTopology(42)));
    }

    #[test]
    fn only_dynamic_allows_cpu_writes() {
        assert!(BufferUsage::Dynamic.allows_cpu_writes());
        assert!(!BufferUsage::Static.allows_cpu_writes());
        assert!(!BufferUsage::Default.allows_cpu_writes());
    }

    #[test]
    fn zero_sized_viewport_is_invalid() {
        assert!(Viewport::new(0.0, 0.0, 640.0, 480.0).is_valid());
        assert!(!Viewport::new(0.0, 0.0, 0.0, 480.0).is_valid());
    }
}
