use bytemuck::Pod;

use crate::diagnostics::UniformError;

/// Location of one named field inside a [`NamedUniformBuffer`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformEntry {
    pub name: String,
    pub offset: usize,
    pub size: usize,
}

/// Uniform block whose fields are addressed by name.
///
/// Fields are appended in order and never moved, so an entry's offset stays valid
/// for the lifetime of the buffer. The host copy only reaches the device through
/// an explicit upload (see `Renderer::sync_uniforms`); `is_dirty` reports whether
/// the two may differ.
///
/// Names are not checked for duplicates. Lookups take the first match.
#[derive(Debug, Clone, Default)]
pub struct NamedUniformBuffer {
    data: Vec<u8>,
    entries: Vec<UniformEntry>,
    dirty: bool,
}

impl NamedUniformBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` as a new field named `name`.
    pub fn add_bytes(&mut self, name: &str, bytes: &[u8]) {
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);
        self.entries.push(UniformEntry {
            name: name.to_string(),
            offset,
            size: bytes.len(),
        });
        self.dirty = true;
    }

    pub fn add_data<T: Pod>(&mut self, name: &str, value: &T) {
        self.add_bytes(name, bytemuck::bytes_of(value));
    }

    /// Overwrites the field `name` in place.
    ///
    /// Unknown names are ignored, so a misspelled name silently drops the write.
    ///
    /// # Panics
    ///
    /// If `bytes.len()` differs from the field's declared size.
    #[track_caller]
    pub fn set_bytes(&mut self, name: &str, bytes: &[u8]) {
        if let Err(err) = self.try_set_bytes(name, bytes) {
            panic!("{err}");
        }
    }

    /// See [`set_bytes`](Self::set_bytes).
    #[track_caller]
    pub fn set_data<T: Pod>(&mut self, name: &str, value: &T) {
        self.set_bytes(name, bytemuck::bytes_of(value));
    }

    /// Non-panicking [`set_bytes`](Self::set_bytes).
    ///
    /// Returns `Ok(false)` when `name` is unknown and nothing was written.
    pub fn try_set_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<bool, UniformError> {
        let Some(entry) = self.get_entry(name) else {
            return Ok(false);
        };

        if entry.size != bytes.len() {
            return Err(UniformError::SizeMismatch {
                name: name.to_string(),
                expected: entry.size,
                actual: bytes.len(),
            });
        }

        let (offset, size) = (entry.offset, entry.size);
        self.data[offset..offset + size].copy_from_slice(bytes);
        self.dirty = true;
        Ok(true)
    }

    pub fn try_set_data<T: Pod>(&mut self, name: &str, value: &T) -> Result<bool, UniformError> {
        self.try_set_bytes(name, bytemuck::bytes_of(value))
    }

    pub fn get_entry(&self, name: &str) -> Option<&UniformEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn get_bytes(&self, name: &str) -> Option<&[u8]> {
        self.get_entry(name)
            .map(|e| &self.data[e.offset..e.offset + e.size])
    }

    /// Reads field `name` as `T`.
    ///
    /// Returns `None` if the field is missing or its size differs from `T`'s.
    pub fn get_data<T: Pod>(&self, name: &str) -> Option<T> {
        let bytes = self.get_bytes(name)?;
        if bytes.len() != std::mem::size_of::<T>() {
            return None;
        }
        Some(bytemuck::pod_read_unaligned(bytes))
    }

    pub fn entries(&self) -> &[UniformEntry] {
        &self.entries
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
