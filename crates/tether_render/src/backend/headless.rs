//! Headless backend: an in-memory stand-in for a GL context.
//!
//! Behaves like a driver that is strict about thread confinement:
//! - bound to the thread that constructs it
//! - every call from any other thread fails with [`RenderError::WrongThread`]
//!   and is counted as a confinement violation
//!
//! Keeps per-kind creation/deletion counters so lifecycle tests can assert
//! exactly how many native destroy calls happened.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use super::GlBackend;
use crate::error::{RenderError, RenderResult};
use crate::format::{gl, ShaderStage};
use crate::handle::{NativeId, ResourceKind};
use crate::resources::{BufferDesc, FramebufferDesc, TextureDesc};

/// Emulated native object.
#[derive(Debug)]
enum NativeObject {
    Buffer { data: Vec<u8> },
    Texture { width: u32, height: u32, data: Vec<u8> },
    Shader { stage: ShaderStage, source: String },
    Framebuffer,
    Pipeline,
}

impl NativeObject {
    fn kind(&self) -> ResourceKind {
        match self {
            Self::Buffer { .. } => ResourceKind::Buffer,
            Self::Texture { .. } => ResourceKind::Texture,
            Self::Shader { .. } => ResourceKind::Shader,
            Self::Framebuffer => ResourceKind::Framebuffer,
            Self::Pipeline => ResourceKind::Pipeline,
        }
    }
}

#[derive(Debug)]
struct HeadlessState {
    next_name: u32,
    objects: HashMap<NativeId, NativeObject>,
    created: [u64; 5],
    deleted: [u64; 5],
    bound_pipeline: Option<NativeId>,
    injected_failure: Option<(u32, String)>,
}

/// In-memory GL emulation bound to its creating thread.
#[derive(Debug)]
pub struct HeadlessBackend {
    owner: ThreadId,
    state: Mutex<HeadlessState>,
    violations: AtomicU64,
}

impl HeadlessBackend {
    /// Creates a backend owned by the calling thread.
    #[must_use]
    pub fn new() -> Self {
        Self {
            owner: thread::current().id(),
            state: Mutex::new(HeadlessState {
                next_name: 1,
                objects: HashMap::new(),
                created: [0; 5],
                deleted: [0; 5],
                bound_pipeline: None,
                injected_failure: None,
            }),
            violations: AtomicU64::new(0),
        }
    }

    /// The thread this backend is bound to.
    #[must_use]
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Successful creations of `kind` so far.
    #[must_use]
    pub fn created(&self, kind: ResourceKind) -> u64 {
        self.state.lock().created[kind.index()]
    }

    /// Successful deletions of `kind` so far.
    #[must_use]
    pub fn deleted(&self, kind: ResourceKind) -> u64 {
        self.state.lock().deleted[kind.index()]
    }

    /// Native objects currently alive, of any kind.
    #[must_use]
    pub fn live_objects(&self) -> usize {
        self.state.lock().objects.len()
    }

    /// Live objects of `kind`.
    #[must_use]
    pub fn live_of(&self, kind: ResourceKind) -> usize {
        self.state
            .lock()
            .objects
            .values()
            .filter(|obj| obj.kind() == kind)
            .count()
    }

    /// Calls rejected because they came from the wrong thread.
    #[must_use]
    pub fn confinement_violations(&self) -> u64 {
        self.violations.load(Ordering::Relaxed)
    }

    /// Makes the next `create_*` call fail with the given code and message.
    pub fn fail_next_create(&self, code: u32, message: impl Into<String>) {
        self.state.lock().injected_failure = Some((code, message.into()));
    }

    /// The pipeline last bound with `bind_pipeline`, if still alive.
    #[must_use]
    pub fn bound_pipeline(&self) -> Option<NativeId> {
        self.state.lock().bound_pipeline
    }

    /// Copy of a buffer's contents.
    #[must_use]
    pub fn buffer_contents(&self, id: NativeId) -> Option<Vec<u8>> {
        match self.state.lock().objects.get(&id) {
            Some(NativeObject::Buffer { data }) => Some(data.clone()),
            _ => None,
        }
    }

    /// Copy of a texture's texels.
    #[must_use]
    pub fn texture_contents(&self, id: NativeId) -> Option<Vec<u8>> {
        match self.state.lock().objects.get(&id) {
            Some(NativeObject::Texture { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    /// Current source of a shader.
    #[must_use]
    pub fn shader_source(&self, id: NativeId) -> Option<String> {
        match self.state.lock().objects.get(&id) {
            Some(NativeObject::Shader { source, .. }) => Some(source.clone()),
            _ => None,
        }
    }

    fn ensure_owner(&self, call: &'static str) -> RenderResult<()> {
        if thread::current().id() == self.owner {
            return Ok(());
        }
        self.violations.fetch_add(1, Ordering::Relaxed);
        tracing::error!(call, "native call off the designated thread");
        Err(RenderError::WrongThread { call })
    }

    /// Hands out the next name and records the creation.
    fn allocate(state: &mut HeadlessState, object: NativeObject) -> RenderResult<NativeId> {
        if let Some((code, message)) = state.injected_failure.take() {
            return Err(RenderError::Native { code, message });
        }
        let id = NativeId::new(state.next_name).ok_or_else(|| RenderError::Native {
            code: gl::OUT_OF_MEMORY,
            message: "native name space exhausted".to_string(),
        })?;
        state.next_name = state.next_name.wrapping_add(1);
        state.created[object.kind().index()] += 1;
        state.objects.insert(id, object);
        Ok(id)
    }

    /// Zeroed storage, or `OUT_OF_MEMORY` instead of an allocation panic.
    fn zeroed(len: usize) -> RenderResult<Vec<u8>> {
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|err| RenderError::Native {
            code: gl::OUT_OF_MEMORY,
            message: format!("cannot allocate {len} bytes: {err}"),
        })?;
        data.resize(len, 0);
        Ok(data)
    }

    /// Fails like a driver would on a source without an entry point.
    fn check_compiles(source: &str) -> RenderResult<()> {
        if source.contains("main") {
            Ok(())
        } else {
            Err(RenderError::Native {
                code: gl::INVALID_OPERATION,
                message: "0:1: error: no entry point `main` defined".to_string(),
            })
        }
    }

    fn invalid_name(kind: ResourceKind, id: NativeId) -> RenderError {
        RenderError::Native {
            code: gl::INVALID_VALUE,
            message: format!("{id} is not a live {kind}"),
        }
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GlBackend for HeadlessBackend {
    fn create_buffer(&self, desc: &BufferDesc) -> RenderResult<NativeId> {
        self.ensure_owner("glGenBuffers")?;
        let mut data = Self::zeroed(desc.size)?;
        if let Some(initial) = &desc.initial_data {
            let Some(head) = data.get_mut(..initial.len()) else {
                return Err(RenderError::Native {
                    code: gl::INVALID_VALUE,
                    message: format!("{} bytes of data for a {}-byte buffer", initial.len(), desc.size),
                });
            };
            head.copy_from_slice(initial);
        }
        Self::allocate(&mut self.state.lock(), NativeObject::Buffer { data })
    }

    fn update_buffer(&self, id: NativeId, offset: usize, bytes: &[u8]) -> RenderResult<()> {
        self.ensure_owner("glBufferSubData")?;
        let mut state = self.state.lock();
        let Some(NativeObject::Buffer { data }) = state.objects.get_mut(&id) else {
            return Err(Self::invalid_name(ResourceKind::Buffer, id));
        };
        let end = offset
            .checked_add(bytes.len())
            .filter(|end| *end <= data.len())
            .ok_or_else(|| RenderError::Native {
                code: gl::INVALID_VALUE,
                message: format!("range {offset}+{} exceeds buffer size {}", bytes.len(), data.len()),
            })?;
        data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    fn create_texture(&self, desc: &TextureDesc) -> RenderResult<NativeId> {
        self.ensure_owner("glGenTextures")?;
        let data = match &desc.data {
            Some(texels) => texels.clone(),
            None => Self::zeroed(desc.byte_len())?,
        };
        Self::allocate(
            &mut self.state.lock(),
            NativeObject::Texture {
                width: desc.width,
                height: desc.height,
                data,
            },
        )
    }

    fn upload_texture(&self, id: NativeId, texels: &[u8]) -> RenderResult<()> {
        self.ensure_owner("glTexSubImage2D")?;
        let mut state = self.state.lock();
        let Some(NativeObject::Texture { data, .. }) = state.objects.get_mut(&id) else {
            return Err(Self::invalid_name(ResourceKind::Texture, id));
        };
        if texels.len() != data.len() {
            return Err(RenderError::Native {
                code: gl::INVALID_VALUE,
                message: format!("upload of {} bytes into {}-byte image", texels.len(), data.len()),
            });
        }
        data.copy_from_slice(texels);
        Ok(())
    }

    fn create_shader(&self, stage: ShaderStage, source: &str) -> RenderResult<NativeId> {
        self.ensure_owner("glCreateShader")?;
        Self::check_compiles(source)?;
        Self::allocate(
            &mut self.state.lock(),
            NativeObject::Shader {
                stage,
                source: source.to_string(),
            },
        )
    }

    fn compile_shader(&self, id: NativeId, new_source: &str) -> RenderResult<()> {
        self.ensure_owner("glCompileShader")?;
        let mut state = self.state.lock();
        let Some(NativeObject::Shader { source, .. }) = state.objects.get_mut(&id) else {
            return Err(Self::invalid_name(ResourceKind::Shader, id));
        };
        Self::check_compiles(new_source)?;
        *source = new_source.to_string();
        Ok(())
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> RenderResult<NativeId> {
        self.ensure_owner("glGenFramebuffers")?;
        let mut state = self.state.lock();
        for attachment in desc.color.iter().chain(desc.depth.iter()) {
            match state.objects.get(attachment) {
                Some(NativeObject::Texture { width, height, .. })
                    if *width == desc.width && *height == desc.height => {}
                _ => {
                    return Err(RenderError::Native {
                        code: gl::INVALID_OPERATION,
                        message: format!("framebuffer incomplete: attachment {attachment}"),
                    })
                }
            }
        }
        Self::allocate(&mut state, NativeObject::Framebuffer)
    }

    fn create_pipeline(&self, vertex: NativeId, fragment: NativeId) -> RenderResult<NativeId> {
        self.ensure_owner("glLinkProgram")?;
        let mut state = self.state.lock();
        let stage_of = |id: NativeId| match state.objects.get(&id) {
            Some(NativeObject::Shader { stage, .. }) => Some(*stage),
            _ => None,
        };
        if stage_of(vertex) != Some(ShaderStage::Vertex) || stage_of(fragment) != Some(ShaderStage::Fragment) {
            return Err(RenderError::Native {
                code: gl::INVALID_OPERATION,
                message: format!("link failed: {vertex} / {fragment} are not vertex / fragment shaders"),
            });
        }
        Self::allocate(&mut state, NativeObject::Pipeline)
    }

    fn bind_pipeline(&self, id: NativeId) -> RenderResult<()> {
        self.ensure_owner("glUseProgram")?;
        let mut state = self.state.lock();
        if !matches!(state.objects.get(&id), Some(NativeObject::Pipeline)) {
            return Err(Self::invalid_name(ResourceKind::Pipeline, id));
        }
        state.bound_pipeline = Some(id);
        Ok(())
    }

    fn delete(&self, kind: ResourceKind, id: NativeId) -> RenderResult<()> {
        self.ensure_owner("glDelete*")?;
        let mut state = self.state.lock();
        match state.objects.get(&id) {
            Some(object) if object.kind() == kind => {}
            _ => return Err(Self::invalid_name(kind, id)),
        }
        state.objects.remove(&id);
        state.deleted[kind.index()] += 1;
        if state.bound_pipeline == Some(id) {
            state.bound_pipeline = None;
        }
        Ok(())
    }

    fn live_objects(&self) -> usize {
        HeadlessBackend::live_objects(self)
    }
}
