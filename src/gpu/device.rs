// gpu/device.rs — Device enumeration, selection, and context.
//
// The catalog enumerates every adapter wgpu can see across all backends,
// in enumeration order (backends outer, adapters inner), and assigns each
// a zero-based index matching its position. Selection picks exactly one
// entry; an out-of-range index or an empty catalog is a fatal error for
// the parallel path — there is no fallback to the scalar engine.
//
// ADAPTER FLAGS:
// wgpu drops non-conformant adapters by default (e.g. dzn, the
// D3D12-to-Vulkan layer on WSL2, declares itself non-conformant).
// ALLOW_UNDERLYING_NONCOMPLIANT_ADAPTER makes them enumerable so the
// catalog shows everything the machine actually has, including software
// rasterizers — a CPU-type adapter is a legitimate benchmark target here,
// which is why the catalog never filters by device type.

use std::fmt;

/// Coarse device classification, for display next to the selection prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Cpu,
    Gpu,
    /// Reserved for dedicated compute accelerators. wgpu's `DeviceType`
    /// has no matching variant, so enumeration never produces this today.
    Accelerator,
    Other,
}

impl DeviceKind {
    fn from_wgpu(ty: wgpu::DeviceType) -> Self {
        match ty {
            wgpu::DeviceType::Cpu => DeviceKind::Cpu,
            wgpu::DeviceType::DiscreteGpu
            | wgpu::DeviceType::IntegratedGpu
            | wgpu::DeviceType::VirtualGpu => DeviceKind::Gpu,
            wgpu::DeviceType::Other => DeviceKind::Other,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Cpu => write!(f, "CPU"),
            DeviceKind::Gpu => write!(f, "GPU"),
            DeviceKind::Accelerator => write!(f, "Accelerator"),
            DeviceKind::Other => write!(f, "Other"),
        }
    }
}

/// One enumerated compute device: backend ("platform") plus adapter,
/// with a display name and coarse classification. Read-only after
/// enumeration.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    /// Zero-based position in the catalog.
    pub index: usize,
    /// Adapter display name as reported by the driver.
    pub name: String,
    /// The wgpu backend this adapter belongs to (Vulkan, Metal, DX12, GL).
    pub backend: wgpu::Backend,
    pub kind: DeviceKind,
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({:?}, {})", self.index, self.name, self.backend, self.kind)
    }
}

// ---------------------------------------------------------------------------
// DeviceCatalog
// ---------------------------------------------------------------------------

/// The ordered list of compute devices visible to wgpu.
///
/// Build with [`DeviceCatalog::enumerate`], inspect via [`descriptors`],
/// then consume with [`open`] to acquire a context on exactly one device.
///
/// [`descriptors`]: DeviceCatalog::descriptors
/// [`open`]: DeviceCatalog::open
pub struct DeviceCatalog {
    instance: wgpu::Instance,
    adapters: Vec<wgpu::Adapter>,
    descriptors: Vec<DeviceDescriptor>,
}

impl DeviceCatalog {
    /// Enumerate all adapters across all wgpu backends.
    ///
    /// An empty catalog is not an error at enumeration time — the caller
    /// reports it when selection is attempted (or earlier, via
    /// [`is_empty`](DeviceCatalog::is_empty)).
    pub fn enumerate() -> Self {
        let flags = if cfg!(debug_assertions) {
            // Validation layer in debug builds for shader error feedback.
            wgpu::InstanceFlags::VALIDATION
                | wgpu::InstanceFlags::ALLOW_UNDERLYING_NONCOMPLIANT_ADAPTER
        } else {
            wgpu::InstanceFlags::ALLOW_UNDERLYING_NONCOMPLIANT_ADAPTER
        };

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags,
            ..Default::default()
        });

        let adapters: Vec<wgpu::Adapter> = instance
            .enumerate_adapters(wgpu::Backends::all())
            .into_iter()
            .collect();

        let descriptors = adapters
            .iter()
            .enumerate()
            .map(|(index, adapter)| {
                let info = adapter.get_info();
                DeviceDescriptor {
                    index,
                    name: info.name,
                    backend: info.backend,
                    kind: DeviceKind::from_wgpu(info.device_type),
                }
            })
            .collect();

        DeviceCatalog { instance, adapters, descriptors }
    }

    /// All enumerated devices, in catalog order.
    pub fn descriptors(&self) -> &[DeviceDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Validate `index` and return its descriptor.
    ///
    /// # Errors
    /// [`GpuError::NoDevices`] if the catalog is empty,
    /// [`GpuError::SelectionOutOfRange`] if `index >= len()`.
    pub fn select(&self, index: usize) -> Result<&DeviceDescriptor, GpuError> {
        validate_selection(index, self.descriptors.len())?;
        Ok(&self.descriptors[index])
    }

    /// Consume the catalog and open a device context on the adapter at
    /// `index`.
    ///
    /// The catalog is consumed because the `wgpu::Instance` moves into the
    /// returned [`GpuDevice`] — the benchmark selects exactly one device
    /// per run.
    pub fn open(self, index: usize) -> Result<GpuDevice, GpuError> {
        let descriptor = self.select(index)?.clone();
        let count = self.adapters.len();
        let adapter = self
            .adapters
            .into_iter()
            .nth(index)
            .ok_or(GpuError::SelectionOutOfRange { index, count })?;

        let (device, queue): (wgpu::Device, wgpu::Queue) = pollster::block_on(
            adapter.request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("edgemark"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            ),
        )
        .map_err(GpuError::DeviceRequest)?;

        Ok(GpuDevice {
            device,
            queue,
            descriptor,
            workgroup_size: WorkgroupSize::default(),
            _instance: self.instance,
        })
    }
}

// ---------------------------------------------------------------------------
// WorkgroupSize
// ---------------------------------------------------------------------------

/// Workgroup configuration for the 2D convolution dispatch.
///
/// The default 16×8 = 128 invocations aligns with NVIDIA's 32-wide warps
/// (4 warps) and AMD's 64-wide wavefronts (2 waves), and the 16-wide x
/// dimension matches cache lines for row-major image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkgroupSize {
    pub x: u32,
    pub y: u32,
}

impl WorkgroupSize {
    /// Total invocations per workgroup (x * y).
    pub fn total(&self) -> u32 {
        self.x * self.y
    }
}

impl Default for WorkgroupSize {
    fn default() -> Self {
        WorkgroupSize { x: 16, y: 8 }
    }
}

impl fmt::Display for WorkgroupSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{} ({} invocations)", self.x, self.y, self.total())
    }
}

// ---------------------------------------------------------------------------
// GpuDevice
// ---------------------------------------------------------------------------

/// An execution context bound to one selected device.
///
/// # Field drop order
/// Rust drops struct fields in declaration order. `_instance` is declared
/// last so the `wgpu::Instance` outlives `device` and `queue`; some drivers
/// (dzn on WSL2) crash if the instance is destroyed while device-level
/// objects still reference it.
pub struct GpuDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub descriptor: DeviceDescriptor,
    pub workgroup_size: WorkgroupSize,
    /// Keeps the `wgpu::Instance` alive until `device` and `queue` drop.
    /// Never accessed directly; prefixed `_` to signal intent.
    _instance: wgpu::Instance,
}

impl GpuDevice {
    /// Override the default workgroup size, validating against the
    /// device's actual invocation limit.
    pub fn set_workgroup_size(&mut self, x: u32, y: u32) -> Result<(), GpuError> {
        let total = x * y;
        let max = self.device.limits().max_compute_invocations_per_workgroup;
        if total == 0 || total > max {
            return Err(GpuError::WorkgroupTooLarge { total, max });
        }
        self.workgroup_size = WorkgroupSize { x, y };
        Ok(())
    }

    /// Number of workgroups needed to cover a `width × height` grid with
    /// the active workgroup size.
    ///
    /// Ceiling division, so every pixel is covered even when the image
    /// dimensions are not workgroup multiples. The shader must guard:
    /// work-items whose global ID falls outside the image return without
    /// writing.
    pub fn dispatch_size(&self, width: u32, height: u32) -> (u32, u32) {
        dispatch_size_for(self.workgroup_size, width, height)
    }
}

impl fmt::Display for GpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GpuDevice {{ {} {} ({:?}, {}), workgroup: {} }}",
            self.descriptor.index,
            self.descriptor.name,
            self.descriptor.backend,
            self.descriptor.kind,
            self.workgroup_size
        )
    }
}

/// Selection validation, shared by `select` and `open`.
fn validate_selection(index: usize, count: usize) -> Result<(), GpuError> {
    if count == 0 {
        return Err(GpuError::NoDevices);
    }
    if index >= count {
        return Err(GpuError::SelectionOutOfRange { index, count });
    }
    Ok(())
}

fn dispatch_size_for(wg: WorkgroupSize, width: u32, height: u32) -> (u32, u32) {
    let dx = (width + wg.x - 1) / wg.x;
    let dy = (height + wg.y - 1) / wg.y;
    (dx, dy)
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from device enumeration, selection, and dispatch.
#[derive(Debug)]
pub enum GpuError {
    /// Enumeration found no adapters at all. Fatal for the parallel path;
    /// the benchmark never silently falls back to the scalar engine.
    NoDevices,
    /// The selected index does not name a catalog entry.
    SelectionOutOfRange { index: usize, count: usize },
    /// The adapter refused the device request (driver issue, limits).
    DeviceRequest(wgpu::RequestDeviceError),
    /// The compute shader failed to build; carries the driver's
    /// diagnostic verbatim.
    Compile(String),
    /// Mapping the readback buffer failed after dispatch.
    Readback(wgpu::BufferAsyncError),
    /// Requested workgroup size exceeds the device's invocation limit.
    WorkgroupTooLarge { total: u32, max: u32 },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::NoDevices => write!(f, "no compute devices found"),
            GpuError::SelectionOutOfRange { index, count } => {
                write!(f, "device index {index} out of range (catalog has {count} devices)")
            }
            GpuError::DeviceRequest(e) => write!(f, "device request failed: {e}"),
            GpuError::Compile(log) => write!(f, "shader build failed:\n{log}"),
            GpuError::Readback(e) => write!(f, "output readback failed: {e}"),
            GpuError::WorkgroupTooLarge { total, max } => write!(
                f,
                "workgroup size {total} exceeds device limit of {max} invocations"
            ),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::DeviceRequest(e) => Some(e),
            GpuError::Readback(e) => Some(e),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // Selection and dispatch sizing are pure functions — no adapter needed,
    // so these run in CI without a GPU.

    #[test]
    fn test_empty_catalog_is_fatal() {
        assert!(matches!(validate_selection(0, 0), Err(GpuError::NoDevices)));
    }

    #[test]
    fn test_selection_out_of_range() {
        match validate_selection(3, 2) {
            Err(GpuError::SelectionOutOfRange { index: 3, count: 2 }) => {}
            other => panic!("expected SelectionOutOfRange, got {other:?}"),
        }
        assert!(validate_selection(1, 2).is_ok());
        assert!(validate_selection(0, 1).is_ok());
    }

    #[test]
    fn test_device_kind_mapping() {
        assert_eq!(DeviceKind::from_wgpu(wgpu::DeviceType::Cpu), DeviceKind::Cpu);
        assert_eq!(DeviceKind::from_wgpu(wgpu::DeviceType::DiscreteGpu), DeviceKind::Gpu);
        assert_eq!(DeviceKind::from_wgpu(wgpu::DeviceType::IntegratedGpu), DeviceKind::Gpu);
        assert_eq!(DeviceKind::from_wgpu(wgpu::DeviceType::VirtualGpu), DeviceKind::Gpu);
        assert_eq!(DeviceKind::from_wgpu(wgpu::DeviceType::Other), DeviceKind::Other);
    }

    #[test]
    fn test_dispatch_size_exact_multiple() {
        let wg = WorkgroupSize { x: 16, y: 8 };
        assert_eq!(dispatch_size_for(wg, 1024, 1024), (64, 128));
    }

    #[test]
    fn test_dispatch_size_ceiling() {
        let wg = WorkgroupSize { x: 16, y: 8 };
        // 100/16 → 7 groups (112 items, shader guards the last 12 columns).
        assert_eq!(dispatch_size_for(wg, 100, 100), (7, 13));
        // Tiny image still gets one workgroup per axis.
        assert_eq!(dispatch_size_for(wg, 1, 1), (1, 1));
    }

    #[test]
    fn test_workgroup_total() {
        assert_eq!(WorkgroupSize::default().total(), 128);
        assert_eq!(WorkgroupSize { x: 8, y: 8 }.total(), 64);
    }

    #[test]
    fn test_descriptor_display() {
        let d = DeviceDescriptor {
            index: 2,
            name: "Test Adapter".to_string(),
            backend: wgpu::Backend::Vulkan,
            kind: DeviceKind::Gpu,
        };
        assert_eq!(format!("{d}"), "[2] Test Adapter (Vulkan, GPU)");
    }

    #[test]
    fn test_enumeration_indices_are_positional() {
        // Enumeration itself is safe without a GPU; when adapters exist,
        // their indices must match their positions.
        let catalog = DeviceCatalog::enumerate();
        for (i, d) in catalog.descriptors().iter().enumerate() {
            assert_eq!(d.index, i);
        }
        assert_eq!(catalog.len(), catalog.descriptors().len());
    }

    #[test]
    #[ignore = "requires a compute device"]
    fn test_open_first_device() {
        let catalog = DeviceCatalog::enumerate();
        assert!(!catalog.is_empty(), "no adapters visible");
        let gpu = catalog.open(0).expect("opening device 0 should succeed");
        assert_eq!(gpu.descriptor.index, 0);
        assert_eq!(gpu.workgroup_size, WorkgroupSize::default());
        eprintln!("[edgemark] {gpu}");
    }

    #[test]
    #[ignore = "requires a compute device"]
    fn test_set_workgroup_size_validated() {
        let catalog = DeviceCatalog::enumerate();
        let mut gpu = catalog.open(0).expect("opening device 0 should succeed");
        gpu.set_workgroup_size(8, 8).expect("64 invocations fits any device");
        assert_eq!(gpu.workgroup_size.total(), 64);
        let err = gpu.set_workgroup_size(4096, 4096).unwrap_err();
        assert!(matches!(err, GpuError::WorkgroupTooLarge { .. }));
    }
}
