pub mod admission;
pub mod context;
pub mod fonts;
pub mod pipeline;
pub mod pool;

pub use admission::{AdmissionPermit, ConversionAdmission};
pub use context::RenderContext;
pub use fonts::{FontCatalog, ResolvedFont};
pub use pipeline::{PreparedRender, RenderPipeline, RendererStatus, TextRenderer};
pub use pool::{PoolStats, PooledResource, ReleaseOutcome, ResourcePool};
