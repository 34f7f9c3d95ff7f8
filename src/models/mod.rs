pub mod artifact;
pub mod config;
pub mod request;

pub use artifact::{
    BatchItemOutcome, BatchItemResponse, BatchRenderResponse, ErrorDescriptor, RenderArtifact, RenderResponse,
};
pub use config::{AppConfig, FontConfig, PoolSettings, RenderConfig, ServerConfig};
pub use request::{BatchItem, BatchRenderRequest, RenderOptions, RenderRequest};
