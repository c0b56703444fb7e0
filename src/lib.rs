pub mod atlas;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

pub use atlas::{TextureAtlas, ToneMapping, generate_texture_atlases};
pub use config::AtlasLimits;
pub use error::{AtlasError, Result};
pub use pipeline::Pipeline;
pub use types::TexturePatch;
