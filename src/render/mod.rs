//! Rendering pipeline.

pub mod code_blocks;
pub mod renderer;

pub use code_blocks::{
    augment_code_blocks, collect_code_blocks, declared_language, language_display_name, CodeBlock,
};
pub use renderer::{IncrementalRenderer, RenderMode, RenderPass};
