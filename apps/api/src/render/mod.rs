// CV rendering: template descriptors, the shared layout engine and the
// print-ready document model.

pub mod document;
pub mod engine;
pub mod template;

pub use document::Document;
pub use engine::render;
pub use template::TemplateKind;
