//! Tree transformation between Akoma Ntoso and editor HTML.

mod context;
mod engine;

pub use context::{TransformContext, TransformStats};
pub use engine::TransformEngine;
