//! Gateway implementations

mod builder;
mod study;

pub use builder::{Acebot, AcebotBuilder};
pub use study::StudyGateway;
