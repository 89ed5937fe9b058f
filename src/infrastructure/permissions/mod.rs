//! Capture permission adapters

mod policy;

pub use policy::{stdin_prompt, PolicyPermissions};
