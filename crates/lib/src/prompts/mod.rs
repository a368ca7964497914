//! # Prompt Template Modules
//!
//! All prompt text sent to the model lives here, grouped by task.

pub mod anchor;
pub mod extraction;
