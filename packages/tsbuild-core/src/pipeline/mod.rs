//! Bundle pipeline - locate, walk, resolve, transform or copy, write

mod core;
pub mod reporter;
pub mod result;

pub use self::core::Pipeline;
pub use reporter::{BuildReporter, TracingReporter};
pub use result::{BundleOutput, FileMapping};
