//! Feature modules - one vertical slice per pipeline step
//!
//! Each feature keeps its collaborator traits in `ports` and the default
//! implementations next to them.

pub mod matching;
pub mod resolution;
pub mod transform;
pub mod walking;
