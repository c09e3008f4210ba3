//! Path matching - which discovered files are sources

mod path_matcher;

pub use path_matcher::PathMatcher;
