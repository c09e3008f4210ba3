//! Output resolution - where each discovered file is written

mod layout;
mod locator;
pub mod ports;
mod resolver;

pub use layout::DistLayout;
pub use locator::{StaticLocator, WorkspaceLocator};
pub use ports::{PackageLocator, Packaging};
pub use resolver::{OutputResolver, SCRIPT_EXTENSION, SOURCE_TS_EXTENSION};
