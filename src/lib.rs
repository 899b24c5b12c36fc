//! Workspace façade crate.
//!
//! Exposes the `core-service` controller behind the `desktop-shims` feature so
//! host applications can depend on `yoytube-workspace` without wiring each
//! crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
