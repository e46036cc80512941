//! Composition algorithms, generic over [`crate::backend::ImageOps`].
//!
//! Each submodule implements exactly one step so it can be tested against an
//! in-memory fake backend.
//!
//! ## Data Flow
//!
//! ```text
//! decode ──▶ orientation ──▶ resize ──▶ homogenize ──▶ montage
//!            (rotate 90°)    (width)    (majority)     (grid + final width)
//! ```
//!
//! 1. [`orientation`]: classify geometry and rotate against a declared tag
//! 2. [`resize`]     : aspect-preserving resize with the 600 px width floor
//! 3. [`homogenize`] : match minority tiles to the predominant group, then
//!    equalise tone on every tile
//! 4. [`montage`]    : grid layout from the first tile's bounding box

pub mod homogenize;
pub mod montage;
pub mod orientation;
pub mod resize;

#[cfg(test)]
pub(crate) mod fake;
