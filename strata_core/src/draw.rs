// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recorded draw operations.
//!
//! Visuals describe their content as a list of [`DrawOp`]s in local
//! coordinates. The scene builder stores them on each
//! [`VisualNode`](crate::scene::VisualNode) and the renderer replays them onto
//! layer surfaces with the node's transform applied.

use alloc::sync::Arc;
use core::fmt;

use kurbo::{Point, Rect};

/// An 8-bit-per-channel RGBA color (non-premultiplied).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque red.
    pub const RED: Self = Self::rgb(255, 0, 0);
    /// Opaque green.
    pub const GREEN: Self = Self::rgb(0, 128, 0);
    /// Opaque blue.
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Creates a color with explicit alpha.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns this color with its alpha scaled by `factor` (clamped to
    /// `0.0..=1.0`).
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "value is clamped to 0..=255 before the cast"
    )]
    pub fn multiply_alpha(self, factor: f32) -> Self {
        if factor >= 1.0 {
            return self;
        }
        // Round half up; `f32::round` is unavailable in `core`.
        let a = (f32::from(self.a) * factor.max(0.0) + 0.5).clamp(0.0, 255.0);
        Self { a: a as u8, ..self }
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r, self.g, self.b, self.a
        )
    }
}

/// An opaque reference to a decoded image.
///
/// Images are owned by the host; the renderer passes the key through to the
/// surface without interpreting it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub u32);

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.0)
    }
}

/// A single recorded draw command, in the owning visual's local coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Fills a rectangle with a solid color.
    FillRect {
        /// Area to fill.
        rect: Rect,
        /// Fill color.
        color: Color,
    },
    /// Draws an image scaled into `dest`.
    DrawImage {
        /// Image to draw.
        image: ImageId,
        /// Destination rectangle.
        dest: Rect,
    },
    /// Draws a run of already-shaped text.
    DrawText {
        /// Baseline origin.
        origin: Point,
        /// Text content.
        text: Arc<str>,
        /// Font size in pixels.
        size: f32,
        /// Text color.
        color: Color,
    },
    /// Intersects the current clip with a rectangle until the matching
    /// [`PopClip`](Self::PopClip).
    PushClip(Rect),
    /// Restores the clip saved by the last [`PushClip`](Self::PushClip).
    PopClip,
}
