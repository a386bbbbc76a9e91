// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer surfaces, the factory that owns them, and the final render target.
//!
//! Every layer of a scene is backed by one [`LayerSurface`] the size of the
//! client area, drawn in screen coordinates. Surfaces are created and released
//! only through a [`LayerFactory`]; the renderer never drops a surface without
//! handing it back through [`LayerFactory::dispose_layer`].

use std::fmt;

use kurbo::{Affine, Point, Rect, Size};
use strata_core::draw::{Color, ImageId};
use strata_core::visual::VisualId;

/// A surface size in whole pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelSize {
    /// Creates a pixel size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the smallest pixel size covering `size`.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::InvalidSize`] for negative, non-finite, or
    /// out-of-range dimensions.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "range is checked against u32::MAX before the cast"
    )]
    pub fn try_from_size(size: Size) -> Result<Self, SurfaceError> {
        let invalid = SurfaceError::InvalidSize {
            width: size.width,
            height: size.height,
        };
        let (w, h) = (size.width.ceil(), size.height.ceil());
        let limit = f64::from(u32::MAX);
        if !(w.is_finite() && h.is_finite()) || w < 0.0 || h < 0.0 || w > limit || h > limit {
            return Err(invalid);
        }
        Ok(Self {
            width: w as u32,
            height: h as u32,
        })
    }

    /// Returns `true` if either dimension is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the full surface area as a rectangle.
    #[must_use]
    pub fn to_rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Errors raised by surface allocation.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SurfaceError {
    /// The requested size cannot back a surface.
    #[error("invalid surface size {width}x{height}")]
    InvalidSize {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },
    /// The backend could not allocate a surface.
    #[error("failed to allocate a {0} layer surface")]
    AllocationFailed(PixelSize),
}

/// A paintable offscreen surface backing one layer.
///
/// Drawing calls are affected by the current transform. Clip rectangles are
/// given in the current transform's coordinates and converted to an
/// axis-aligned surface rectangle when pushed.
pub trait LayerSurface: Send {
    /// Returns the surface size.
    fn size(&self) -> PixelSize;

    /// Replaces the current transform.
    fn set_transform(&mut self, transform: Affine);

    /// Intersects the clip with `rect` until the matching
    /// [`pop_clip`](Self::pop_clip).
    fn push_clip(&mut self, rect: Rect);

    /// Restores the clip saved by the last [`push_clip`](Self::push_clip).
    fn pop_clip(&mut self);

    /// Clears `rect` to transparent.
    fn clear(&mut self, rect: Rect);

    /// Fills `rect` with a solid color.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draws an image scaled into `dest`.
    fn draw_image(&mut self, image: ImageId, dest: Rect, opacity: f32);

    /// Draws a run of text with its baseline at `origin`.
    fn draw_text(&mut self, origin: Point, text: &str, size: f32, color: Color);
}

/// Creates and releases layer surfaces.
pub trait LayerFactory: Send {
    /// Creates a surface of `size` for the layer owned by `layer_root`.
    ///
    /// # Errors
    ///
    /// Returns a [`SurfaceError`] if the surface cannot be allocated. The
    /// renderer does not retry.
    fn create_layer(
        &mut self,
        layer_root: VisualId,
        size: PixelSize,
    ) -> Result<Box<dyn LayerSurface>, SurfaceError>;

    /// Releases a surface previously returned by
    /// [`create_layer`](Self::create_layer).
    fn dispose_layer(&mut self, layer_root: VisualId, surface: Box<dyn LayerSurface>);
}

/// One layer handed to the [`RenderTarget`].
pub struct CompositeLayer<'a> {
    /// Owner of the layer.
    pub layer_root: VisualId,
    /// The layer's painted surface.
    pub surface: &'a dyn LayerSurface,
    /// Opacity to composite the surface with.
    pub opacity: f32,
    /// Screen-space clip to composite the surface through, if any.
    pub clip: Option<Rect>,
}

impl fmt::Debug for CompositeLayer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeLayer")
            .field("layer_root", &self.layer_root)
            .field("size", &self.surface.size())
            .field("opacity", &self.opacity)
            .field("clip", &self.clip)
            .finish()
    }
}

/// The final destination layers are composited onto.
pub trait RenderTarget: Send {
    /// Composites `layers` back to front.
    ///
    /// # Errors
    ///
    /// Returns a [`SurfaceError`] if the target cannot be drawn to.
    fn composite(&mut self, layers: &[CompositeLayer<'_>]) -> Result<(), SurfaceError>;
}
