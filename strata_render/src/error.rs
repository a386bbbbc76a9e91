// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-loop errors.

use strata_core::error::SceneError;

use crate::surface::SurfaceError;

/// A fatal failure of one frame.
///
/// The renderer stops producing frames after reporting one of these; see
/// [`DeferredRenderer::take_error`](crate::DeferredRenderer::take_error).
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// Scene building hit a broken tree contract.
    #[error("scene update failed: {0}")]
    Scene(#[from] SceneError),
    /// A layer surface could not be created or composited.
    #[error("surface failure: {0}")]
    Surface(#[from] SurfaceError),
}

#[cfg(test)]
mod tests {
    use strata_core::visual::VisualId;

    use super::*;
    use crate::surface::PixelSize;

    #[test]
    fn wraps_both_sources() {
        let scene: RenderError = SceneError::Unrooted(VisualId::new(3, 0)).into();
        assert!(matches!(scene, RenderError::Scene(SceneError::Unrooted(_))), "scene");

        let surface: RenderError = SurfaceError::AllocationFailed(PixelSize::new(1, 1)).into();
        assert!(
            surface.to_string().starts_with("surface failure: "),
            "message: {surface}"
        );
    }
}
