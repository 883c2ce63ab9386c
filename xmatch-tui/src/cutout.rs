//! The cutout renderer boundary.
//!
//! A renderer turns an image pair plus a target coordinate into a view the
//! operator can click on. The view hands back the stable catalogue row
//! index captured at plot time, so selection never depends on
//! floating-point coordinate equality.
//!
//! Real deployments implement [`CutoutRenderer`] over a reprojection
//! pipeline that overlays radio brightness contours on the infrared
//! heatmap. The bundled [`TerminalRenderer`] draws catalogue scatter only
//! and exists to exercise this boundary end to end.

use std::path::{Path, PathBuf};

/// Everything a renderer needs for one target.
#[derive(Debug, Clone)]
pub struct CutoutRequest {
    pub infrared_image: PathBuf,
    pub radio_image: PathBuf,
    pub radio_rms_image: PathBuf,
    pub target_ra: f64,
    pub target_dec: f64,
    pub infrared_radius_px: u32,
    pub radio_radius_px: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The radio brightness map and its RMS map must share a pixel grid.
    #[error("Radio image grid {radio_shape:?} does not match RMS map grid {rms_shape:?}")]
    GridShapeMismatch {
        radio_shape: (usize, usize),
        rms_shape: (usize, usize),
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Render failed: {reason}")]
    Failed { reason: String },
}

/// Maps sky coordinates into the unit-square view.
///
/// `x` runs 0..1 left to right with RA increasing to the *left* (sky
/// convention); `y` runs 0..1 bottom to top with Dec.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub center_ra: f64,
    pub center_dec: f64,
    pub half_extent_arcsec: f64,
}

impl ViewTransform {
    /// Project a sky position into view coordinates; `None` when it falls
    /// outside the cutout.
    pub fn sky_to_view(&self, ra: f64, dec: f64) -> Option<(f64, f64)> {
        let dx = (ra - self.center_ra) * self.center_dec.to_radians().cos() * 3600.0;
        let dy = (dec - self.center_dec) * 3600.0;
        let x = 0.5 - dx / (2.0 * self.half_extent_arcsec);
        let y = 0.5 + dy / (2.0 * self.half_extent_arcsec);
        ((0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y)).then_some((x, y))
    }
}

/// Click tolerance around a plotted point, in view units.
pub const PICK_RADIUS: f64 = 0.04;

/// A clickable catalogue point with its row identity.
#[derive(Debug, Clone, PartialEq)]
pub struct PlottedPoint {
    pub row: usize,
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Marker styles for the three selection kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    InfraredHost,
    RadioHost,
    Component,
}

/// A placed selection marker; retained when the clickable set swaps.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    pub kind: MarkerKind,
    pub label: Option<String>,
}

/// The rendered view for one target.
#[derive(Debug, Clone)]
pub struct CutoutView {
    pub title: String,
    pub transform: ViewTransform,
    clickable: Vec<PlottedPoint>,
    markers: Vec<Marker>,
    sources_visible: bool,
}

impl CutoutView {
    pub fn new(title: impl Into<String>, transform: ViewTransform) -> Self {
        Self {
            title: title.into(),
            transform,
            clickable: Vec::new(),
            markers: Vec::new(),
            sources_visible: true,
        }
    }

    /// Replace the clickable point set (phase swap). Placed markers stay.
    pub fn set_clickable(&mut self, points: Vec<PlottedPoint>) {
        self.clickable = points;
    }

    pub fn clickable(&self) -> &[PlottedPoint] {
        &self.clickable
    }

    pub fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn sources_visible(&self) -> bool {
        self.sources_visible
    }

    /// Cosmetic only: hidden sources can still be picked.
    pub fn toggle_sources(&mut self) {
        self.sources_visible = !self.sources_visible;
    }

    /// Nearest clickable point within [`PICK_RADIUS`] of a view position.
    pub fn pick(&self, x: f64, y: f64) -> Option<&PlottedPoint> {
        self.clickable
            .iter()
            .map(|point| {
                let dx = point.x - x;
                let dy = point.y - y;
                (point, (dx * dx + dy * dy).sqrt())
            })
            .filter(|(_, distance)| *distance <= PICK_RADIUS)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(point, _)| point)
    }
}

/// Produces views and a click-to-row transform for a target.
pub trait CutoutRenderer {
    /// Render the overlay view for a target.
    ///
    /// Implementations that read the radio maps must fail with
    /// [`RenderError::GridShapeMismatch`] when the brightness and RMS
    /// grids differ; that is a data problem, not an operator mistake.
    fn render(&mut self, request: &CutoutRequest) -> Result<CutoutView, RenderError>;

    /// Export the view to `path` for the per-source figure archive.
    fn export(&self, view: &CutoutView, path: &Path) -> Result<(), RenderError>;
}

/// Catalogue-scatter renderer for the terminal.
///
/// Does not read the image files; the view extent assumes one image pixel
/// per arcsecond, so the configured pixel radii act directly as the sky
/// radius. Exports are plain-text view descriptions.
#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl CutoutRenderer for TerminalRenderer {
    fn render(&mut self, request: &CutoutRequest) -> Result<CutoutView, RenderError> {
        let half_extent = request
            .infrared_radius_px
            .max(request.radio_radius_px)
            .max(1) as f64;
        let transform = ViewTransform {
            center_ra: request.target_ra,
            center_dec: request.target_dec,
            half_extent_arcsec: half_extent,
        };
        tracing::debug!(
            ra = request.target_ra,
            dec = request.target_dec,
            half_extent,
            "rendered terminal cutout"
        );
        Ok(CutoutView::new("", transform))
    }

    fn export(&self, view: &CutoutView, path: &Path) -> Result<(), RenderError> {
        let mut lines = vec![format!("# {}", view.title)];
        lines.push(format!(
            "# center RA {:.6} Dec {:.6}, half-extent {:.0} arcsec",
            view.transform.center_ra, view.transform.center_dec, view.transform.half_extent_arcsec
        ));
        for marker in view.markers() {
            lines.push(format!(
                "{:?} {} at ({:.3}, {:.3})",
                marker.kind,
                marker.label.as_deref().unwrap_or("-"),
                marker.x,
                marker.y
            ));
        }
        std::fs::write(path, lines.join("\n") + "\n")?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
