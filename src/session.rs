//! The annotation session: all mutable editing state for one image.

use crate::constants::zoom;
use crate::history::Snapshot;
use crate::model::{CropRect, ImageRef, Point, Polygon};

/// Which annotation tool is active.
///
/// Exactly one mode is active at a time. `None` is the startup state
/// before the user has picked a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// No tool active; clicks only select
    #[default]
    None,
    /// Clicks build a polygon outline
    Polygon,
    /// Drags create and adjust the crop rectangle
    Crop,
}

impl Mode {
    /// Display name for the mode.
    pub fn name(&self) -> &'static str {
        match self {
            Mode::None => "Select",
            Mode::Polygon => "Polygon",
            Mode::Crop => "Crop",
        }
    }

    /// All modes, in toolbar order.
    pub fn all() -> &'static [Mode] {
        &[Mode::None, Mode::Polygon, Mode::Crop]
    }
}

/// Scale and pan applied when mapping image space to screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl ViewTransform {
    /// Back to scale 1, no pan.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Map an image-space point to screen space.
    pub fn to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.pan_x, p.y * self.scale + self.pan_y)
    }

    /// Map a screen-space point back to image space.
    pub fn to_image(&self, p: Point) -> Point {
        Point::new((p.x - self.pan_x) / self.scale, (p.y - self.pan_y) / self.scale)
    }

    /// Scale by `factor`, keeping the image point under the screen
    /// point `anchor` stationary. The resulting scale is clamped.
    pub fn zoom_at(&mut self, anchor: Point, factor: f32) {
        let new_scale = (self.scale * factor).clamp(zoom::MIN, zoom::MAX);
        let applied = new_scale / self.scale;
        self.pan_x = anchor.x - (anchor.x - self.pan_x) * applied;
        self.pan_y = anchor.y - (anchor.y - self.pan_y) * applied;
        self.scale = new_scale;
    }

    /// Offset the view by the given screen-space deltas.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }
}

/// All mutable editing state for one image.
///
/// Owned by the [`Editor`](crate::controller::Editor); the renderer
/// and exporters only ever borrow it.
#[derive(Debug, Clone)]
pub struct Session {
    /// Active tool
    pub mode: Mode,
    /// The image being annotated
    pub image: Option<ImageRef>,
    /// Finalized polygons in creation order
    pub polygons: Vec<Polygon>,
    /// Vertices of the polygon currently being drawn
    pub draft: Vec<Point>,
    /// The crop rectangle, at most one per session
    pub crop: Option<CropRect>,
    /// Index into `polygons` of the selected polygon
    pub selected: Option<usize>,
    /// Set while a whole-rect crop move is in flight
    pub crop_moving: bool,
    /// Current zoom and pan
    pub view: ViewTransform,
    /// Id suggested for the next finalized polygon
    pub next_id: u32,
    /// Creation counter feeding the color generator
    pub next_color_index: usize,
    /// Explicit aspect ratio for locked crop resizing
    pub aspect_ratio: Option<f32>,
    /// Whether crop resizing honors the aspect ratio
    pub aspect_locked: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A fresh session with no image loaded.
    pub fn new() -> Self {
        Self {
            mode: Mode::None,
            image: None,
            polygons: Vec::new(),
            draft: Vec::new(),
            crop: None,
            selected: None,
            crop_moving: false,
            view: ViewTransform::default(),
            next_id: 1,
            next_color_index: 0,
            aspect_ratio: None,
            aspect_locked: false,
        }
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Dimensions of the loaded image, in pixels.
    pub fn image_size(&self) -> Option<(f32, f32)> {
        self.image
            .as_ref()
            .map(|img| (img.width() as f32, img.height() as f32))
    }

    /// Replace the image and start a fresh annotation pass over it.
    pub fn load_image(&mut self, image: ImageRef) {
        self.image = Some(image);
        self.reset();
        self.view.reset();
    }

    /// Clear all annotation state, keeping the image and view.
    pub fn reset(&mut self) {
        self.polygons.clear();
        self.draft.clear();
        self.crop = None;
        self.selected = None;
        self.crop_moving = false;
        self.next_id = 1;
        self.next_color_index = 0;
    }

    /// Switch tools, discarding only transient drawing state.
    /// Finalized polygons and the crop rectangle survive.
    ///
    /// Returns whether an in-progress polygon was discarded.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        let discarded = !self.draft.is_empty();
        self.draft.clear();
        self.crop_moving = false;
        self.mode = mode;
        if discarded {
            log::debug!("Mode switch to {} discarded an in-progress polygon", mode.name());
        }
        discarded
    }

    /// Aspect ratio used for locked resizing: the explicit setting if
    /// one was made, otherwise the image's own width/height ratio.
    pub fn effective_aspect_ratio(&self) -> Option<f32> {
        self.aspect_ratio
            .or_else(|| self.image_size().map(|(w, h)| w / h))
    }

    /// The selected polygon, when the selection is still valid.
    pub fn selected_polygon(&self) -> Option<&Polygon> {
        self.selected.and_then(|i| self.polygons.get(i))
    }

    /// Deep copy of the undoable state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            polygons: self.polygons.clone(),
            draft: self.draft.clone(),
            crop: self.crop,
            next_id: self.next_id,
            next_color_index: self.next_color_index,
            selected: self.selected,
        }
    }

    /// Restore state captured by [`Session::snapshot`].
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.polygons = snapshot.polygons;
        self.draft = snapshot.draft;
        self.crop = snapshot.crop;
        self.next_id = snapshot.next_id;
        self.next_color_index = snapshot.next_color_index;
        self.selected = snapshot.selected;
        self.crop_moving = false;
    }
}
