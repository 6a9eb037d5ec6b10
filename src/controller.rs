//! The interaction controller: discrete pointer and keyboard events
//! become session mutations.
//!
//! Every mutating operation snapshots the session into the undo
//! history first, so one undo step reverses exactly one operation. A
//! whole drag gesture counts as a single operation: the snapshot is
//! taken when the drag starts, not per pointer move.

use crate::color::polygon_color;
use crate::constants::threshold;
use crate::error::EditorError;
use crate::history::History;
use crate::model::{CropRect, Handle, ImageRef, MIN_VERTICES, Point, Polygon, lock_aspect};
use crate::session::{Mode, Session};

/// What a drag gesture is currently acting on.
///
/// Offsets record the gap between the pointer and the dragged anchor
/// at grab time, so updates follow the pointer without snapping the
/// anchor underneath it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragTarget {
    /// A vertex of a finalized polygon
    PolygonVertex {
        polygon: usize,
        vertex: usize,
        offset_x: f32,
        offset_y: f32,
    },
    /// A vertex of the in-progress polygon
    DraftVertex {
        vertex: usize,
        offset_x: f32,
        offset_y: f32,
    },
    /// A finalized polygon being translated as a whole
    WholePolygon {
        polygon: usize,
        last_x: f32,
        last_y: f32,
    },
    /// A crop handle being dragged; resizing always works from the
    /// rectangle as it was when the drag started
    CropHandle {
        handle: Handle,
        origin: CropRect,
        start: Point,
    },
    /// The crop rectangle being moved; offset from pointer to its
    /// x1/y1 corner
    CropMove { offset_x: f32, offset_y: f32 },
    /// A new crop rectangle being drawn out from its anchor corner
    CropDraw { anchor: Point },
}

/// What a polygon-mode click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The point was appended to the in-progress polygon
    Appended,
    /// The click landed on the first vertex of a closable outline; the
    /// caller should collect a label and id and call
    /// [`Editor::finalize_polygon`]
    CloseRequested,
    /// Not in polygon mode; nothing happened
    Ignored,
}

/// What [`Editor::delete_selected`] removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deleted {
    Polygon { id: u32, label: String },
    InProgress,
    Crop,
}

/// Owns the session and applies every user-driven mutation to it.
#[derive(Debug, Default)]
pub struct Editor {
    session: Session,
    history: History,
    drag: Option<DragTarget>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    /// An editor whose undo history retains `capacity` snapshots.
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            history: History::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Read-only view of the session for rendering and export.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The active drag target, if a gesture is in flight.
    pub fn drag_target(&self) -> Option<DragTarget> {
        self.drag
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn push_snapshot(&mut self) {
        self.history.push(self.session.snapshot());
    }

    fn require_image(&self) -> Result<(f32, f32), EditorError> {
        self.session
            .image_size()
            .ok_or_else(|| EditorError::invalid_state("no image loaded"))
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Replace the image and start over. Clears the undo history, since
    /// old snapshots refer to coordinates on the previous image.
    pub fn load_image(&mut self, image: ImageRef) {
        self.drag = None;
        self.history.clear();
        self.session.load_image(image);
    }

    /// Switch tools. Only transient drawing state is discarded; the
    /// discard is pushed to history first so the outline is recoverable.
    /// An in-flight gesture is finished first, so a half-drawn crop
    /// rectangle is normalized (or dropped) rather than left inverted.
    ///
    /// Returns whether an in-progress polygon was discarded.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        self.end_drag();
        if !self.session.draft.is_empty() {
            self.push_snapshot();
        }
        self.session.set_mode(mode)
    }

    /// Clear all annotations, keeping the image. Undoable.
    pub fn reset(&mut self) {
        if !self.session.polygons.is_empty()
            || !self.session.draft.is_empty()
            || self.session.crop.is_some()
        {
            self.push_snapshot();
        }
        self.drag = None;
        self.session.reset();
        log::info!("Annotations cleared");
    }

    /// Begin a fresh annotation pass over the same image, as after a
    /// save. Unlike [`Editor::reset`] this also drops the history.
    pub fn restart(&mut self) {
        self.drag = None;
        self.history.clear();
        self.session.reset();
        log::info!("Session restarted");
    }

    /// Toggle the aspect-ratio lock for crop resizing.
    pub fn set_aspect_locked(&mut self, locked: bool) {
        self.session.aspect_locked = locked;
    }

    /// Set (or clear) the explicit crop aspect ratio.
    pub fn set_aspect_ratio(&mut self, ratio: Option<f32>) {
        self.session.aspect_ratio = ratio;
    }

    /// Zoom about a screen-space anchor point.
    pub fn zoom_at(&mut self, anchor: Point, factor: f32) {
        self.session.view.zoom_at(anchor, factor);
    }

    /// Pan the view by screen-space deltas.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.session.view.pan_by(dx, dy);
    }

    // ========================================================================
    // Polygon construction
    // ========================================================================

    /// In polygon mode, append `point` to the in-progress outline. A
    /// click on the first vertex of a ≥3 point outline asks to close
    /// instead: within [`threshold::CLOSE_AXIS`] on both axes or
    /// [`threshold::CLOSE_RADIUS`] euclidean.
    pub fn begin_or_extend_polygon(&mut self, point: Point) -> Result<ClickOutcome, EditorError> {
        self.require_image()?;
        if self.session.mode != Mode::Polygon {
            return Ok(ClickOutcome::Ignored);
        }

        if self.session.draft.len() >= MIN_VERTICES {
            let first = self.session.draft[0];
            if first.axis_distance(&point) <= threshold::CLOSE_AXIS
                || first.distance_to(&point) <= threshold::CLOSE_RADIUS
            {
                log::debug!("Click near first vertex, outline ready to close");
                return Ok(ClickOutcome::CloseRequested);
            }
        }

        self.push_snapshot();
        self.session.draft.push(point);
        log::debug!(
            "Draft vertex {} at ({:.1}, {:.1})",
            self.session.draft.len(),
            point.x,
            point.y
        );
        Ok(ClickOutcome::Appended)
    }

    /// Turn the in-progress outline into a finalized polygon.
    ///
    /// Requires at least [`MIN_VERTICES`] points, a non-empty label,
    /// and a positive id unused by any existing polygon. On failure
    /// nothing is mutated, so the caller can re-prompt and try again.
    pub fn finalize_polygon(&mut self, label: &str, id: u32) -> Result<(), EditorError> {
        self.require_image()?;
        if self.session.draft.len() < MIN_VERTICES {
            return Err(EditorError::validation(
                "polygon",
                format!(
                    "needs at least {} points, has {}",
                    MIN_VERTICES,
                    self.session.draft.len()
                ),
            ));
        }
        let label = label.trim();
        if label.is_empty() {
            return Err(EditorError::validation("label", "must not be empty"));
        }
        if id == 0 {
            return Err(EditorError::validation("id", "must be a positive integer"));
        }
        if self.session.polygons.iter().any(|p| p.id == id) {
            return Err(EditorError::validation(
                "id",
                format!("{} is already in use", id),
            ));
        }

        self.push_snapshot();
        let color = polygon_color(self.session.next_color_index);
        let points = std::mem::take(&mut self.session.draft);
        let vertex_count = points.len();
        self.session.polygons.push(Polygon::new(points, label, id, color));
        self.session.next_color_index += 1;
        self.session.next_id = id.saturating_add(1);
        self.session.selected = Some(self.session.polygons.len() - 1);
        log::info!(
            "Finalized polygon '{}' (id {}) with {} vertices",
            label,
            id,
            vertex_count
        );
        Ok(())
    }

    /// Discard the in-progress outline (polygon mode) or the crop
    /// rectangle (crop mode). Finalized polygons are never affected.
    /// Safe to call when there is nothing to cancel.
    pub fn cancel_in_progress(&mut self) {
        self.drag = None;
        match self.session.mode {
            Mode::Polygon if !self.session.draft.is_empty() => {
                self.push_snapshot();
                self.session.draft.clear();
                log::debug!("Cancelled in-progress polygon");
            }
            Mode::Crop if self.session.crop.is_some() => {
                self.push_snapshot();
                self.session.crop = None;
                self.session.crop_moving = false;
                log::debug!("Cancelled crop rectangle");
            }
            _ => {}
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Hit-test finalized polygons and update the selection. A polygon
    /// is hit by its interior or by any vertex within
    /// [`threshold::VERTEX_HIT`]; overlapping polygons resolve to the
    /// one drawn last. A miss clears the selection.
    ///
    /// Returns whether something was hit.
    pub fn select_at(&mut self, point: Point) -> bool {
        let hit = self
            .session
            .polygons
            .iter()
            .enumerate()
            .rev()
            .find(|(_, poly)| {
                poly.contains(&point) || poly.hit_vertex(&point, threshold::VERTEX_HIT).is_some()
            })
            .map(|(i, _)| i);

        if let Some(i) = hit {
            log::debug!("Selected polygon '{}'", self.session.polygons[i].label);
        }
        self.session.selected = hit;
        hit.is_some()
    }

    // ========================================================================
    // Dragging
    // ========================================================================

    /// Try to grab something under the pointer, in priority order:
    /// finalized-polygon vertices, in-progress vertices, then in crop
    /// mode the crop handles, interior, or a fresh rectangle, and in
    /// polygon/select mode a finalized polygon's interior for a whole
    /// move.
    ///
    /// Returns whether a drag target was grabbed.
    pub fn begin_drag(&mut self, point: Point) -> Result<bool, EditorError> {
        self.require_image()?;
        if self.drag.is_some() {
            return Ok(false);
        }

        // Hit-test first, copying the anchor out, so the session is
        // free to be snapshotted and mutated once a target is known.
        let vertex_hit = self
            .session
            .polygons
            .iter()
            .enumerate()
            .rev()
            .find_map(|(pi, poly)| {
                poly.hit_vertex(&point, threshold::VERTEX_HIT)
                    .map(|vi| (pi, vi, poly.points[vi]))
            });
        if let Some((pi, vi, v)) = vertex_hit {
            self.push_snapshot();
            self.drag = Some(DragTarget::PolygonVertex {
                polygon: pi,
                vertex: vi,
                offset_x: v.x - point.x,
                offset_y: v.y - point.y,
            });
            self.session.selected = Some(pi);
            log::debug!("Dragging vertex {} of polygon {}", vi, pi);
            return Ok(true);
        }

        let draft_hit = self
            .session
            .draft
            .iter()
            .position(|v| v.axis_distance(&point) <= threshold::VERTEX_HIT)
            .map(|vi| (vi, self.session.draft[vi]));
        if let Some((vi, v)) = draft_hit {
            self.push_snapshot();
            self.drag = Some(DragTarget::DraftVertex {
                vertex: vi,
                offset_x: v.x - point.x,
                offset_y: v.y - point.y,
            });
            log::debug!("Dragging draft vertex {}", vi);
            return Ok(true);
        }

        if self.session.mode == Mode::Crop {
            if let Some(rect) = self.session.crop {
                if let Some(handle) = rect.hit_handle(&point, threshold::HANDLE_HIT) {
                    self.push_snapshot();
                    self.drag = Some(DragTarget::CropHandle {
                        handle,
                        origin: rect,
                        start: point,
                    });
                    log::debug!("Dragging crop handle {:?}", handle);
                    return Ok(true);
                }
                if rect.contains(&point) {
                    self.grab_crop_move(rect, point);
                    return Ok(true);
                }
                // A press outside the existing rectangle grabs nothing
                return Ok(false);
            }

            self.push_snapshot();
            self.drag = Some(DragTarget::CropDraw { anchor: point });
            self.session.crop = Some(CropRect::from_corners(point, point));
            log::debug!("Drawing new crop rectangle from ({:.1}, {:.1})", point.x, point.y);
            return Ok(true);
        }

        let body_hit = self
            .session
            .polygons
            .iter()
            .enumerate()
            .rev()
            .find(|(_, poly)| poly.contains(&point))
            .map(|(pi, _)| pi);
        if let Some(pi) = body_hit {
            self.push_snapshot();
            self.session.selected = Some(pi);
            self.drag = Some(DragTarget::WholePolygon {
                polygon: pi,
                last_x: point.x,
                last_y: point.y,
            });
            log::debug!("Dragging whole polygon {}", pi);
            return Ok(true);
        }

        Ok(false)
    }

    /// Grab the crop rectangle for a whole-rect move when the pointer
    /// is over it, regardless of the active tool. This is the
    /// secondary-pointer drag path; in crop mode [`Editor::begin_drag`]
    /// reaches the same target through the rectangle interior.
    ///
    /// Returns whether the rectangle was grabbed.
    pub fn begin_crop_move(&mut self, point: Point) -> Result<bool, EditorError> {
        self.require_image()?;
        if self.drag.is_some() {
            return Ok(false);
        }
        let Some(rect) = self.session.crop else {
            return Ok(false);
        };
        if !rect.contains(&point) {
            return Ok(false);
        }
        self.grab_crop_move(rect, point);
        Ok(true)
    }

    fn grab_crop_move(&mut self, rect: CropRect, point: Point) {
        self.push_snapshot();
        self.session.crop_moving = true;
        self.drag = Some(DragTarget::CropMove {
            offset_x: point.x - rect.x1,
            offset_y: point.y - rect.y1,
        });
        log::debug!("Moving crop rectangle");
    }

    /// Apply the active drag at the new pointer position. No-op when
    /// no drag is active.
    pub fn update_drag(&mut self, point: Point) {
        let Some(target) = self.drag else {
            return;
        };
        let Some((width, height)) = self.session.image_size() else {
            return;
        };

        match target {
            DragTarget::PolygonVertex {
                polygon,
                vertex,
                offset_x,
                offset_y,
            } => {
                if let Some(v) = self
                    .session
                    .polygons
                    .get_mut(polygon)
                    .and_then(|p| p.points.get_mut(vertex))
                {
                    *v = Point::new(point.x + offset_x, point.y + offset_y);
                }
            }
            DragTarget::DraftVertex {
                vertex,
                offset_x,
                offset_y,
            } => {
                if let Some(v) = self.session.draft.get_mut(vertex) {
                    *v = Point::new(point.x + offset_x, point.y + offset_y);
                }
            }
            DragTarget::WholePolygon {
                polygon,
                last_x,
                last_y,
            } => {
                let dx = point.x - last_x;
                let dy = point.y - last_y;
                if let Some(poly) = self.session.polygons.get_mut(polygon) {
                    poly.translate(dx, dy);
                }
                self.drag = Some(DragTarget::WholePolygon {
                    polygon,
                    last_x: point.x,
                    last_y: point.y,
                });
            }
            DragTarget::CropHandle {
                handle,
                origin,
                start,
            } => {
                let mut dx = point.x - start.x;
                let mut dy = point.y - start.y;
                if self.session.aspect_locked {
                    if let Some(aspect) = self.session.effective_aspect_ratio() {
                        (dx, dy) = lock_aspect(dx, dy, aspect);
                    }
                }
                self.session.crop = Some(origin.resized(handle, dx, dy));
            }
            DragTarget::CropMove { offset_x, offset_y } => {
                if let Some(rect) = self.session.crop {
                    self.session.crop =
                        Some(rect.moved_to(point.x - offset_x, point.y - offset_y, width, height));
                }
            }
            DragTarget::CropDraw { anchor } => {
                let mut dx = point.x - anchor.x;
                let mut dy = point.y - anchor.y;
                if self.session.aspect_locked {
                    if let Some(aspect) = self.session.effective_aspect_ratio() {
                        (dx, dy) = lock_aspect(dx, dy, aspect);
                    }
                }
                self.session.crop = Some(CropRect::from_corners(anchor, anchor.translated(dx, dy)));
            }
        }
    }

    /// Finish the active gesture. Crop rectangles are normalized and
    /// clamped into the image here; a crop drawn with no size at all
    /// (a stray click) is dropped.
    pub fn end_drag(&mut self) {
        let Some(target) = self.drag.take() else {
            return;
        };
        self.session.crop_moving = false;

        let touches_crop = matches!(
            target,
            DragTarget::CropHandle { .. } | DragTarget::CropMove { .. } | DragTarget::CropDraw { .. }
        );
        if touches_crop {
            if let (Some(rect), Some((width, height))) =
                (self.session.crop, self.session.image_size())
            {
                let done = rect.finalized(width, height);
                let degenerate = done.width() < 1.0 && done.height() < 1.0;
                if matches!(target, DragTarget::CropDraw { .. }) && degenerate {
                    self.session.crop = None;
                } else {
                    self.session.crop = Some(done);
                }
            }
        }
        log::debug!("Drag finished");
    }

    // ========================================================================
    // Deletion and undo
    // ========================================================================

    /// Remove exactly one thing, in priority order: the selected
    /// polygon, else the most recently drawn polygon, else the
    /// in-progress outline, else the crop rectangle.
    ///
    /// Returns what was removed, or `None` if there was nothing.
    pub fn delete_selected(&mut self) -> Option<Deleted> {
        let selected = self
            .session
            .selected
            .filter(|&i| i < self.session.polygons.len());

        if let Some(i) = selected {
            self.push_snapshot();
            let poly = self.session.polygons.remove(i);
            self.session.selected = None;
            log::info!("Deleted polygon '{}' (id {})", poly.label, poly.id);
            return Some(Deleted::Polygon {
                id: poly.id,
                label: poly.label,
            });
        }

        if !self.session.polygons.is_empty() {
            self.push_snapshot();
            let poly = self.session.polygons.pop()?;
            self.session.selected = None;
            log::info!("Deleted newest polygon '{}' (id {})", poly.label, poly.id);
            return Some(Deleted::Polygon {
                id: poly.id,
                label: poly.label,
            });
        }

        if !self.session.draft.is_empty() {
            self.push_snapshot();
            self.session.draft.clear();
            log::info!("Deleted in-progress polygon");
            return Some(Deleted::InProgress);
        }

        if self.session.crop.is_some() {
            self.push_snapshot();
            self.session.crop = None;
            log::info!("Deleted crop rectangle");
            return Some(Deleted::Crop);
        }

        None
    }

    /// Restore the most recent snapshot. Returns `false` when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.pop() else {
            log::info!("Nothing to undo");
            return false;
        };
        self.drag = None;
        self.session.restore(snapshot);
        log::info!("Undid last operation");
        true
    }

    /// Replace the polygon list from an imported document, advancing
    /// the id and color counters past the imported maxima. The whole
    /// batch is validated up front; a rejected import changes nothing.
    pub fn import_polygons(&mut self, polygons: Vec<Polygon>) -> Result<(), EditorError> {
        self.require_image()?;
        let mut seen_ids = Vec::with_capacity(polygons.len());
        for poly in &polygons {
            if poly.points.len() < MIN_VERTICES {
                return Err(EditorError::validation(
                    "points",
                    format!(
                        "polygon {} has {} points, need at least {}",
                        poly.id,
                        poly.points.len(),
                        MIN_VERTICES
                    ),
                ));
            }
            if poly.label.trim().is_empty() {
                return Err(EditorError::validation(
                    "label",
                    format!("polygon {} has an empty label", poly.id),
                ));
            }
            if poly.id == 0 {
                return Err(EditorError::validation("id", "ids must be positive"));
            }
            if seen_ids.contains(&poly.id) {
                return Err(EditorError::validation(
                    "id",
                    format!("duplicate id {}", poly.id),
                ));
            }
            seen_ids.push(poly.id);
        }
        self.push_snapshot();
        self.session.next_id = polygons
            .iter()
            .map(|p| p.id)
            .max()
            .map_or(1, |m| m.saturating_add(1));
        self.session.next_color_index = polygons.len();
        self.session.polygons = polygons;
        self.session.selected = None;
        log::info!("Imported {} polygons", self.session.polygons.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn editor_with_image() -> Editor {
        let mut editor = Editor::new();
        editor.load_image(ImageRef::from_pixels(RgbaImage::new(800, 600)));
        editor
    }

    fn polygon_editor() -> Editor {
        let mut editor = editor_with_image();
        editor.set_mode(Mode::Polygon);
        editor
    }

    fn crop_editor() -> Editor {
        let mut editor = editor_with_image();
        editor.set_mode(Mode::Crop);
        editor
    }

    fn click(editor: &mut Editor, x: f32, y: f32) -> ClickOutcome {
        editor.begin_or_extend_polygon(Point::new(x, y)).unwrap()
    }

    fn drag(editor: &mut Editor, from: (f32, f32), to: (f32, f32)) {
        assert!(editor.begin_drag(Point::new(from.0, from.1)).unwrap());
        editor.update_drag(Point::new(to.0, to.1));
        editor.end_drag();
    }

    #[test]
    fn test_four_clicks_then_finalize() {
        let mut editor = polygon_editor();
        click(&mut editor, 100.0, 100.0);
        click(&mut editor, 200.0, 100.0);
        click(&mut editor, 200.0, 200.0);
        click(&mut editor, 100.0, 200.0);

        editor.finalize_polygon("Box", 1).unwrap();

        let session = editor.session();
        assert_eq!(session.polygons.len(), 1);
        let poly = &session.polygons[0];
        assert_eq!(
            poly.points,
            vec![
                Point::new(100.0, 100.0),
                Point::new(200.0, 100.0),
                Point::new(200.0, 200.0),
                Point::new(100.0, 200.0),
            ]
        );
        assert_eq!(poly.label, "Box");
        assert_eq!(poly.id, 1);
        assert_eq!(poly.color, polygon_color(0));
        assert_eq!(session.next_id, 2);
        assert_eq!(session.selected, Some(0));
        assert!(session.draft.is_empty());
    }

    #[test]
    fn test_click_near_first_vertex_requests_close() {
        let mut editor = polygon_editor();
        click(&mut editor, 100.0, 100.0);
        click(&mut editor, 200.0, 100.0);
        click(&mut editor, 150.0, 180.0);

        // Within 5px on each axis of the first vertex
        assert_eq!(click(&mut editor, 104.0, 96.0), ClickOutcome::CloseRequested);
        // Within 10px euclidean but more than 5px on one axis
        assert_eq!(click(&mut editor, 100.0, 109.0), ClickOutcome::CloseRequested);
        // Too far on both measures: appended as a normal vertex
        assert_eq!(click(&mut editor, 111.0, 100.0), ClickOutcome::Appended);
        assert_eq!(editor.session().draft.len(), 4);
    }

    #[test]
    fn test_close_needs_three_vertices() {
        let mut editor = polygon_editor();
        click(&mut editor, 100.0, 100.0);
        // Clicking the first vertex again with only one point just appends
        assert_eq!(click(&mut editor, 101.0, 101.0), ClickOutcome::Appended);
        assert_eq!(editor.session().draft.len(), 2);
    }

    #[test]
    fn test_finalize_validation() {
        let mut editor = polygon_editor();
        click(&mut editor, 0.0, 0.0);
        click(&mut editor, 10.0, 0.0);

        // Two points is not enough
        let err = editor.finalize_polygon("Box", 1).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(editor.session().draft.len(), 2);

        click(&mut editor, 10.0, 10.0);
        assert!(editor.finalize_polygon("", 1).unwrap_err().is_validation());
        assert!(editor.finalize_polygon("  ", 1).unwrap_err().is_validation());
        assert!(editor.finalize_polygon("Box", 0).unwrap_err().is_validation());
        // Failed attempts leave the outline untouched
        assert_eq!(editor.session().draft.len(), 3);

        editor.finalize_polygon("Box", 1).unwrap();
        assert_eq!(editor.session().polygons.len(), 1);
    }

    #[test]
    fn test_finalize_rejects_duplicate_id() {
        let mut editor = polygon_editor();
        click(&mut editor, 0.0, 0.0);
        click(&mut editor, 10.0, 0.0);
        click(&mut editor, 10.0, 10.0);
        editor.finalize_polygon("first", 1).unwrap();

        click(&mut editor, 50.0, 50.0);
        click(&mut editor, 60.0, 50.0);
        click(&mut editor, 60.0, 60.0);
        assert!(editor.finalize_polygon("second", 1).unwrap_err().is_validation());
        editor.finalize_polygon("second", 2).unwrap();
        assert_eq!(editor.session().next_id, 3);
    }

    #[test]
    fn test_cancel_in_progress_idempotent() {
        let mut editor = polygon_editor();
        click(&mut editor, 0.0, 0.0);
        click(&mut editor, 10.0, 0.0);

        editor.cancel_in_progress();
        let after_first = editor.session().snapshot();
        editor.cancel_in_progress();
        assert_eq!(editor.session().snapshot(), after_first);
        assert!(editor.session().draft.is_empty());
    }

    #[test]
    fn test_select_at_prefers_last_drawn() {
        let mut editor = polygon_editor();
        for (label, id, offset) in [("under", 1, 0.0), ("over", 2, 20.0)] {
            click(&mut editor, 100.0 + offset, 100.0);
            click(&mut editor, 300.0 + offset, 100.0);
            click(&mut editor, 300.0 + offset, 300.0);
            click(&mut editor, 100.0 + offset, 300.0);
            editor.finalize_polygon(label, id).unwrap();
        }

        // Overlap region hits the later polygon
        assert!(editor.select_at(Point::new(200.0, 200.0)));
        assert_eq!(editor.session().selected_polygon().unwrap().label, "over");

        // Only the first polygon covers this spot
        assert!(editor.select_at(Point::new(105.0, 200.0)));
        assert_eq!(editor.session().selected_polygon().unwrap().label, "under");

        // A miss clears the selection
        assert!(!editor.select_at(Point::new(700.0, 500.0)));
        assert_eq!(editor.session().selected, None);
    }

    #[test]
    fn test_vertex_drag_keeps_grab_offset() {
        let mut editor = polygon_editor();
        click(&mut editor, 100.0, 100.0);
        click(&mut editor, 200.0, 100.0);
        click(&mut editor, 200.0, 200.0);
        editor.finalize_polygon("tri", 1).unwrap();

        // Grab 3px away from the vertex; the gap must persist
        assert!(editor.begin_drag(Point::new(203.0, 103.0)).unwrap());
        editor.update_drag(Point::new(253.0, 153.0));
        editor.end_drag();

        assert_eq!(editor.session().polygons[0].points[1], Point::new(250.0, 150.0));
    }

    #[test]
    fn test_whole_polygon_drag_translates_all_points() {
        let mut editor = polygon_editor();
        click(&mut editor, 100.0, 100.0);
        click(&mut editor, 200.0, 100.0);
        click(&mut editor, 150.0, 200.0);
        editor.finalize_polygon("tri", 1).unwrap();

        assert!(editor.begin_drag(Point::new(150.0, 130.0)).unwrap());
        editor.update_drag(Point::new(160.0, 140.0));
        editor.update_drag(Point::new(175.0, 160.0));
        editor.end_drag();

        let poly = &editor.session().polygons[0];
        assert_eq!(poly.points[0], Point::new(125.0, 130.0));
        assert_eq!(poly.points[1], Point::new(225.0, 130.0));
        assert_eq!(poly.points[2], Point::new(175.0, 230.0));
    }

    #[test]
    fn test_drag_prefers_finalized_vertex_over_draft() {
        let mut editor = polygon_editor();
        click(&mut editor, 100.0, 100.0);
        click(&mut editor, 200.0, 100.0);
        click(&mut editor, 150.0, 200.0);
        editor.finalize_polygon("tri", 1).unwrap();

        // A fresh draft vertex right next to a finalized one
        click(&mut editor, 202.0, 102.0);

        drag(&mut editor, (200.0, 100.0), (300.0, 50.0));
        assert_eq!(editor.session().polygons[0].points[1], Point::new(300.0, 50.0));
        assert_eq!(editor.session().draft[0], Point::new(202.0, 102.0));
    }

    #[test]
    fn test_draft_vertex_drag() {
        let mut editor = polygon_editor();
        click(&mut editor, 100.0, 100.0);
        click(&mut editor, 200.0, 100.0);

        drag(&mut editor, (200.0, 100.0), (220.0, 90.0));
        assert_eq!(editor.session().draft[1], Point::new(220.0, 90.0));
    }

    #[test]
    fn test_crop_draw_with_aspect_lock() {
        let mut editor = crop_editor();
        editor.set_aspect_ratio(Some(16.0 / 9.0));
        editor.set_aspect_locked(true);

        drag(&mut editor, (50.0, 50.0), (450.0, 350.0));

        // Width drove the resize: height = 400 / (16/9) = 225
        let rect = editor.session().crop.unwrap();
        assert!((rect.x1 - 50.0).abs() < 1e-3);
        assert!((rect.y1 - 50.0).abs() < 1e-3);
        assert!((rect.x2 - 450.0).abs() < 1e-3);
        assert!((rect.y2 - 275.0).abs() < 1e-3);
    }

    #[test]
    fn test_crop_handle_resize_keeps_opposite_corner() {
        let mut editor = crop_editor();
        drag(&mut editor, (100.0, 100.0), (300.0, 250.0));
        assert_eq!(editor.session().crop.unwrap(), CropRect::new(100.0, 100.0, 300.0, 250.0));

        // Grab the south-east handle and pull outward
        drag(&mut editor, (300.0, 250.0), (340.0, 280.0));
        let rect = editor.session().crop.unwrap();
        assert_eq!(rect, CropRect::new(100.0, 100.0, 340.0, 280.0));
    }

    #[test]
    fn test_crop_move_clamps_to_image() {
        let mut editor = crop_editor();
        drag(&mut editor, (100.0, 100.0), (300.0, 250.0));

        // Grab the interior and push far past the top-left corner
        assert!(editor.begin_drag(Point::new(200.0, 175.0)).unwrap());
        assert!(editor.session().crop_moving);
        editor.update_drag(Point::new(-500.0, -500.0));
        editor.end_drag();

        assert!(!editor.session().crop_moving);
        assert_eq!(editor.session().crop.unwrap(), CropRect::new(0.0, 0.0, 200.0, 150.0));
    }

    #[test]
    fn test_crop_finalize_normalizes_out_of_bounds_drag() {
        let mut editor = crop_editor();
        // Drag up-left past the image edge: corners swap and clamp
        drag(&mut editor, (450.0, 300.0), (-60.0, -40.0));

        let rect = editor.session().crop.unwrap();
        assert_eq!(rect, CropRect::new(0.0, 0.0, 450.0, 300.0));
        assert!(rect.x1 <= rect.x2 && rect.y1 <= rect.y2);
    }

    #[test]
    fn test_stray_click_leaves_no_crop() {
        let mut editor = crop_editor();
        assert!(editor.begin_drag(Point::new(100.0, 100.0)).unwrap());
        editor.end_drag();
        assert_eq!(editor.session().crop, None);
    }

    #[test]
    fn test_press_outside_existing_crop_grabs_nothing() {
        let mut editor = crop_editor();
        drag(&mut editor, (100.0, 100.0), (200.0, 200.0));
        assert!(!editor.begin_drag(Point::new(400.0, 400.0)).unwrap());
        assert_eq!(editor.session().crop.unwrap(), CropRect::new(100.0, 100.0, 200.0, 200.0));
    }

    #[test]
    fn test_delete_priority_order() {
        let mut editor = polygon_editor();

        // Two polygons, one selected
        for (label, id) in [("a", 1), ("b", 2)] {
            click(&mut editor, 100.0, 100.0);
            click(&mut editor, 200.0, 100.0);
            click(&mut editor, 150.0, 200.0);
            editor.finalize_polygon(label, id).unwrap();
        }
        editor.select_at(Point::new(150.0, 130.0));

        // 1. selected polygon goes first
        assert_eq!(
            editor.delete_selected(),
            Some(Deleted::Polygon { id: 2, label: "b".into() })
        );
        // 2. with no selection, the newest polygon goes
        assert_eq!(
            editor.delete_selected(),
            Some(Deleted::Polygon { id: 1, label: "a".into() })
        );

        // 3. then the in-progress outline
        click(&mut editor, 10.0, 10.0);
        editor.session.crop = Some(CropRect::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(editor.delete_selected(), Some(Deleted::InProgress));

        // 4. and finally the crop rectangle
        assert_eq!(editor.delete_selected(), Some(Deleted::Crop));
        assert_eq!(editor.delete_selected(), None);
    }

    #[test]
    fn test_undo_reverses_each_operation_exactly() {
        let mut editor = polygon_editor();
        click(&mut editor, 100.0, 100.0);
        click(&mut editor, 200.0, 100.0);
        click(&mut editor, 150.0, 200.0);
        let before_finalize = editor.session().snapshot();

        editor.finalize_polygon("tri", 1).unwrap();
        assert!(editor.undo());
        assert_eq!(editor.session().snapshot(), before_finalize);

        // A whole drag gesture is one undo step
        editor.finalize_polygon("tri", 1).unwrap();
        let before_drag = editor.session().snapshot();
        assert!(editor.begin_drag(Point::new(200.0, 100.0)).unwrap());
        editor.update_drag(Point::new(300.0, 120.0));
        editor.update_drag(Point::new(320.0, 140.0));
        editor.end_drag();
        assert!(editor.undo());
        assert_eq!(editor.session().snapshot(), before_drag);
    }

    #[test]
    fn test_undo_empty_history() {
        let mut editor = editor_with_image();
        assert!(!editor.undo());
    }

    #[test]
    fn test_history_capacity_evicts_oldest() {
        let mut editor = polygon_editor();
        // 52 appended vertices produce 52 pushes into a 50-slot history
        for i in 0..52 {
            click(&mut editor, i as f32 * 10.0, 0.0);
        }

        let mut undone = 0;
        while editor.undo() {
            undone += 1;
        }
        assert_eq!(undone, 50);
        // The two oldest pushes were evicted, so two vertices survive
        assert_eq!(editor.session().draft.len(), 2);
    }

    #[test]
    fn test_custom_history_capacity() {
        let mut editor = Editor::with_history_capacity(2);
        editor.load_image(ImageRef::from_pixels(RgbaImage::new(800, 600)));
        editor.set_mode(Mode::Polygon);
        for i in 0..4 {
            click(&mut editor, i as f32 * 10.0, 0.0);
        }

        let mut undone = 0;
        while editor.undo() {
            undone += 1;
        }
        assert_eq!(undone, 2);
        assert_eq!(editor.session().draft.len(), 2);
    }

    #[test]
    fn test_operations_require_image() {
        let mut editor = Editor::new();
        editor.set_mode(Mode::Polygon);

        assert!(matches!(
            editor.begin_or_extend_polygon(Point::new(0.0, 0.0)),
            Err(EditorError::InvalidState { .. })
        ));
        assert!(matches!(
            editor.finalize_polygon("x", 1),
            Err(EditorError::InvalidState { .. })
        ));
        assert!(matches!(
            editor.begin_drag(Point::new(0.0, 0.0)),
            Err(EditorError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_mode_switch_finalizes_in_flight_crop_drag() {
        let mut editor = crop_editor();
        assert!(editor.begin_drag(Point::new(400.0, 300.0)).unwrap());
        editor.update_drag(Point::new(100.0, 50.0));

        // Keyboard tool switch mid-gesture: the rect must come out
        // normalized, not inverted
        editor.set_mode(Mode::Polygon);

        assert!(editor.drag_target().is_none());
        let rect = editor.session().crop.unwrap();
        assert_eq!(rect, CropRect::new(100.0, 50.0, 400.0, 300.0));
        assert!(rect.x1 <= rect.x2 && rect.y1 <= rect.y2);
    }

    #[test]
    fn test_mode_switch_drops_in_flight_stray_crop_click() {
        let mut editor = crop_editor();
        assert!(editor.begin_drag(Point::new(100.0, 100.0)).unwrap());
        editor.set_mode(Mode::Polygon);
        assert_eq!(editor.session().crop, None);
    }

    #[test]
    fn test_crop_move_by_secondary_pointer_in_any_mode() {
        let mut editor = crop_editor();
        drag(&mut editor, (100.0, 100.0), (300.0, 250.0));
        editor.set_mode(Mode::Polygon);

        // Over the rect: grabbed and moved, still clamped to the image
        assert!(editor.begin_crop_move(Point::new(200.0, 175.0)).unwrap());
        assert!(editor.session().crop_moving);
        editor.update_drag(Point::new(900.0, 175.0));
        editor.end_drag();
        assert_eq!(editor.session().crop.unwrap(), CropRect::new(600.0, 100.0, 800.0, 250.0));

        // Outside the rect, or with no rect at all: nothing grabbed
        assert!(!editor.begin_crop_move(Point::new(10.0, 10.0)).unwrap());
        editor.set_mode(Mode::Crop);
        editor.cancel_in_progress();
        assert!(!editor.begin_crop_move(Point::new(700.0, 175.0)).unwrap());
    }

    #[test]
    fn test_mode_switch_discard_is_undoable() {
        let mut editor = polygon_editor();
        click(&mut editor, 10.0, 10.0);
        click(&mut editor, 20.0, 10.0);

        assert!(editor.set_mode(Mode::Crop));
        assert!(editor.session().draft.is_empty());

        assert!(editor.undo());
        assert_eq!(editor.session().draft.len(), 2);
    }

    #[test]
    fn test_import_polygons_advances_counters() {
        let mut editor = editor_with_image();
        let polygons = vec![
            Polygon::new(
                vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)],
                "a",
                3,
                polygon_color(0),
            ),
            Polygon::new(
                vec![Point::new(20.0, 20.0), Point::new(30.0, 20.0), Point::new(30.0, 30.0)],
                "b",
                7,
                polygon_color(1),
            ),
        ];

        editor.import_polygons(polygons).unwrap();
        assert_eq!(editor.session().next_id, 8);
        assert_eq!(editor.session().next_color_index, 2);
        assert_eq!(editor.session().polygons.len(), 2);
    }

    #[test]
    fn test_import_rejects_malformed_documents() {
        let triangle =
            || vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];

        let mut editor = editor_with_image();
        let two_points = vec![Polygon {
            points: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
            label: "short".to_string(),
            id: 1,
            color: polygon_color(0),
        }];
        assert!(editor.import_polygons(two_points).unwrap_err().is_validation());

        let blank_label = vec![Polygon::new(triangle(), "   ", 1, polygon_color(0))];
        assert!(editor.import_polygons(blank_label).unwrap_err().is_validation());

        let zero_id = vec![Polygon::new(triangle(), "a", 0, polygon_color(0))];
        assert!(editor.import_polygons(zero_id).unwrap_err().is_validation());

        let duplicates = vec![
            Polygon::new(triangle(), "a", 4, polygon_color(0)),
            Polygon::new(triangle(), "b", 4, polygon_color(1)),
        ];
        assert!(editor.import_polygons(duplicates).unwrap_err().is_validation());

        // Nothing mutated, nothing pushed to history.
        assert!(editor.session().polygons.is_empty());
        assert!(!editor.can_undo());
    }
}
