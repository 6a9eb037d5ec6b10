//! Scene construction: session state becomes an ordered list of
//! screen-space draw commands.
//!
//! Rendering is a pure function of the session plus the current
//! pointer position. The desktop shell replays the commands with its
//! painting backend; tests inspect them directly, with no display
//! involved.

use crate::color::Rgb;
use crate::constants::{label, style};
use crate::model::{Handle, MIN_VERTICES, Point, Polygon};
use crate::session::Session;

/// Line styling for outlines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub width: f32,
    pub dashed: bool,
}

impl Stroke {
    pub fn solid(color: Rgb, width: f32) -> Self {
        Self {
            color,
            width,
            dashed: false,
        }
    }

    pub fn dashed(color: Rgb, width: f32) -> Self {
        Self {
            color,
            width,
            dashed: true,
        }
    }
}

/// One screen-space drawing primitive.
///
/// All coordinates are screen pixels with the view transform already
/// applied. Stroke widths, marker radii, and handle sizes are screen
/// pixels too, so annotation chrome keeps its size at every zoom
/// level.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// The base image, positioned and scaled
    Image { origin: Point, scale: f32 },
    /// An open or closed polyline
    Outline {
        points: Vec<Point>,
        closed: bool,
        stroke: Stroke,
    },
    /// A filled circle marking a vertex
    Marker {
        center: Point,
        radius: f32,
        color: Rgb,
    },
    /// A filled square, used for crop resize handles
    HandleSquare {
        center: Point,
        size: f32,
        color: Rgb,
    },
    /// Label text anchored at its center
    Text {
        position: Point,
        text: String,
        size: f32,
        color: Rgb,
    },
}

/// Build the draw list for one frame.
///
/// `pointer` is the pointer position in image space, used for the
/// dashed preview segments while a polygon is being drawn. Commands
/// are ordered back to front: image, finalized polygons, the
/// in-progress outline, then the crop rectangle.
pub fn render(session: &Session, pointer: Option<Point>) -> Vec<DrawCommand> {
    let mut out = Vec::new();

    if session.has_image() {
        out.push(DrawCommand::Image {
            origin: session.view.to_screen(Point::new(0.0, 0.0)),
            scale: session.view.scale,
        });
    }

    for (index, poly) in session.polygons.iter().enumerate() {
        push_polygon(session, index, poly, &mut out);
    }
    push_draft(session, pointer, &mut out);
    push_crop(session, &mut out);

    out
}

fn push_polygon(session: &Session, index: usize, poly: &Polygon, out: &mut Vec<DrawCommand>) {
    let view = &session.view;
    let selected = session.selected == Some(index);
    let screen: Vec<Point> = poly.points.iter().map(|&p| view.to_screen(p)).collect();

    let stroke = if selected {
        Stroke::solid(style::HIGHLIGHT_COLOR, style::SELECTED_STROKE_WIDTH)
    } else {
        Stroke::solid(poly.color, style::STROKE_WIDTH)
    };
    out.push(DrawCommand::Outline {
        points: screen.clone(),
        closed: true,
        stroke,
    });

    for &center in &screen {
        out.push(DrawCommand::Marker {
            center,
            radius: style::MARKER_RADIUS,
            color: poly.color,
        });
    }

    if let Some((width, height)) = session.image_size() {
        out.push(DrawCommand::Text {
            position: view.to_screen(place_label(poly, width, height)),
            text: format!("{} ({})", poly.label, poly.id),
            size: style::LABEL_SIZE,
            color: style::LABEL_COLOR,
        });
    }
}

fn push_draft(session: &Session, pointer: Option<Point>, out: &mut Vec<DrawCommand>) {
    if session.draft.is_empty() {
        return;
    }
    let view = &session.view;
    let screen: Vec<Point> = session.draft.iter().map(|&p| view.to_screen(p)).collect();

    if screen.len() >= 2 {
        out.push(DrawCommand::Outline {
            points: screen.clone(),
            closed: false,
            stroke: Stroke::solid(style::DRAFT_COLOR, style::STROKE_WIDTH),
        });
    }
    for &center in &screen {
        out.push(DrawCommand::Marker {
            center,
            radius: style::MARKER_RADIUS,
            color: style::DRAFT_COLOR,
        });
    }

    // Preview from the last vertex to the pointer; once the outline
    // can close, a second dash back to the first vertex signals it
    let Some(pointer) = pointer else {
        return;
    };
    let pointer_screen = view.to_screen(pointer);
    let dash = Stroke::dashed(style::DRAFT_COLOR, style::STROKE_WIDTH);
    if let Some(&last) = screen.last() {
        out.push(DrawCommand::Outline {
            points: vec![last, pointer_screen],
            closed: false,
            stroke: dash,
        });
    }
    if session.draft.len() >= MIN_VERTICES {
        out.push(DrawCommand::Outline {
            points: vec![pointer_screen, screen[0]],
            closed: false,
            stroke: dash,
        });
    }
}

fn push_crop(session: &Session, out: &mut Vec<DrawCommand>) {
    let Some(rect) = session.crop else {
        return;
    };
    let view = &session.view;

    let corners = vec![
        view.to_screen(Point::new(rect.x1, rect.y1)),
        view.to_screen(Point::new(rect.x2, rect.y1)),
        view.to_screen(Point::new(rect.x2, rect.y2)),
        view.to_screen(Point::new(rect.x1, rect.y2)),
    ];
    let stroke = if session.crop_moving {
        Stroke::dashed(style::CROP_COLOR, style::CROP_STROKE_WIDTH)
    } else {
        Stroke::solid(style::CROP_COLOR, style::CROP_STROKE_WIDTH)
    };
    out.push(DrawCommand::Outline {
        points: corners,
        closed: true,
        stroke,
    });

    for &handle in Handle::all() {
        out.push(DrawCommand::HandleSquare {
            center: view.to_screen(rect.handle_position(handle)),
            size: style::HANDLE_SIZE,
            color: style::CROP_COLOR,
        });
    }
}

/// Choose where a polygon's label goes, in image space.
///
/// Candidates ring the first vertex in a fixed priority order. The
/// first one that stays inside the image and keeps clear of every
/// vertex of the polygon wins. When all candidates collide, the label
/// sits at a fixed offset above the first vertex. The choice depends
/// only on the polygon and image size, never on iteration state.
pub fn place_label(poly: &Polygon, width: f32, height: f32) -> Point {
    let Some(&anchor) = poly.points.first() else {
        return Point::new(0.0, 0.0);
    };

    for (dx, dy) in label::CANDIDATE_OFFSETS {
        let candidate = anchor.translated(dx, dy);
        let in_bounds = candidate.x >= 0.0
            && candidate.y >= 0.0
            && candidate.x <= width
            && candidate.y <= height;
        let clear = poly
            .points
            .iter()
            .all(|v| v.distance_to(&candidate) >= label::CLEARANCE);
        if in_bounds && clear {
            return candidate;
        }
    }

    anchor.translated(label::FALLBACK_OFFSET.0, label::FALLBACK_OFFSET.1)
}
