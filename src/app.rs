//! Desktop shell for the polygon and crop annotation editor.
//!
//! Single-window eframe application:
//! - Top toolbar: tool switch, aspect lock, undo/delete, open/import/save
//! - Center: image canvas with pointer-driven drawing
//! - Bottom status bar: mode, counts, last message
//!
//! The shell owns the [`Editor`] and stays a translation layer: egui
//! input becomes controller calls, painting replays the renderer's
//! [`DrawCommand`] list, and file paths come from the [`Dialogs`]
//! collaborator. No annotation decisions are made here.

use std::path::PathBuf;

use crate::color::Rgb;
use crate::config::{AppConfig, KeyBindingsConfig};
use crate::constants::{style, zoom};
use crate::controller::{ClickOutcome, Deleted, Editor};
use crate::dialog::Dialogs;
use crate::error::EditorError;
use crate::export::{
    annotated_path_for, read_polygon_document, write_annotated, write_crop, write_polygons,
};
use crate::keybindings::{Action, KeyBindings};
use crate::model::{ImageRef, MIN_VERTICES, Point, parse_aspect_ratio};
use crate::render::{self, DrawCommand};
use crate::session::{Mode, Session};

// ============================================================================
// Startup
// ============================================================================

/// Resolve the image and starting tool before the window opens.
///
/// A path given on the command line wins over the file dialog. Returns
/// `None` when the user cancels the dialog or the image cannot be
/// decoded; the caller exits quietly in both cases.
pub fn startup(dialogs: &dyn Dialogs, image_arg: Option<PathBuf>) -> Option<(ImageRef, Mode)> {
    let path = match image_arg {
        Some(path) => path,
        None => dialogs.pick_image(None)?,
    };
    let image = match ImageRef::open(&path) {
        Ok(image) => image,
        Err(err) => {
            log::warn!("Failed to open {:?}: {}", path, err);
            dialogs.warn("Could not open image", &err.to_string());
            return None;
        }
    };
    let mode = if dialogs.confirm(
        "Choose tool",
        "Annotate polygons? Choosing Cancel starts in crop mode.",
    ) {
        Mode::Polygon
    } else {
        Mode::Crop
    };
    Some((image, mode))
}

// ============================================================================
// Application state
// ============================================================================

/// Modal input state while a polygon waits for its label and id.
struct LabelPrompt {
    label: String,
    id: String,
    error: Option<String>,
    focus_label: bool,
}

/// The eframe application.
pub struct App {
    editor: Editor,
    dialogs: Box<dyn Dialogs>,
    config: AppConfig,
    bindings: KeyBindings,
    texture: Option<egui::TextureHandle>,
    aspect_text: String,
    label_prompt: Option<LabelPrompt>,
    status: String,
    config_dirty: bool,
}

impl App {
    pub fn new(config: AppConfig, dialogs: Box<dyn Dialogs>, image: ImageRef, mode: Mode) -> Self {
        let mut editor = Editor::with_history_capacity(config.preferences.history_capacity);
        editor.load_image(image);
        editor.set_mode(mode);

        let aspect_text = config.preferences.aspect_ratio.clone();
        if !aspect_text.trim().is_empty() {
            match parse_aspect_ratio(&aspect_text) {
                Ok(ratio) => editor.set_aspect_ratio(Some(ratio)),
                Err(err) => log::warn!("Ignoring stored aspect ratio '{}': {}", aspect_text, err),
            }
        }
        editor.set_aspect_locked(config.preferences.aspect_locked);

        let bindings = config.keybindings.to_keybindings();
        Self {
            editor,
            dialogs,
            config,
            bindings,
            texture: None,
            aspect_text,
            label_prompt: None,
            status: "Ready".to_string(),
            config_dirty: false,
        }
    }

    // ========================================================================
    // Texture upload
    // ========================================================================

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        if let Some(image) = &self.editor.session().image {
            let size = [image.width() as usize, image.height() as usize];
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.pixels.as_raw());
            self.texture =
                Some(ctx.load_texture("annotation-image", color_image, egui::TextureOptions::LINEAR));
        }
    }

    // ========================================================================
    // Action dispatch
    // ========================================================================

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::Undo => {
                if !self.editor.undo() {
                    self.status = "Nothing to undo".to_string();
                }
            }
            Action::Finalize => self.open_label_prompt(),
            Action::Cancel => self.editor.cancel_in_progress(),
            Action::Delete => self.delete_flow(),
            Action::Save => self.save_flow(),
            Action::OpenImage => self.open_image_flow(),
            Action::SelectMode => self.switch_mode(Mode::None),
            Action::PolygonMode => self.switch_mode(Mode::Polygon),
            Action::CropMode => self.switch_mode(Mode::Crop),
            Action::ToggleAspectLock => {
                let locked = !self.editor.session().aspect_locked;
                self.set_aspect_locked(locked);
            }
        }
    }

    fn switch_mode(&mut self, mode: Mode) {
        if self.editor.set_mode(mode) {
            self.status = "Discarded in-progress outline".to_string();
        }
    }

    fn set_aspect_locked(&mut self, locked: bool) {
        self.editor.set_aspect_locked(locked);
        self.config.preferences.aspect_locked = locked;
        self.config_dirty = true;
    }

    /// Apply the toolbar's ratio text. Empty clears the explicit ratio
    /// so the crop falls back to the image's own proportions.
    fn apply_aspect_text(&mut self) {
        let text = self.aspect_text.trim().to_string();
        if text.is_empty() {
            self.editor.set_aspect_ratio(None);
            self.config.preferences.aspect_ratio.clear();
            self.config_dirty = true;
            return;
        }
        match parse_aspect_ratio(&text) {
            Ok(ratio) => {
                self.editor.set_aspect_ratio(Some(ratio));
                self.config.preferences.aspect_ratio = text;
                self.config_dirty = true;
            }
            Err(err) => self.status = err.to_string(),
        }
    }

    fn delete_flow(&mut self) {
        self.status = match self.editor.delete_selected() {
            Some(Deleted::Polygon { id, label }) => format!("Deleted polygon '{label}' ({id})"),
            Some(Deleted::InProgress) => "Discarded in-progress outline".to_string(),
            Some(Deleted::Crop) => "Removed crop rectangle".to_string(),
            None => "Nothing to delete".to_string(),
        };
    }

    // ========================================================================
    // Label prompt
    // ========================================================================

    fn open_label_prompt(&mut self) {
        let session = self.editor.session();
        if session.mode != Mode::Polygon || session.draft.len() < MIN_VERTICES {
            self.status = format!("Need at least {MIN_VERTICES} points to finalize");
            return;
        }
        self.label_prompt = Some(LabelPrompt {
            label: String::new(),
            id: session.next_id.to_string(),
            error: None,
            focus_label: true,
        });
    }

    fn submit_label_prompt(&mut self) {
        let Some(prompt) = self.label_prompt.as_ref() else {
            return;
        };
        let label = prompt.label.clone();
        let id_text = prompt.id.trim().to_string();

        let id = match id_text.parse::<u32>() {
            Ok(id) => id,
            Err(_) => {
                if let Some(prompt) = self.label_prompt.as_mut() {
                    prompt.error = Some(format!("'{id_text}' is not a valid id"));
                }
                return;
            }
        };
        match self.editor.finalize_polygon(&label, id) {
            Ok(()) => {
                self.label_prompt = None;
                self.status = format!("Added polygon '{label}' ({id})");
            }
            Err(err) if err.is_validation() => {
                if let Some(prompt) = self.label_prompt.as_mut() {
                    prompt.error = Some(err.to_string());
                }
            }
            Err(err) => {
                self.label_prompt = None;
                self.status = err.to_string();
            }
        }
    }

    fn label_prompt_window(&mut self, ctx: &egui::Context) {
        if self.label_prompt.is_none() {
            return;
        }
        let mut submit = false;
        let mut cancel = false;
        if let Some(prompt) = self.label_prompt.as_mut() {
            egui::Window::new("Finalize polygon")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.label("Label:");
                        let label_edit = ui.text_edit_singleline(&mut prompt.label);
                        if prompt.focus_label {
                            label_edit.request_focus();
                            prompt.focus_label = false;
                        }
                    });
                    ui.horizontal(|ui| {
                        ui.label("Id:");
                        ui.text_edit_singleline(&mut prompt.id);
                    });
                    if let Some(error) = &prompt.error {
                        ui.colored_label(egui::Color32::LIGHT_RED, error);
                    }
                    ui.horizontal(|ui| {
                        if ui.button("Add").clicked() {
                            submit = true;
                        }
                        if ui.button("Cancel").clicked() {
                            cancel = true;
                        }
                    });
                });
        }
        if submit {
            self.submit_label_prompt();
        }
        if cancel {
            self.label_prompt = None;
        }
    }

    // ========================================================================
    // File flows
    // ========================================================================

    fn start_dir(&self) -> Option<PathBuf> {
        let folder = self.config.preferences.export_folder.trim();
        (!folder.is_empty()).then(|| PathBuf::from(folder))
    }

    fn open_image_flow(&mut self) {
        let Some(path) = self.dialogs.pick_image(self.start_dir().as_deref()) else {
            return;
        };
        match ImageRef::open(&path) {
            Ok(image) => {
                self.editor.load_image(image);
                self.texture = None;
                self.status = format!("Loaded {}", path.display());
            }
            Err(err) => {
                log::warn!("Failed to open {:?}: {}", path, err);
                self.dialogs.warn("Could not open image", &err.to_string());
            }
        }
    }

    fn import_flow(&mut self) {
        let Some(path) = self.dialogs.pick_polygon_document(self.start_dir().as_deref()) else {
            return;
        };
        let outcome = read_polygon_document(&path)
            .and_then(|doc| self.editor.import_polygons(doc.polygons_absolute));
        match outcome {
            Ok(()) => {
                self.status = format!(
                    "Imported {} polygons",
                    self.editor.session().polygons.len()
                );
            }
            Err(err) => {
                log::warn!("Import from {:?} failed: {}", path, err);
                self.dialogs.warn("Import failed", &err.to_string());
            }
        }
    }

    /// Export everything present, then reset for a fresh pass over the
    /// image and offer to move on to the next one. Cancelling any file
    /// dialog aborts the whole flow with the session untouched.
    fn save_flow(&mut self) {
        let session = self.editor.session();
        let has_polygons = !session.polygons.is_empty();
        let has_crop = session.crop.is_some();
        if !has_polygons && !has_crop {
            self.status = "Nothing to save yet".to_string();
            return;
        }

        let mut written: Vec<PathBuf> = Vec::new();
        if has_polygons {
            match self.save_polygons() {
                Ok(Some(path)) => written.push(path),
                Ok(None) => return,
                Err(err) => {
                    self.report_export_error(err);
                    return;
                }
            }
        }
        if has_crop {
            match self.save_crop() {
                Ok(Some(path)) => written.push(path),
                Ok(None) => return,
                Err(err) => {
                    self.report_export_error(err);
                    return;
                }
            }
        }

        if let Some(dir) = written.last().and_then(|path| path.parent()) {
            self.config.preferences.export_folder = dir.display().to_string();
            self.config_dirty = true;
        }
        self.status = format!("Saved {} file(s)", written.len());
        self.editor.restart();

        if self.dialogs.confirm("Continue", "Open the next image?") {
            self.open_image_flow();
        }
    }

    fn save_polygons(&mut self) -> Result<Option<PathBuf>, EditorError> {
        let default_name = default_json_name(self.editor.session());
        let Some(path) = self.dialogs.save_json(self.start_dir().as_deref(), &default_name) else {
            return Ok(None);
        };
        write_polygons(self.editor.session(), &path)?;
        if self.dialogs.confirm(
            "Annotated render",
            "Also write an annotated copy of the image?",
        ) {
            write_annotated(self.editor.session(), &annotated_path_for(&path))?;
        }
        Ok(Some(path))
    }

    fn save_crop(&mut self) -> Result<Option<PathBuf>, EditorError> {
        let default_name = default_crop_name(self.editor.session());
        let Some(path) = self.dialogs.save_image(self.start_dir().as_deref(), &default_name) else {
            return Ok(None);
        };
        write_crop(self.editor.session(), &path)?;
        Ok(Some(path))
    }

    fn report_export_error(&mut self, err: EditorError) {
        log::warn!("Export failed: {err}");
        self.dialogs.warn("Export failed", &err.to_string());
    }

    fn persist_config(&mut self) {
        if !self.config_dirty {
            return;
        }
        self.config.keybindings = KeyBindingsConfig::from(&self.bindings);
        if let Err(err) = self.config.save_to_default_path() {
            log::warn!("Could not save configuration: {err}");
        }
        self.config_dirty = false;
    }

    // ========================================================================
    // Canvas input
    // ========================================================================

    fn image_point(&self, canvas: egui::Rect, pos: egui::Pos2) -> Point {
        let local = pos - canvas.min;
        self.editor.session().view.to_image(Point::new(local.x, local.y))
    }

    fn handle_click(&mut self, point: Point) {
        match self.editor.session().mode {
            Mode::Polygon => match self.editor.begin_or_extend_polygon(point) {
                Ok(ClickOutcome::CloseRequested) => self.open_label_prompt(),
                Ok(_) => {}
                Err(err) => self.status = err.to_string(),
            },
            Mode::None => {
                self.editor.select_at(point);
            }
            // Crop rectangles are drag-driven; a bare click does nothing.
            Mode::Crop => {}
        }
    }

    fn handle_canvas_input(&mut self, ctx: &egui::Context, response: &egui::Response) {
        let canvas = response.rect;

        if response.dragged_by(egui::PointerButton::Middle) {
            let delta = response.drag_delta();
            self.editor.pan_by(delta.x, delta.y);
        }

        let scroll = ctx.input(|i| i.smooth_scroll_delta.y);
        if scroll != 0.0 && response.hovered() {
            if let Some(pos) = response.hover_pos() {
                let local = pos - canvas.min;
                let factor = if scroll > 0.0 {
                    zoom::FACTOR
                } else {
                    1.0 / zoom::FACTOR
                };
                self.editor.zoom_at(Point::new(local.x, local.y), factor);
            }
        }

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let point = self.image_point(canvas, pos);
                self.handle_click(point);
            }
        }

        // The press origin, not the current pointer, decides what gets
        // grabbed; drag detection lags the press by a few px.
        let press_origin = |ctx: &egui::Context| {
            ctx.input(|i| i.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos())
        };

        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(pos) = press_origin(ctx) {
                let point = self.image_point(canvas, pos);
                if let Err(err) = self.editor.begin_drag(point) {
                    self.status = err.to_string();
                }
            }
        }
        // The secondary button moves the crop rectangle from any tool
        if response.drag_started_by(egui::PointerButton::Secondary) {
            if let Some(pos) = press_origin(ctx) {
                let point = self.image_point(canvas, pos);
                if let Err(err) = self.editor.begin_crop_move(point) {
                    self.status = err.to_string();
                }
            }
        }
        let dragged = response.dragged_by(egui::PointerButton::Primary)
            || response.dragged_by(egui::PointerButton::Secondary);
        if dragged {
            if let Some(pos) = response.interact_pointer_pos() {
                let point = self.image_point(canvas, pos);
                self.editor.update_drag(point);
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Primary)
            || response.drag_stopped_by(egui::PointerButton::Secondary)
        {
            self.editor.end_drag();
        }
    }

    // ========================================================================
    // Painting
    // ========================================================================

    fn paint_commands(&self, painter: &egui::Painter, canvas: egui::Rect, commands: &[DrawCommand]) {
        let at = |p: &Point| canvas.min + egui::vec2(p.x, p.y);
        for command in commands {
            match command {
                DrawCommand::Image { origin, scale } => {
                    let (Some(texture), Some(image)) =
                        (&self.texture, &self.editor.session().image)
                    else {
                        continue;
                    };
                    let size =
                        egui::vec2(image.width() as f32 * scale, image.height() as f32 * scale);
                    painter.image(
                        texture.id(),
                        egui::Rect::from_min_size(at(origin), size),
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }
                DrawCommand::Outline {
                    points,
                    closed,
                    stroke,
                } => {
                    if points.len() < 2 {
                        continue;
                    }
                    let mut path: Vec<egui::Pos2> = points.iter().map(at).collect();
                    if *closed {
                        path.push(path[0]);
                    }
                    let egui_stroke = egui::Stroke::new(stroke.width, to_color32(stroke.color));
                    if stroke.dashed {
                        painter.extend(egui::Shape::dashed_line(
                            &path,
                            egui_stroke,
                            style::DASH_LENGTH,
                            style::DASH_GAP,
                        ));
                    } else {
                        painter.add(egui::Shape::line(path, egui_stroke));
                    }
                }
                DrawCommand::Marker {
                    center,
                    radius,
                    color,
                } => {
                    painter.circle_filled(at(center), *radius, to_color32(*color));
                }
                DrawCommand::HandleSquare {
                    center,
                    size,
                    color,
                } => {
                    let rect = egui::Rect::from_center_size(at(center), egui::vec2(*size, *size));
                    painter.rect_filled(rect, 0.0, to_color32(*color));
                }
                DrawCommand::Text {
                    position,
                    text,
                    size,
                    color,
                } => {
                    painter.text(
                        at(position),
                        egui::Align2::CENTER_CENTER,
                        text,
                        egui::FontId::proportional(*size),
                        to_color32(*color),
                    );
                }
            }
        }
    }
}

fn to_color32(color: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(color.0[0], color.0[1], color.0[2])
}

fn default_json_name(session: &Session) -> String {
    image_stem(session)
        .map(|stem| format!("{stem}.json"))
        .unwrap_or_else(|| "annotations.json".to_string())
}

fn default_crop_name(session: &Session) -> String {
    image_stem(session)
        .map(|stem| format!("{stem}_cropped.png"))
        .unwrap_or_else(|| "cropped.png".to_string())
}

fn image_stem(session: &Session) -> Option<String> {
    session
        .image
        .as_ref()
        .and_then(|image| image.path.as_ref())
        .and_then(|path| path.file_stem())
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.to_string())
}

// ============================================================================
// eframe integration
// ============================================================================

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_texture(ctx);

        let pressed: Vec<(egui::Modifiers, egui::Key)> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        repeat: false,
                        modifiers,
                        ..
                    } => Some((*modifiers, *key)),
                    _ => None,
                })
                .collect()
        });
        let keyboard_free = !ctx.wants_keyboard_input();
        for (modifiers, key) in pressed {
            let Some(action) = self.bindings.action_for(modifiers, key) else {
                continue;
            };
            if self.label_prompt.is_some() {
                // Only the prompt's own confirm/dismiss keys act while
                // the modal is up.
                match action {
                    Action::Finalize => self.submit_label_prompt(),
                    Action::Cancel => self.label_prompt = None,
                    _ => {}
                }
            } else if keyboard_free {
                self.apply_action(action);
            }
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for &mode in Mode::all() {
                    let active = self.editor.session().mode == mode;
                    if ui.selectable_label(active, mode.name()).clicked() && !active {
                        self.switch_mode(mode);
                    }
                }
                ui.separator();

                let mut locked = self.editor.session().aspect_locked;
                if ui.checkbox(&mut locked, "Lock aspect").changed() {
                    self.set_aspect_locked(locked);
                }
                ui.label("Ratio:");
                let ratio_edit = ui.add(
                    egui::TextEdit::singleline(&mut self.aspect_text)
                        .desired_width(60.0)
                        .hint_text("16:9"),
                );
                if ratio_edit.lost_focus() {
                    self.apply_aspect_text();
                }
                ui.separator();

                if ui
                    .add_enabled(self.editor.can_undo(), egui::Button::new("Undo"))
                    .clicked()
                {
                    self.apply_action(Action::Undo);
                }
                if ui.button("Delete").clicked() {
                    self.delete_flow();
                }
                ui.separator();

                if ui.button("Open...").clicked() {
                    self.open_image_flow();
                }
                if ui.button("Import...").clicked() {
                    self.import_flow();
                }
                if ui.button("Save...").clicked() {
                    self.save_flow();
                }
                ui.separator();
                ui.label(format!("Zoom: {:.0}%", self.editor.session().view.scale * 100.0));
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let session = self.editor.session();
                ui.label(format!("Mode: {}", session.mode.name()));
                ui.separator();
                ui.label(format!("Polygons: {}", session.polygons.len()));
                if !session.draft.is_empty() {
                    ui.separator();
                    ui.label(format!("Drawing: {} points", session.draft.len()));
                }
                if session.crop.is_some() {
                    ui.separator();
                    ui.label("Crop set");
                }
                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(&self.status);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
            let canvas = response.rect;
            painter.rect_filled(canvas, 0.0, egui::Color32::from_gray(40));

            let pointer = response
                .hover_pos()
                .map(|pos| self.image_point(canvas, pos));
            let commands = render::render(self.editor.session(), pointer);
            self.paint_commands(&painter, canvas, &commands);

            if self.label_prompt.is_none() {
                self.handle_canvas_input(ctx, &response);
            }
        });

        self.label_prompt_window(ctx);

        if ctx.input(|i| i.viewport().close_requested()) {
            self.persist_config();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::test_support::ScriptedDialogs;
    use image::RgbaImage;

    fn test_app(mode: Mode) -> App {
        App::new(
            AppConfig::new(),
            Box::new(ScriptedDialogs::default()),
            ImageRef::from_pixels(RgbaImage::new(200, 150)),
            mode,
        )
    }

    fn draw_triangle(app: &mut App) {
        for (x, y) in [(10.0, 10.0), (60.0, 10.0), (60.0, 50.0)] {
            app.editor
                .begin_or_extend_polygon(Point::new(x, y))
                .unwrap();
        }
    }

    fn saved_png(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        RgbaImage::new(8, 6).save(&path).unwrap();
        path
    }

    #[test]
    fn test_startup_prefers_argument_over_dialog() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_png(&dir, "photo.png");

        // No image scripted: the dialog would return None, so reaching
        // a loaded image proves the argument won.
        let dialogs = ScriptedDialogs {
            confirm_answer: true,
            ..Default::default()
        };
        let (image, mode) = startup(&dialogs, Some(path)).unwrap();
        assert_eq!(image.width(), 8);
        assert_eq!(mode, Mode::Polygon);
    }

    #[test]
    fn test_startup_mode_choice_and_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_png(&dir, "photo.png");

        let crop_dialogs = ScriptedDialogs {
            image: Some(path),
            confirm_answer: false,
            ..Default::default()
        };
        let (_, mode) = startup(&crop_dialogs, None).unwrap();
        assert_eq!(mode, Mode::Crop);

        let cancelled = ScriptedDialogs::default();
        assert!(startup(&cancelled, None).is_none());
    }

    #[test]
    fn test_startup_warns_on_undecodable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-an-image.png");
        std::fs::write(&path, b"plain text").unwrap();

        let dialogs = ScriptedDialogs {
            image: Some(path),
            confirm_answer: true,
            ..Default::default()
        };
        assert!(startup(&dialogs, None).is_none());
        assert_eq!(dialogs.warnings.borrow().len(), 1);
    }

    #[test]
    fn test_label_prompt_round_trip() {
        let mut app = test_app(Mode::Polygon);
        draw_triangle(&mut app);

        app.open_label_prompt();
        assert_eq!(app.label_prompt.as_ref().unwrap().id, "1");

        app.label_prompt.as_mut().unwrap().label = "roof".to_string();
        app.submit_label_prompt();
        assert!(app.label_prompt.is_none());
        assert_eq!(app.editor.session().polygons.len(), 1);
        assert_eq!(app.editor.session().polygons[0].label, "roof");
    }

    #[test]
    fn test_label_prompt_rejects_bad_input_and_stays_open() {
        let mut app = test_app(Mode::Polygon);
        draw_triangle(&mut app);
        app.open_label_prompt();

        {
            let prompt = app.label_prompt.as_mut().unwrap();
            prompt.label = "roof".to_string();
            prompt.id = "one".to_string();
        }
        app.submit_label_prompt();
        assert!(app.label_prompt.as_ref().unwrap().error.is_some());
        assert!(app.editor.session().polygons.is_empty());

        {
            let prompt = app.label_prompt.as_mut().unwrap();
            prompt.label = "   ".to_string();
            prompt.id = "1".to_string();
            prompt.error = None;
        }
        app.submit_label_prompt();
        assert!(app.label_prompt.as_ref().unwrap().error.is_some());
        assert!(app.editor.session().polygons.is_empty());
    }

    #[test]
    fn test_prompt_needs_enough_points() {
        let mut app = test_app(Mode::Polygon);
        app.editor
            .begin_or_extend_polygon(Point::new(10.0, 10.0))
            .unwrap();
        app.open_label_prompt();
        assert!(app.label_prompt.is_none());
    }

    #[test]
    fn test_click_routes_by_mode() {
        let mut app = test_app(Mode::Polygon);
        app.handle_click(Point::new(30.0, 30.0));
        assert_eq!(app.editor.session().draft.len(), 1);

        let mut app = test_app(Mode::Polygon);
        draw_triangle(&mut app);
        app.editor.finalize_polygon("roof", 1).unwrap();
        app.switch_mode(Mode::None);
        app.handle_click(Point::new(40.0, 20.0));
        assert_eq!(app.editor.session().selected, Some(0));
    }

    #[test]
    fn test_save_flow_writes_and_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("scene.json");
        let crop_path = dir.path().join("scene_cropped.png");

        let mut app = test_app(Mode::Polygon);
        draw_triangle(&mut app);
        app.editor.finalize_polygon("roof", 1).unwrap();
        app.editor.set_mode(Mode::Crop);
        app.editor.begin_drag(Point::new(20.0, 20.0)).unwrap();
        app.editor.update_drag(Point::new(120.0, 100.0));
        app.editor.end_drag();

        app.dialogs = Box::new(ScriptedDialogs {
            json_target: Some(json_path.clone()),
            image_target: Some(crop_path.clone()),
            confirm_answer: false,
            ..Default::default()
        });
        app.save_flow();

        assert!(json_path.exists());
        assert!(crop_path.exists());
        assert!(crop_path.with_extension("json").exists());
        assert!(app.editor.session().polygons.is_empty());
        assert!(app.editor.session().crop.is_none());
        assert!(app.editor.session().has_image());
        assert_eq!(
            app.config.preferences.export_folder,
            dir.path().display().to_string()
        );
    }

    #[test]
    fn test_save_flow_writes_annotated_render_when_confirmed() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("scene.json");

        let mut app = test_app(Mode::Polygon);
        draw_triangle(&mut app);
        app.editor.finalize_polygon("roof", 1).unwrap();

        // confirm_answer drives both the annotated-render question and
        // the next-image offer; the scripted image pick returns None so
        // the latter is a no-op.
        app.dialogs = Box::new(ScriptedDialogs {
            json_target: Some(json_path.clone()),
            confirm_answer: true,
            ..Default::default()
        });
        app.save_flow();

        assert!(json_path.exists());
        assert!(annotated_path_for(&json_path).exists());
    }

    #[test]
    fn test_save_flow_keeps_session_when_cancelled() {
        let mut app = test_app(Mode::Polygon);
        draw_triangle(&mut app);
        app.editor.finalize_polygon("roof", 1).unwrap();

        app.save_flow();
        assert_eq!(app.editor.session().polygons.len(), 1);
    }

    #[test]
    fn test_save_flow_with_nothing_to_save() {
        let mut app = test_app(Mode::Polygon);
        app.save_flow();
        assert_eq!(app.status, "Nothing to save yet");
    }

    #[test]
    fn test_import_flow_loads_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");

        let mut source = test_app(Mode::Polygon);
        draw_triangle(&mut source);
        source.editor.finalize_polygon("roof", 5).unwrap();
        write_polygons(source.editor.session(), &path).unwrap();

        let mut app = test_app(Mode::None);
        app.dialogs = Box::new(ScriptedDialogs {
            document: Some(path),
            ..Default::default()
        });
        app.import_flow();
        assert_eq!(app.editor.session().polygons.len(), 1);
        assert_eq!(app.editor.session().polygons[0].label, "roof");
        assert_eq!(app.editor.session().next_id, 6);
    }

    #[test]
    fn test_aspect_text_updates_session_and_config() {
        let mut app = test_app(Mode::Crop);

        app.aspect_text = "4:3".to_string();
        app.apply_aspect_text();
        assert_eq!(app.editor.session().aspect_ratio, Some(4.0 / 3.0));
        assert_eq!(app.config.preferences.aspect_ratio, "4:3");

        app.aspect_text = "nonsense".to_string();
        app.apply_aspect_text();
        assert_eq!(app.editor.session().aspect_ratio, Some(4.0 / 3.0));
        assert!(app.status.contains("aspect ratio"));

        app.aspect_text = String::new();
        app.apply_aspect_text();
        assert_eq!(app.editor.session().aspect_ratio, None);
    }

    #[test]
    fn test_default_export_names_follow_image_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_png(&dir, "yard.png");

        let mut app = test_app(Mode::Polygon);
        app.editor.load_image(ImageRef::open(&path).unwrap());
        assert_eq!(default_json_name(app.editor.session()), "yard.json");
        assert_eq!(default_crop_name(app.editor.session()), "yard_cropped.png");

        let nameless = test_app(Mode::Polygon);
        assert_eq!(default_json_name(nameless.editor.session()), "annotations.json");
    }
}
