//! FrameCAD 主应用程序入口
//!
//! 使用 eframe 作为应用框架：四个视口（俯视、侧视、正视、等轴测）排成 2×2，
//! 指针、滚轮和键盘事件转发给编辑器上下文。
//!
//! 用法：`framecad [文档路径] [--config 配置.json] [--export 输出.scad] [--mesh 零件.stl]...`

use anyhow::{bail, Result};
use eframe::egui;
use std::path::PathBuf;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use framecad_core::math::{Point2, Vector2};
use framecad_file::{bom_csv, load_any, save_any, Document, ScadExportHook, StlImport};
use framecad_view::{Color, Editor, EditorConfig, Key, KeyBindings, KeyChord, Modifiers, Shape};

/// 导入网格零件的默认价格
const MESH_PRICE: f64 = 0.0;

/// 视口背景
const BACKGROUND: egui::Color32 = egui::Color32::WHITE;

/// 命令行参数
#[derive(Debug, Default, PartialEq)]
struct Args {
    document: Option<PathBuf>,
    config: Option<PathBuf>,
    export: Option<PathBuf>,
    meshes: Vec<PathBuf>,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut out = Args::default();
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" | "-c" => match iter.next() {
                    Some(path) => out.config = Some(PathBuf::from(path)),
                    None => bail!("--config needs a path"),
                },
                "--export" | "-e" => match iter.next() {
                    Some(path) => out.export = Some(PathBuf::from(path)),
                    None => bail!("--export needs a path"),
                },
                "--mesh" | "-m" => match iter.next() {
                    Some(path) => out.meshes.push(PathBuf::from(path)),
                    None => bail!("--mesh needs a path"),
                },
                flag if flag.starts_with('-') => bail!("Unknown option: {}", flag),
                path => {
                    if out.document.is_some() {
                        bail!("Only one document path may be given");
                    }
                    out.document = Some(PathBuf::from(path));
                }
            }
        }
        Ok(out)
    }
}

/// FrameCAD 应用程序
struct FrameCadApp {
    editor: Editor,
    bindings: KeyBindings,
    document_path: Option<PathBuf>,
    title: String,
    status: String,
}

impl FrameCadApp {
    fn new(config: EditorConfig, args: Args) -> Self {
        let mut editor = Editor::new(config);
        if let Some(path) = &args.export {
            info!("Exporting OpenSCAD to {}", path.display());
            editor = editor.with_export_hook(Box::new(ScadExportHook::new(path)));
        }

        let mut title = "Untitled".to_string();
        let mut status = String::new();
        if let Some(path) = &args.document {
            if path.exists() {
                match load_any(path) {
                    Ok(doc) => {
                        title = doc.metadata.title.clone();
                        editor.load_entities(doc.into_entities());
                    }
                    Err(e) => {
                        error!("Failed to load {}: {}", path.display(), e);
                        status = format!("Failed to load {}: {}", path.display(), e);
                    }
                }
            } else {
                warn!("{} does not exist, starting a new document", path.display());
            }
        }

        for path in &args.meshes {
            if let Err(e) = editor.import_mesh(&StlImport, path, MESH_PRICE) {
                error!("Failed to import {}: {}", path.display(), e);
                status = format!("Failed to import {}: {}", path.display(), e);
            }
        }

        Self {
            editor,
            bindings: KeyBindings::new(),
            document_path: args.document,
            title,
            status,
        }
    }

    fn save(&mut self) {
        let Some(path) = self.document_path.clone() else {
            self.status = "No document path given on the command line".to_string();
            return;
        };
        let mut doc = Document::from_scene(self.editor.scene());
        doc.metadata.title = self.title.clone();
        doc.touch();
        self.status = match save_any(&doc, &path) {
            Ok(()) => format!("Saved {}", path.display()),
            Err(e) => {
                error!("Failed to save {}: {}", path.display(), e);
                format!("Save failed: {}", e)
            }
        };
    }

    fn write_bom(&mut self) {
        let path = self
            .document_path
            .as_ref()
            .map(|p| p.with_extension("csv"))
            .unwrap_or_else(|| PathBuf::from("bom.csv"));
        self.status = match std::fs::write(&path, bom_csv(self.editor.scene())) {
            Ok(()) => format!("Wrote {}", path.display()),
            Err(e) => {
                error!("Failed to write {}: {}", path.display(), e);
                format!("BOM failed: {}", e)
            }
        };
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let chords: Vec<KeyChord> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        modifiers,
                        ..
                    } => map_key(*key).map(|key| KeyChord {
                        key,
                        control: modifiers.command,
                    }),
                    _ => None,
                })
                .collect()
        });
        for chord in chords {
            if let Some(command) = self.bindings.lookup_chord(chord) {
                self.editor.execute(command);
            }
        }
    }

    fn viewport_panel(&mut self, ui: &mut egui::Ui, index: usize, rect: egui::Rect) {
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        let size = Vector2::new(rect.width() as f64, rect.height() as f64);
        if let Some(view) = self.editor.views_mut().get_mut(index) {
            if view.size() != size {
                view.set_size(size);
            }
        }

        let to_local = |p: egui::Pos2| Point2::new((p.x - rect.min.x) as f64, (p.y - rect.min.y) as f64);
        let (modifiers, press_origin, latest, scroll) = ui.input(|i| {
            (
                Modifiers {
                    shift: i.modifiers.shift,
                    control: i.modifiers.command,
                },
                i.pointer.press_origin(),
                i.pointer.latest_pos(),
                i.raw_scroll_delta.y,
            )
        });

        if response.clicked_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                self.editor.pointer_down(index, to_local(pos), modifiers);
                self.editor.pointer_up(index, to_local(pos), modifiers);
            }
        }
        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(origin) = press_origin {
                self.editor.pointer_down(index, to_local(origin), modifiers);
            }
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                self.editor.pointer_move(index, to_local(pos), modifiers);
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos().or(latest) {
                self.editor.pointer_up(index, to_local(pos), modifiers);
            }
        }
        if scroll != 0.0 && response.hovered() {
            if let Some(pos) = response.hover_pos() {
                let steps = if scroll > 0.0 { 1 } else { -1 };
                self.editor.zoom_at(index, to_local(pos), steps);
            }
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, BACKGROUND);
        if let Some(view) = self.editor.views().get(index) {
            paint_display_list(&painter, rect.min, view.display().iter());
            painter.text(
                rect.min + egui::vec2(6.0, 4.0),
                egui::Align2::LEFT_TOP,
                view.name(),
                egui::FontId::proportional(12.0),
                egui::Color32::DARK_GRAY,
            );
        }
        painter.rect_stroke(
            rect,
            egui::CornerRadius::ZERO,
            egui::Stroke::new(1.0, egui::Color32::GRAY),
            egui::StrokeKind::Inside,
        );
    }
}

fn color32(c: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

/// 把显示列表画到 egui 画布，`origin` 为视口左上角
fn paint_display_list<'a>(
    painter: &egui::Painter,
    origin: egui::Pos2,
    primitives: impl Iterator<Item = &'a framecad_view::Primitive>,
) {
    let pos = |p: &Point2| origin + egui::vec2(p.x as f32, p.y as f32);
    for prim in primitives {
        let color = color32(prim.color);
        let stroke = egui::Stroke::new(prim.width as f32, color);
        match &prim.shape {
            Shape::Polyline(points) => {
                painter.add(egui::Shape::line(points.iter().map(pos).collect(), stroke));
            }
            Shape::Rectangle { min, max } => {
                painter.rect_stroke(
                    egui::Rect::from_two_pos(pos(min), pos(max)),
                    egui::CornerRadius::ZERO,
                    stroke,
                    egui::StrokeKind::Middle,
                );
            }
            Shape::Dot { center, radius } => {
                painter.circle_filled(pos(center), *radius as f32, color);
            }
            Shape::Label { position, text } => {
                painter.text(
                    pos(position),
                    egui::Align2::CENTER_CENTER,
                    text,
                    egui::FontId::proportional(12.0),
                    color,
                );
            }
        }
    }
}

fn map_key(key: egui::Key) -> Option<Key> {
    use egui::Key as E;
    let mapped = match key {
        E::Escape => Key::Escape,
        E::Delete => Key::Delete,
        E::ArrowLeft => Key::Left,
        E::ArrowRight => Key::Right,
        E::ArrowUp => Key::Up,
        E::ArrowDown => Key::Down,
        E::Plus | E::Equals => Key::Char('+'),
        E::Minus => Key::Char('-'),
        other => {
            let mut chars = other.name().chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => Key::Char(c.to_ascii_lowercase()),
                _ => return None,
            }
        }
    };
    Some(mapped)
}

impl eframe::App for FrameCadApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show(ctx);
    }
}

impl FrameCadApp {
    fn show(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("文件", |ui| {
                    if ui.button("保存").clicked() {
                        self.save();
                        ui.close();
                    }
                    if ui.button("导出物料清单").clicked() {
                        self.write_bom();
                        ui.close();
                    }
                });
                ui.menu_button("零件", |ui| {
                    for name in self.editor.catalog().names() {
                        if ui.button(name.as_str()).clicked() {
                            let length = self.editor.config().default_length;
                            if let Err(e) = self.editor.add_part(&name, length) {
                                self.status = e.to_string();
                            }
                            ui.close();
                        }
                    }
                });
            });
        });

        let scene = self.editor.scene();
        let summary = format!(
            "{} entities, {} selected, cost {:.2}",
            scene.len(),
            scene.selection_len(),
            scene.cost()
        );
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(summary);
                ui.separator();
                ui.label(&self.status);
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let area = ui.available_rect_before_wrap();
            let cell = egui::vec2(area.width() / 2.0, area.height() / 2.0);
            for index in 0..self.editor.views().len().min(4) {
                let col = (index % 2) as f32;
                let row = (index / 2) as f32;
                let rect = egui::Rect::from_min_size(area.min + egui::vec2(col * cell.x, row * cell.y), cell);
                self.viewport_panel(ui, index, rect);
            }
        });

        if !ctx.wants_keyboard_input() {
            self.handle_keys(ctx);
        }
    }
}

fn main() -> Result<()> {
    // 初始化日志
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder().with_max_level(Level::INFO).finish(),
    )?;

    info!("Starting FrameCAD...");

    let args = Args::parse(std::env::args().skip(1))?;
    let config = EditorConfig::load_or_default(args.config.as_deref())?;
    let app = FrameCadApp::new(config, args);
    let title = format!("FrameCAD - {}", app.title);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 800.0])
            .with_title(title),
        ..Default::default()
    };

    eframe::run_native(
        "FrameCAD",
        native_options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {}", e))?;

    Ok(())
}
