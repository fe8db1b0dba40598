// src/ui.rs - Theme, video widget and the overlay painter
use eframe::egui::{self, Color32, Pos2, Rect, Stroke, Vec2};
use image::DynamicImage;

use crate::detection::DetectorStatus;
use crate::overlay::{DrawCommand, DrawList};

const ELLIPSE_SEGMENTS: usize = 32;

#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Color32,
    pub secondary: Color32,
    pub surface: Color32,
    pub error: Color32,
    pub warning: Color32,
    pub success: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color32::from_rgb(70, 130, 240),
            secondary: Color32::from_rgb(255, 152, 0),
            surface: Color32::from_rgb(30, 30, 35),
            error: Color32::from_rgb(244, 67, 54),
            warning: Color32::from_rgb(255, 152, 0),
            success: Color32::from_rgb(76, 175, 80),
            text_primary: Color32::WHITE,
            text_secondary: Color32::from_rgb(200, 200, 200),
        }
    }
}

impl Theme {
    pub fn status_color(&self, status: &DetectorStatus) -> Color32 {
        match status {
            DetectorStatus::Uninitialized => self.text_secondary,
            DetectorStatus::Probing { .. } => self.warning,
            DetectorStatus::Ready { .. } => self.success,
            DetectorStatus::Failed { .. } => self.error,
        }
    }
}

/// Maps frame pixel coordinates onto the on-screen video rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    pub rect: Rect,
    pub scale: Vec2,
}

impl CanvasTransform {
    pub fn new(rect: Rect, frame_size: Vec2) -> Self {
        let scale = if frame_size.x > 0.0 && frame_size.y > 0.0 {
            Vec2::new(rect.width() / frame_size.x, rect.height() / frame_size.y)
        } else {
            Vec2::splat(1.0)
        };
        Self { rect, scale }
    }

    pub fn to_screen(&self, p: Pos2) -> Pos2 {
        Pos2::new(
            self.rect.left() + p.x * self.scale.x,
            self.rect.top() + p.y * self.scale.y,
        )
    }

    /// Uniform factor for radii, widths and font sizes.
    pub fn length(&self, value: f32) -> f32 {
        value * self.scale.x.min(self.scale.y)
    }
}

pub fn ellipse_points(center: Pos2, radii: Vec2, segments: usize) -> Vec<Pos2> {
    let segments = segments.max(3);
    (0..segments)
        .map(|i| {
            let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
            Pos2::new(center.x + radii.x * angle.cos(), center.y + radii.y * angle.sin())
        })
        .collect()
}

pub fn paint_draw_list(painter: &egui::Painter, transform: &CanvasTransform, list: &DrawList) {
    for command in list.commands() {
        match command {
            DrawCommand::Point { at, radius, color } => {
                painter.circle_filled(transform.to_screen(*at), transform.length(*radius), *color);
            }
            DrawCommand::Line {
                from,
                to,
                width,
                color,
            } => {
                painter.line_segment(
                    [transform.to_screen(*from), transform.to_screen(*to)],
                    Stroke::new(transform.length(*width), *color),
                );
            }
            DrawCommand::Triangle { points, fill } => {
                let points = points.iter().map(|p| transform.to_screen(*p)).collect();
                painter.add(egui::Shape::convex_polygon(points, *fill, Stroke::NONE));
            }
            DrawCommand::Ellipse {
                center,
                radii,
                fill,
            } => {
                let points = ellipse_points(*center, *radii, ELLIPSE_SEGMENTS)
                    .into_iter()
                    .map(|p| transform.to_screen(p))
                    .collect();
                painter.add(egui::Shape::convex_polygon(points, *fill, Stroke::NONE));
            }
            DrawCommand::Text {
                at,
                text,
                size,
                color,
                anchor,
            } => {
                painter.text(
                    transform.to_screen(*at),
                    *anchor,
                    text,
                    egui::FontId::proportional(transform.length(*size).max(8.0)),
                    *color,
                );
            }
        }
    }
}

// Custom widget for video display
pub struct VideoWidget {
    texture: Option<egui::TextureHandle>,
    frame_size: Vec2,
}

impl VideoWidget {
    pub fn new() -> Self {
        Self {
            texture: None,
            frame_size: Vec2::new(640.0, 480.0),
        }
    }

    pub fn update_frame(&mut self, ctx: &egui::Context, frame: &DynamicImage) {
        let size = [frame.width() as usize, frame.height() as usize];
        let rgba = frame.to_rgba8();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
        self.frame_size = Vec2::new(size[0] as f32, size[1] as f32);

        match &mut self.texture {
            Some(texture) => texture.set(color_image, Default::default()),
            None => {
                self.texture = Some(ctx.load_texture("video_frame", color_image, Default::default()))
            }
        }
    }

    /// Draws the frame as large as fits while keeping its aspect ratio and returns
    /// the mapping overlays should use.
    pub fn show(&self, ui: &mut egui::Ui) -> CanvasTransform {
        let available = ui.available_size();
        let aspect = self.frame_size.x / self.frame_size.y.max(1.0);
        let mut size = Vec2::new(available.x, available.x / aspect);
        if size.y > available.y {
            size = Vec2::new(available.y * aspect, available.y);
        }

        let (rect, _response) = ui.allocate_exact_size(size, egui::Sense::hover());

        if let Some(texture) = &self.texture {
            ui.painter().image(
                texture.id(),
                rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        } else {
            ui.painter()
                .rect_filled(rect, egui::Rounding::same(4.0), Color32::from_rgb(50, 50, 55));
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "No Video Signal",
                egui::FontId::proportional(16.0),
                Color32::from_rgb(150, 150, 155),
            );
        }

        CanvasTransform::new(rect, self.frame_size)
    }
}

impl Default for VideoWidget {
    fn default() -> Self {
        Self::new()
    }
}
