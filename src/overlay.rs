// src/overlay.rs - Draw commands produced by the effects, painted later by the UI
use egui::{Align2, Color32, Pos2, Vec2};

use crate::geometry::Point;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Point {
        at: Pos2,
        radius: f32,
        color: Color32,
    },
    Line {
        from: Pos2,
        to: Pos2,
        width: f32,
        color: Color32,
    },
    Triangle {
        points: [Pos2; 3],
        fill: Color32,
    },
    Ellipse {
        center: Pos2,
        radii: Vec2,
        fill: Color32,
    },
    Text {
        at: Pos2,
        text: String,
        size: f32,
        color: Color32,
        anchor: Align2,
    },
}

/// Ordered draw commands in frame pixel coordinates; later commands land on top.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn point(&mut self, at: Pos2, radius: f32, color: Color32) {
        self.push(DrawCommand::Point { at, radius, color });
    }

    pub fn line(&mut self, from: Pos2, to: Pos2, width: f32, color: Color32) {
        self.push(DrawCommand::Line {
            from,
            to,
            width,
            color,
        });
    }

    pub fn triangle(&mut self, points: [Pos2; 3], fill: Color32) {
        self.push(DrawCommand::Triangle { points, fill });
    }

    pub fn ellipse(&mut self, center: Pos2, radii: Vec2, fill: Color32) {
        self.push(DrawCommand::Ellipse {
            center,
            radii,
            fill,
        });
    }

    pub fn text(&mut self, at: Pos2, text: impl Into<String>, size: f32, color: Color32, anchor: Align2) {
        self.push(DrawCommand::Text {
            at,
            text: text.into(),
            size,
            color,
            anchor,
        });
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

pub fn to_pos(point: &Point) -> Pos2 {
    Pos2::new(point.x, point.y)
}

/// Hue in degrees, saturation and brightness in percent, alpha in 0..=255.
pub fn hsb_color(hue: f32, saturation: f32, brightness: f32, alpha: f32) -> Color32 {
    let h = hue.rem_euclid(360.0) / 60.0;
    let s = (saturation / 100.0).clamp(0.0, 1.0);
    let v = (brightness / 100.0).clamp(0.0, 1.0);

    let c = v * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let channel = |value: f32| ((value + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Color32::from_rgba_unmultiplied(channel(r), channel(g), channel(b), alpha.round().clamp(0.0, 255.0) as u8)
}
