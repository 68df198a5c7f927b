use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::vec2::Vector2D;

// Every message on the wire is `{"type": "...", "data": ...}`.

// === Shared types ===

/// A participant's viewport rectangle. `x`/`y` is the top-left corner,
/// `width`/`height` extend right and down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
pub struct Window {
    pub id: u32,
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
}

/// Window as sent by a client. `id` is ignored on `new-window` and
/// required on `update-window`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
pub struct WindowSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub id: Option<u32>,
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
}

impl WindowSpec {
    pub fn with_id(&self, id: u32) -> Window {
        Window {
            id,
            width: self.width,
            height: self.height,
            x: self.x,
            y: self.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
pub struct WindowRef {
    pub id: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
pub struct Ball {
    pub position: Vector2D,
    pub velocity: Vector2D,
    pub radius: f64,
    #[serde(default)]
    pub color: String,
}

/// One axis-aligned boundary segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
pub struct Line {
    pub from: Vector2D,
    pub to: Vector2D,
}

impl Line {
    pub fn new(from: Vector2D, to: Vector2D) -> Self {
        Self { from, to }
    }

    pub fn is_degenerate(&self) -> bool {
        self.from == self.to
    }
}

/// Arena boundary. `points` is the convex hull in hull order,
/// `lines` the orthogonal boundary derived from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
pub struct Polygon {
    pub points: Vec<Vector2D>,
    pub lines: Vec<Line>,
}

// === Client -> Server ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
#[serde(tag = "type", content = "data")]
pub enum ClientMsg {
    #[serde(rename = "new-window")]
    NewWindow(WindowSpec),
    #[serde(rename = "update-window")]
    UpdateWindow(WindowSpec),
    #[serde(rename = "close-window")]
    CloseWindow(WindowRef),
    #[serde(rename = "new-ball")]
    NewBall(Ball),
}

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
#[serde(tag = "type", content = "data")]
pub enum ServerMsg {
    /// Reply to the sender of `new-window` with the assigned id
    #[serde(rename = "new-window")]
    NewWindow(Window),
    #[serde(rename = "update-window")]
    UpdateWindow(Window),
    #[serde(rename = "polygon")]
    Polygon(Polygon),
    #[serde(rename = "balls")]
    Balls(Vec<Ball>),
}
