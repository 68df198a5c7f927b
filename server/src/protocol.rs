use crate::error::ProtocolError;
use std::sync::Arc;

pub use arena_shared::protocol::{
    Ball, ClientMsg, Line, Polygon, ServerMsg, Window, WindowRef, WindowSpec,
};

/// Pre-encoded outbound JSON text, shared by every connection it is fanned out to.
pub type Frame = Arc<str>;

/// How an outbound frame may be treated when a peer falls behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Superseded by the next frame; a slow peer may skip it.
    Snapshot,
    /// Sent once per change. A peer that cannot take it is out of sync.
    Event,
}

impl FrameKind {
    pub fn of(msg: &ServerMsg) -> Self {
        match msg {
            ServerMsg::Balls(_) => FrameKind::Snapshot,
            ServerMsg::NewWindow(_) | ServerMsg::UpdateWindow(_) | ServerMsg::Polygon(_) => {
                FrameKind::Event
            }
        }
    }
}

pub fn encode(msg: &ServerMsg) -> Result<Frame, serde_json::Error> {
    serde_json::to_string(msg).map(Frame::from)
}

/// Parse and sanity-check one inbound text message.
pub fn decode(text: &str) -> Result<ClientMsg, ProtocolError> {
    let msg: ClientMsg = serde_json::from_str(text)?;
    match &msg {
        ClientMsg::NewWindow(spec) | ClientMsg::UpdateWindow(spec) => check_window(spec)?,
        ClientMsg::NewBall(ball) => check_ball(ball)?,
        ClientMsg::CloseWindow(_) => {}
    }
    Ok(msg)
}

fn check_window(spec: &WindowSpec) -> Result<(), ProtocolError> {
    let values = [spec.x, spec.y, spec.width, spec.height];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ProtocolError::NotFinite("window"));
    }
    if spec.width < 0.0 || spec.height < 0.0 {
        return Err(ProtocolError::BadExtent {
            width: spec.width,
            height: spec.height,
        });
    }
    Ok(())
}

fn check_ball(ball: &Ball) -> Result<(), ProtocolError> {
    if !ball.position.is_finite() || !ball.velocity.is_finite() || !ball.radius.is_finite() {
        return Err(ProtocolError::NotFinite("ball"));
    }
    if ball.radius <= 0.0 {
        return Err(ProtocolError::BadRadius(ball.radius));
    }
    Ok(())
}
