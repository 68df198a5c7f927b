use crate::config::ServerConfig;
use crate::error::CommandError;
use crate::protocol::{encode, Ball, ClientMsg, Frame, FrameKind, ServerMsg, WindowSpec};
use crate::registry::{SessionId, SessionRegistry};
use crate::world::World;
use tokio::sync::mpsc;

/// Central arena state owned by the game loop task.
pub struct ArenaState {
    pub registry: SessionRegistry,
    pub world: World,
}

impl ArenaState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            registry: SessionRegistry::new(),
            world: World::new(config.physics, config.max_balls),
        }
    }

    pub fn connect(&mut self, outbound: mpsc::Sender<Frame>) -> SessionId {
        let id = self.registry.connect(outbound);
        tracing::info!("Session {} connected ({} live)", id, self.registry.len());
        id
    }

    /// Forget a connection. If it held a window the boundary shrinks.
    pub fn disconnect(&mut self, id: SessionId) {
        if let Some(session) = self.registry.disconnect(id) {
            tracing::info!("Session {} disconnected", id);
            if session.window.is_some() {
                self.publish_boundary();
            }
        }
    }

    /// Apply one decoded client message.
    pub fn handle(&mut self, session: SessionId, msg: ClientMsg) -> Result<(), CommandError> {
        match msg {
            ClientMsg::NewWindow(spec) => self.new_window(session, &spec),
            ClientMsg::UpdateWindow(spec) => self.update_window(session, &spec),
            ClientMsg::CloseWindow(window) => self.close_window(window.id),
            ClientMsg::NewBall(ball) => self.new_ball(ball),
        }
    }

    fn new_window(&mut self, session: SessionId, spec: &WindowSpec) -> Result<(), CommandError> {
        let window = self.registry.open_window(session, spec)?;
        tracing::info!("Session {} opened window {}", session, window.id);

        if let Some(frame) = self.encode(&ServerMsg::NewWindow(window)) {
            let delivery = self.registry.send_to(session, &frame, FrameKind::Event);
            if delivery.is_failure() {
                tracing::warn!("Session {} dropped before window reply ({:?})", session, delivery);
            }
        }
        self.publish_boundary();
        Ok(())
    }

    fn update_window(&mut self, session: SessionId, spec: &WindowSpec) -> Result<(), CommandError> {
        let window = self.registry.update_window(session, spec)?;
        self.broadcast(&ServerMsg::UpdateWindow(window));
        self.publish_boundary();
        Ok(())
    }

    fn close_window(&mut self, id: u32) -> Result<(), CommandError> {
        let session = self.registry.close_window(id)?;
        tracing::info!("Session {} closed window {} and left", session.id, id);
        self.publish_boundary();
        Ok(())
    }

    fn new_ball(&mut self, ball: Ball) -> Result<(), CommandError> {
        self.world.spawn(ball)
    }

    /// One simulation frame followed by the ball broadcast.
    pub fn frame(&mut self) {
        self.world.step_frame(&self.registry.polygon().lines);
        if !self.registry.is_empty() {
            self.broadcast(&ServerMsg::Balls(self.world.balls().to_vec()));
        }
    }

    /// Recompute the boundary and send it to everyone.
    fn publish_boundary(&mut self) {
        let polygon = self.registry.recompute_boundary().clone();
        self.broadcast(&ServerMsg::Polygon(polygon));
    }

    /// Fan out to every session. Sessions that are gone or too far behind
    /// are dropped, and if any of them held a window the new boundary is
    /// published in turn.
    fn broadcast(&mut self, msg: &ServerMsg) {
        let Some(mut frame) = self.encode(msg) else {
            return;
        };
        let mut kind = FrameKind::of(msg);
        loop {
            let removed = self.registry.broadcast(&frame, kind);
            for session in &removed {
                tracing::warn!("Session {} dropped after failed send", session.id);
            }
            if !removed.iter().any(|s| s.window.is_some()) {
                return;
            }
            let polygon = self.registry.recompute_boundary().clone();
            match self.encode(&ServerMsg::Polygon(polygon)) {
                Some(next) => {
                    frame = next;
                    kind = FrameKind::Event;
                }
                None => return,
            }
        }
    }

    fn encode(&self, msg: &ServerMsg) -> Option<Frame> {
        match encode(msg) {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::error!("Failed to encode outbound message: {}", e);
                None
            }
        }
    }
}
