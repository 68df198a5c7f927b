use crate::boundary::recompute_boundary;
use crate::error::CommandError;
use crate::protocol::{Frame, FrameKind, Polygon, Window, WindowSpec};
use std::collections::BTreeMap;
use tokio::sync::mpsc::{self, error::TrySendError};

pub type SessionId = u32;

/// A live connection and the window it currently drives, if any.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub window: Option<Window>,
    outbound: mpsc::Sender<Frame>,
}

/// Outcome of queueing one frame for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// Outbound queue full on a snapshot, frame dropped for this peer only
    Dropped,
    /// Outbound queue full on an event; the peer can no longer be kept in sync
    Lagged,
    /// Connection handler is gone
    Closed,
}

impl Delivery {
    /// The session has to go.
    pub fn is_failure(self) -> bool {
        matches!(self, Delivery::Lagged | Delivery::Closed)
    }
}

impl Session {
    fn deliver(&self, frame: &Frame, kind: FrameKind) -> Delivery {
        match self.outbound.try_send(frame.clone()) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => match kind {
                FrameKind::Snapshot => Delivery::Dropped,
                FrameKind::Event => Delivery::Lagged,
            },
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

/// Who is connected and where their windows are. Also holds the boundary
/// derived from those windows, so the two never disagree.
pub struct SessionRegistry {
    sessions: BTreeMap<SessionId, Session>,
    next_session_id: SessionId,
    next_window_id: u32,
    polygon: Polygon,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: BTreeMap::new(),
            next_session_id: 1,
            next_window_id: 1,
            polygon: Polygon::default(),
        }
    }

    /// Register a connection. It receives broadcasts from now on.
    pub fn connect(&mut self, outbound: mpsc::Sender<Frame>) -> SessionId {
        let id = self.next_session_id;
        self.next_session_id += 1;
        self.sessions.insert(
            id,
            Session {
                id,
                window: None,
                outbound,
            },
        );
        id
    }

    pub fn disconnect(&mut self, id: SessionId) -> Option<Session> {
        self.sessions.remove(&id)
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.sessions.values().filter_map(|s| s.window.as_ref())
    }

    /// Give the session a fresh window id. Any client-supplied id is ignored.
    pub fn open_window(
        &mut self,
        session: SessionId,
        spec: &WindowSpec,
    ) -> Result<Window, CommandError> {
        let entry = self
            .sessions
            .get_mut(&session)
            .ok_or(CommandError::UnknownSession(session))?;

        let window = spec.with_id(self.next_window_id);
        self.next_window_id += 1;
        entry.window = Some(window);
        Ok(window)
    }

    /// Replace a window's rectangle and bind it to `session`.
    ///
    /// Any id handed out earlier is accepted, even if the session that
    /// opened it has since gone away.
    pub fn update_window(
        &mut self,
        session: SessionId,
        spec: &WindowSpec,
    ) -> Result<Window, CommandError> {
        let id = spec.id.ok_or(CommandError::MissingWindowId)?;
        if id == 0 || id >= self.next_window_id {
            return Err(CommandError::UnassignedWindow(id));
        }
        if !self.sessions.contains_key(&session) {
            return Err(CommandError::UnknownSession(session));
        }

        for other in self.sessions.values_mut() {
            if other.window.map(|w| w.id) == Some(id) {
                other.window = None;
            }
        }

        let window = spec.with_id(id);
        if let Some(entry) = self.sessions.get_mut(&session) {
            entry.window = Some(window);
        }
        Ok(window)
    }

    /// Remove the session holding window `id`. Dropping its outbound queue
    /// ends the connection handler.
    pub fn close_window(&mut self, id: u32) -> Result<Session, CommandError> {
        let session = self
            .sessions
            .values()
            .find(|s| s.window.map(|w| w.id) == Some(id))
            .map(|s| s.id)
            .ok_or(CommandError::UnknownWindow(id))?;
        self.sessions
            .remove(&session)
            .ok_or(CommandError::UnknownSession(session))
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    /// Rebuild the boundary from the current windows.
    pub fn recompute_boundary(&mut self) -> &Polygon {
        self.polygon = recompute_boundary(
            self.sessions.values().filter_map(|s| s.window.as_ref()),
        );
        &self.polygon
    }

    /// Queue `frame` for one session, removing it on failure.
    pub fn send_to(&mut self, id: SessionId, frame: &Frame, kind: FrameKind) -> Delivery {
        let delivery = match self.sessions.get(&id) {
            Some(session) => session.deliver(frame, kind),
            None => return Delivery::Closed,
        };
        if delivery.is_failure() {
            self.sessions.remove(&id);
        }
        delivery
    }

    /// Queue `frame` for every session. Sessions whose handler is gone, or
    /// whose queue is too full to take an event, are removed and returned.
    /// A full queue only loses a snapshot.
    pub fn broadcast(&mut self, frame: &Frame, kind: FrameKind) -> Vec<Session> {
        let mut closed = Vec::new();
        for session in self.sessions.values() {
            match session.deliver(frame, kind) {
                Delivery::Queued => {}
                Delivery::Dropped => {
                    tracing::warn!("Session {} outbound queue full, frame dropped", session.id)
                }
                Delivery::Lagged | Delivery::Closed => closed.push(session.id),
            }
        }
        closed
            .into_iter()
            .filter_map(|id| self.sessions.remove(&id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: Option<u32>, x: f64) -> WindowSpec {
        WindowSpec {
            id,
            width: 100.0,
            height: 100.0,
            x,
            y: 0.0,
        }
    }

    fn frame(text: &str) -> Frame {
        Frame::from(text)
    }

    #[test]
    fn window_ids_are_sequential_and_ignore_client_id() {
        let mut registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(4);
        let s1 = registry.connect(tx.clone());
        let s2 = registry.connect(tx);

        let w1 = registry.open_window(s1, &spec(Some(77), 0.0)).unwrap();
        let w2 = registry.open_window(s2, &spec(None, 150.0)).unwrap();
        assert_eq!(w1.id, 1);
        assert_eq!(w2.id, 2);
        assert_eq!(registry.windows().count(), 2);
    }

    #[test]
    fn closed_window_ids_are_not_reused() {
        let mut registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(4);
        let s1 = registry.connect(tx.clone());
        let w1 = registry.open_window(s1, &spec(None, 0.0)).unwrap();
        registry.close_window(w1.id).unwrap();
        let s2 = registry.connect(tx);
        let w2 = registry.open_window(s2, &spec(None, 0.0)).unwrap();
        assert!(w2.id > w1.id);
    }

    #[test]
    fn open_window_for_unknown_session_fails() {
        let mut registry = SessionRegistry::new();
        assert_eq!(
            registry.open_window(9, &spec(None, 0.0)),
            Err(CommandError::UnknownSession(9))
        );
    }

    #[test]
    fn update_moves_window_to_sender() {
        let mut registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(4);
        let s1 = registry.connect(tx.clone());
        let s2 = registry.connect(tx);
        let w = registry.open_window(s1, &spec(None, 0.0)).unwrap();

        let updated = registry.update_window(s2, &spec(Some(w.id), 40.0)).unwrap();
        assert_eq!(updated.id, w.id);
        assert_eq!(updated.x, 40.0);
        assert_eq!(registry.session(s1).unwrap().window, None);
        assert_eq!(registry.session(s2).unwrap().window, Some(updated));
        assert_eq!(registry.windows().count(), 1);
    }

    #[test]
    fn update_revives_window_of_departed_session() {
        let mut registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(4);
        let old = registry.connect(tx.clone());
        let w = registry.open_window(old, &spec(None, 0.0)).unwrap();
        registry.disconnect(old);

        let new = registry.connect(tx);
        let revived = registry.update_window(new, &spec(Some(w.id), 5.0)).unwrap();
        assert_eq!(revived.id, w.id);
        assert_eq!(registry.windows().count(), 1);
    }

    #[test]
    fn update_requires_assigned_id() {
        let mut registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(4);
        let s = registry.connect(tx);
        assert_eq!(
            registry.update_window(s, &spec(None, 0.0)),
            Err(CommandError::MissingWindowId)
        );
        assert_eq!(
            registry.update_window(s, &spec(Some(1), 0.0)),
            Err(CommandError::UnassignedWindow(1))
        );
        assert_eq!(
            registry.update_window(s, &spec(Some(0), 0.0)),
            Err(CommandError::UnassignedWindow(0))
        );
    }

    #[test]
    fn close_unknown_window_fails() {
        let mut registry = SessionRegistry::new();
        assert!(matches!(
            registry.close_window(3),
            Err(CommandError::UnknownWindow(3))
        ));
    }

    #[test]
    fn close_removes_session_from_fan_out() {
        let mut registry = SessionRegistry::new();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        let s1 = registry.connect(tx1);
        let s2 = registry.connect(tx2);
        let w = registry.open_window(s1, &spec(None, 0.0)).unwrap();

        let closed = registry.close_window(w.id).unwrap();
        assert_eq!(closed.id, s1);
        drop(closed);
        assert!(registry.session(s1).is_none());
        assert_eq!(registry.windows().count(), 0);

        assert!(registry.broadcast(&frame("after"), FrameKind::Event).is_empty());
        assert_eq!(rx1.try_recv(), Err(mpsc::error::TryRecvError::Disconnected));
        assert_eq!(&*rx2.try_recv().unwrap(), "after");
        assert!(registry.session(s2).is_some());
    }

    #[test]
    fn boundary_follows_windows() {
        let mut registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(4);
        let s1 = registry.connect(tx.clone());
        let s2 = registry.connect(tx);
        registry.open_window(s1, &spec(None, 0.0)).unwrap();
        assert_eq!(registry.recompute_boundary().lines.len(), 4);

        // Connection without a window adds no geometry
        let before = registry.polygon().clone();
        assert_eq!(registry.recompute_boundary(), &before);

        registry.open_window(s2, &spec(None, 150.0)).unwrap();
        let xs: Vec<f64> = registry
            .recompute_boundary()
            .points
            .iter()
            .map(|p| p.x)
            .collect();
        assert!(xs.contains(&250.0));

        registry.disconnect(s2);
        assert_eq!(registry.recompute_boundary(), &before);
    }

    #[test]
    fn broadcast_reaches_every_session() {
        let mut registry = SessionRegistry::new();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        registry.connect(tx1);
        registry.connect(tx2);

        assert!(registry.broadcast(&frame("hello"), FrameKind::Event).is_empty());
        assert_eq!(&*rx1.try_recv().unwrap(), "hello");
        assert_eq!(&*rx2.try_recv().unwrap(), "hello");
    }

    #[test]
    fn broadcast_removes_closed_sessions() {
        let mut registry = SessionRegistry::new();
        let (tx1, rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        let dead = registry.connect(tx1);
        let alive = registry.connect(tx2);
        registry.open_window(dead, &spec(None, 0.0)).unwrap();
        drop(rx1);

        let removed = registry.broadcast(&frame("x"), FrameKind::Snapshot);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, dead);
        assert!(removed[0].window.is_some());
        assert!(registry.session(dead).is_none());
        assert!(registry.session(alive).is_some());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn full_queue_drops_snapshot_but_keeps_session() {
        let mut registry = SessionRegistry::new();
        let (tx, mut rx) = mpsc::channel(1);
        let s = registry.connect(tx);

        assert!(registry.broadcast(&frame("first"), FrameKind::Snapshot).is_empty());
        assert!(registry.broadcast(&frame("second"), FrameKind::Snapshot).is_empty());
        assert!(registry.session(s).is_some());
        assert_eq!(&*rx.try_recv().unwrap(), "first");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn full_queue_on_event_removes_session() {
        let mut registry = SessionRegistry::new();
        let (slow_tx, mut slow_rx) = mpsc::channel(1);
        let (fast_tx, mut fast_rx) = mpsc::channel(4);
        let slow = registry.connect(slow_tx);
        let fast = registry.connect(fast_tx);

        assert!(registry.broadcast(&frame("balls"), FrameKind::Snapshot).is_empty());
        let removed = registry.broadcast(&frame("polygon"), FrameKind::Event);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, slow);
        drop(removed);
        assert!(registry.session(fast).is_some());

        // The slow peer still gets what was queued, then sees the end
        assert_eq!(&*slow_rx.try_recv().unwrap(), "balls");
        assert_eq!(slow_rx.try_recv(), Err(mpsc::error::TryRecvError::Disconnected));
        assert_eq!(&*fast_rx.try_recv().unwrap(), "balls");
        assert_eq!(&*fast_rx.try_recv().unwrap(), "polygon");
    }

    #[test]
    fn send_to_closed_session_removes_it() {
        let mut registry = SessionRegistry::new();
        let (tx, rx) = mpsc::channel(1);
        let s = registry.connect(tx);
        drop(rx);
        assert_eq!(registry.send_to(s, &frame("x"), FrameKind::Event), Delivery::Closed);
        assert!(registry.is_empty());
    }
}
