use crate::config::ServerConfig;
use crate::protocol::{ClientMsg, Frame};
use crate::registry::SessionId;
use crate::state::ArenaState;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

/// Commands from client connections to the game loop
#[derive(Debug)]
pub enum GameCommand {
    Connect {
        outbound: mpsc::Sender<Frame>,
        response: oneshot::Sender<SessionId>,
    },
    Disconnect {
        session: SessionId,
    },
    Client {
        session: SessionId,
        msg: ClientMsg,
    },
}

/// Run the simulation loop. Owns all arena state; every mutation, from the
/// frame timer or from a connection, goes through this task.
pub async fn run_game_loop(mut cmd_rx: mpsc::Receiver<GameCommand>, config: ServerConfig) {
    let mut state = ArenaState::new(&config);

    // The pause runs from the end of one frame to the start of the next;
    // time spent in a frame is never made up.
    let frame_interval = config.frame_interval();
    let next_frame = tokio::time::sleep(frame_interval);
    tokio::pin!(next_frame);

    loop {
        tokio::select! {
            _ = &mut next_frame => {
                state.frame();
                next_frame.as_mut().reset(Instant::now() + frame_interval);
            }

            Some(cmd) = cmd_rx.recv() => {
                apply(&mut state, cmd);
            }
        }
    }
}

fn apply(state: &mut ArenaState, cmd: GameCommand) {
    match cmd {
        GameCommand::Connect { outbound, response } => {
            let id = state.connect(outbound);
            if response.send(id).is_err() {
                // Handler went away before it learned its id
                state.disconnect(id);
            }
        }
        GameCommand::Disconnect { session } => state.disconnect(session),
        GameCommand::Client { session, msg } => {
            if let Err(e) = state.handle(session, msg) {
                tracing::debug!("Session {}: ignored command: {}", session, e);
            }
        }
    }
}
