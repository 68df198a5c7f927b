//! Load test for the arena server.
//!
//! Spawns multiple fake WebSocket clients that:
//! - Connect to the server and register one window each, laid out in a grid
//! - Periodically drop new balls into their window
//! - Receive and count polygon and balls broadcasts
//!
//! Usage: cargo run --bin loadtest -- [OPTIONS]
//!
//! Options:
//!   --clients N      Number of clients to spawn (default: 50)
//!   --duration S     Test duration in seconds (default: 30)
//!   --ball-rate R    New balls per second per client (default: 0.5)
//!   --url URL        Server URL (default: ws://127.0.0.1:8080/ws)
//!   --seed N         Seed for ball placement (default: 42)

use arena_shared::protocol::{Ball, ClientMsg, ServerMsg, WindowSpec};
use arena_shared::vec2::vec2;
use futures_util::{SinkExt, StreamExt};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};

const WINDOW_WIDTH: f64 = 400.0;
const WINDOW_HEIGHT: f64 = 300.0;
const GRID_COLUMNS: u32 = 8;

// === Metrics ===

#[derive(Default)]
struct Metrics {
    connected: AtomicU64,
    messages_received: AtomicU64,
    windows_assigned: AtomicU64,
    polygons_received: AtomicU64,
    balls_frames_received: AtomicU64,
    balls_sent: AtomicU64,
    errors: AtomicU64,
    total_balls_seen: AtomicU64,
    latency_sum_ms: AtomicU64,
    latency_count: AtomicU64,
}

struct ClientOptions {
    url: String,
    ball_rate: f64,
    duration: Duration,
    seed: u64,
}

/// Grid cell for a client; neighbouring windows overlap a little so the
/// merged boundary spans the whole grid.
fn window_for(client_id: u32) -> WindowSpec {
    let col = client_id % GRID_COLUMNS;
    let row = client_id / GRID_COLUMNS;
    WindowSpec {
        id: None,
        width: WINDOW_WIDTH,
        height: WINDOW_HEIGHT,
        x: col as f64 * (WINDOW_WIDTH - 20.0),
        y: row as f64 * (WINDOW_HEIGHT - 20.0),
    }
}

fn random_ball(rng: &mut ChaCha8Rng, window: &WindowSpec) -> Ball {
    let radius = rng.gen_range(5.0..15.0);
    Ball {
        position: vec2(
            window.x + rng.gen_range(radius..window.width - radius),
            window.y + rng.gen_range(radius..window.height / 2.0),
        ),
        velocity: vec2(rng.gen_range(-4.0..4.0), rng.gen_range(-2.0..2.0)),
        radius,
        color: format!("#{:06x}", rng.gen_range(0..0x0100_0000u32)),
    }
}

fn encode(msg: &ClientMsg) -> Option<Message> {
    serde_json::to_string(msg)
        .ok()
        .map(|json| Message::Text(json.into()))
}

// === Client task ===

async fn run_client(client_id: u32, opts: Arc<ClientOptions>, metrics: Arc<Metrics>) {
    let connect_start = Instant::now();

    let (mut ws, _) = match connect_async(opts.url.as_str()).await {
        Ok(conn) => conn,
        Err(e) => {
            if client_id < 5 {
                eprintln!("Client {} failed to connect: {}", client_id, e);
            }
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    metrics
        .latency_sum_ms
        .fetch_add(connect_start.elapsed().as_millis() as u64, Ordering::Relaxed);
    metrics.latency_count.fetch_add(1, Ordering::Relaxed);
    metrics.connected.fetch_add(1, Ordering::Relaxed);

    let window = window_for(client_id);
    let registered = match encode(&ClientMsg::NewWindow(window)) {
        Some(msg) => ws.send(msg).await.is_ok(),
        None => false,
    };
    if !registered {
        metrics.errors.fetch_add(1, Ordering::Relaxed);
        metrics.connected.fetch_sub(1, Ordering::Relaxed);
        return;
    }

    let ball_interval = if opts.ball_rate > 0.0 {
        Duration::from_secs_f64(1.0 / opts.ball_rate)
    } else {
        Duration::from_secs(3600)
    };
    let mut ball_timer = tokio::time::interval(ball_interval);
    ball_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // First tick fires immediately
    ball_timer.tick().await;

    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed.wrapping_add(client_id as u64));
    let test_end = tokio::time::Instant::now() + opts.duration;

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(test_end) => break,

            _ = ball_timer.tick() => {
                let ball = random_ball(&mut rng, &window);
                let sent = match encode(&ClientMsg::NewBall(ball)) {
                    Some(msg) => ws.send(msg).await.is_ok(),
                    None => false,
                };
                if sent {
                    metrics.balls_sent.fetch_add(1, Ordering::Relaxed);
                } else {
                    metrics.errors.fetch_add(1, Ordering::Relaxed);
                    break;
                }
            }

            msg = ws.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        metrics.messages_received.fetch_add(1, Ordering::Relaxed);
                        match serde_json::from_str::<ServerMsg>(&text) {
                            Ok(ServerMsg::NewWindow(w)) => {
                                if client_id < 3 {
                                    eprintln!("Client {} got window {}", client_id, w.id);
                                }
                                metrics.windows_assigned.fetch_add(1, Ordering::Relaxed);
                            }
                            Ok(ServerMsg::Polygon(_)) => {
                                metrics.polygons_received.fetch_add(1, Ordering::Relaxed);
                            }
                            Ok(ServerMsg::Balls(balls)) => {
                                metrics.balls_frames_received.fetch_add(1, Ordering::Relaxed);
                                metrics.total_balls_seen.fetch_add(balls.len() as u64, Ordering::Relaxed);
                            }
                            Ok(ServerMsg::UpdateWindow(_)) => {}
                            Err(e) => {
                                if client_id < 3 {
                                    eprintln!("Client {} could not parse message: {}", client_id, e);
                                }
                                metrics.errors.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        if client_id < 3 {
                            eprintln!("Client {} got Close: {:?}", client_id, frame);
                        }
                        break;
                    }
                    None => break,
                    Some(Err(e)) => {
                        if client_id < 3 {
                            eprintln!("Client {} error: {}", client_id, e);
                        }
                        metrics.errors.fetch_add(1, Ordering::Relaxed);
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    let _ = ws.close(None).await;
    metrics.connected.fetch_sub(1, Ordering::Relaxed);
}

// === Main ===

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut num_clients: u32 = 50;
    let mut duration_secs: u64 = 30;
    let mut ball_rate: f64 = 0.5;
    let mut seed: u64 = 42;
    let mut url = "ws://127.0.0.1:8080/ws".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--clients" => {
                i += 1;
                num_clients = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(50);
            }
            "--duration" => {
                i += 1;
                duration_secs = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(30);
            }
            "--ball-rate" => {
                i += 1;
                ball_rate = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(0.5);
            }
            "--seed" => {
                i += 1;
                seed = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(42);
            }
            "--url" => {
                i += 1;
                url = args.get(i).cloned().unwrap_or(url);
            }
            other => eprintln!("Ignoring unknown argument {}", other),
        }
        i += 1;
    }

    println!("=== Arena Server Load Test ===");
    println!("Clients: {}", num_clients);
    println!("Duration: {}s", duration_secs);
    println!("Ball rate: {}/s per client", ball_rate);
    println!("Seed: {}", seed);
    println!("URL: {}", url);
    println!();

    let metrics = Arc::new(Metrics::default());
    let opts = Arc::new(ClientOptions {
        url,
        ball_rate,
        duration: Duration::from_secs(duration_secs),
        seed,
    });

    let mut handles = Vec::with_capacity(num_clients as usize);
    let spawn_start = Instant::now();

    for client_id in 0..num_clients {
        let opts = Arc::clone(&opts);
        let metrics = Arc::clone(&metrics);
        handles.push(tokio::spawn(run_client(client_id, opts, metrics)));

        // Stagger spawns slightly to avoid thundering herd
        if client_id % 50 == 49 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    println!("All clients spawned in {:?}", spawn_start.elapsed());
    println!();

    let metrics_clone = Arc::clone(&metrics);
    let stats_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        let start = Instant::now();

        loop {
            interval.tick().await;
            let elapsed = start.elapsed().as_secs();
            let m = &metrics_clone;
            println!(
                "[{:3}s] connected={}, msgs={}, polygons={}, balls_frames={}, balls_sent={}, errors={}",
                elapsed,
                m.connected.load(Ordering::Relaxed),
                m.messages_received.load(Ordering::Relaxed),
                m.polygons_received.load(Ordering::Relaxed),
                m.balls_frames_received.load(Ordering::Relaxed),
                m.balls_sent.load(Ordering::Relaxed),
                m.errors.load(Ordering::Relaxed),
            );
        }
    });

    for handle in handles {
        let _ = handle.await;
    }
    stats_handle.abort();

    println!();
    println!("=== Final Results ===");
    let msgs = metrics.messages_received.load(Ordering::Relaxed);
    let windows = metrics.windows_assigned.load(Ordering::Relaxed);
    let polygons = metrics.polygons_received.load(Ordering::Relaxed);
    let frames = metrics.balls_frames_received.load(Ordering::Relaxed);
    let sent = metrics.balls_sent.load(Ordering::Relaxed);
    let errors = metrics.errors.load(Ordering::Relaxed);
    let balls = metrics.total_balls_seen.load(Ordering::Relaxed);
    let latency_sum = metrics.latency_sum_ms.load(Ordering::Relaxed);
    let latency_count = metrics.latency_count.load(Ordering::Relaxed);

    println!("Total messages received: {}", msgs);
    println!("Windows assigned: {}/{}", windows, num_clients);
    println!("Polygon messages: {}", polygons);
    println!("Balls frames: {}", frames);
    println!("Balls sent: {}", sent);
    println!("Total errors: {}", errors);
    println!(
        "Average balls per frame: {}",
        if frames > 0 { balls / frames } else { 0 }
    );
    if latency_count > 0 {
        println!("Average connect latency: {}ms", latency_sum / latency_count);
    }

    // 25 frames per second at the default 40ms cadence
    let expected = duration_secs as f64 * 25.0;
    let per_client = frames as f64 / num_clients.max(1) as f64;
    println!();
    println!("Messages/sec (total): {:.0}", msgs as f64 / duration_secs.max(1) as f64);
    println!("Balls frames per client: {:.1}", per_client);
    println!("Expected per client: {:.1}", expected);
    if expected > 0.0 {
        println!("Delivery rate: {:.1}%", per_client / expected * 100.0);
    }
}
