use crate::collision::{collide_ball_line, collide_balls};
use crate::config::PhysicsConfig;
use crate::error::CommandError;
use arena_shared::protocol::{Ball, Line};

/// The global ball set. Balls are not owned by any window.
pub struct World {
    balls: Vec<Ball>,
    physics: PhysicsConfig,
    max_balls: usize,
}

impl World {
    pub fn new(physics: PhysicsConfig, max_balls: usize) -> Self {
        Self {
            balls: Vec::new(),
            physics,
            max_balls,
        }
    }

    /// Append a ball. Fails once the set holds `max_balls`.
    pub fn spawn(&mut self, ball: Ball) -> Result<(), CommandError> {
        if self.balls.len() >= self.max_balls {
            return Err(CommandError::BallLimit(self.max_balls));
        }
        self.balls.push(ball);
        Ok(())
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn ball_count(&self) -> usize {
        self.balls.len()
    }

    /// One frame: `substeps` consecutive substeps against `lines`.
    pub fn step_frame(&mut self, lines: &[Line]) {
        for _ in 0..self.physics.substeps {
            self.step_substep(lines);
        }
    }

    /// Advance every ball once, in sequence order.
    ///
    /// Ball i sees balls before it already advanced in this substep, and
    /// every pair is resolved from both sides. Results depend on order.
    pub fn step_substep(&mut self, lines: &[Line]) {
        let physics = self.physics;
        let dt = physics.dt();

        for i in 0..self.balls.len() {
            let ball = &mut self.balls[i];
            ball.velocity.y += physics.gravity * dt;
            ball.velocity = ball.velocity * physics.damping;
            ball.position += ball.velocity * dt;

            for line in lines {
                collide_ball_line(ball, line);
            }

            for j in 0..self.balls.len() {
                if i == j {
                    continue;
                }
                let (a, b) = pair_mut(&mut self.balls, i, j);
                collide_balls(a, b);
            }
        }
    }
}

fn pair_mut(balls: &mut [Ball], i: usize, j: usize) -> (&mut Ball, &mut Ball) {
    if i < j {
        let (head, tail) = balls.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = balls.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}
