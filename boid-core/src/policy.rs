use crate::agent::{heading_of, Agent};
use crate::Vector2D;
use boid_shared::{FlockingWeights, WorldSize};
use std::f32::consts::{PI, TAU};

/// Longest simulated step, in seconds, a single update may integrate.
pub const MAX_STEP: f64 = 0.1;

/// Per-agent update rule.
///
/// `update` reads the agent's prior state and the frame snapshot (which also
/// contains the agent itself) and returns the agent's next state. It must not
/// depend on anything but its arguments: the flock runs it concurrently for
/// disjoint agents against one shared snapshot.
pub trait UpdatePolicy: Sync {
    fn update(&self, agent: &Agent, snapshot: &[Agent], now: f64) -> Agent;
}

impl<F> UpdatePolicy for F
where
    F: Fn(&Agent, &[Agent], f64) -> Agent + Sync,
{
    fn update(&self, agent: &Agent, snapshot: &[Agent], now: f64) -> Agent {
        self(agent, snapshot, now)
    }
}

fn elapsed(agent: &Agent, now: f64) -> f32 {
    (now - agent.last_update).clamp(0.0, MAX_STEP) as f32
}

/// Signed smallest turn from heading `from` to heading `to`, in `(-π, π]`
pub fn shortest_turn(from: f32, to: f32) -> f32 {
    let delta = (to - from).rem_euclid(TAU);
    if delta > PI {
        delta - TAU
    } else {
        delta
    }
}

/// Wrap a position that left the world onto the opposite edge
pub fn wrap_edges(mut position: Vector2D, world: WorldSize) -> Vector2D {
    if position.x < 0.0 {
        position.x = world.width;
    } else if position.x > world.width {
        position.x = 0.0;
    }

    if position.y < 0.0 {
        position.y = world.height;
    } else if position.y > world.height {
        position.y = 0.0;
    }

    position
}

/// Steering directions computed from an agent's neighbourhood
pub mod behavior {
    use super::*;

    fn neighbours<'a>(
        agent: &'a Agent,
        others: &'a [Agent],
        radius: f32,
    ) -> impl Iterator<Item = (&'a Agent, f32)> + 'a {
        others.iter().filter_map(move |other| {
            let distance = agent.origin.distance(&other.origin);
            (distance > 0.0 && distance < radius).then_some((other, distance))
        })
    }

    pub fn separation(agent: &Agent, others: &[Agent], weights: &FlockingWeights) -> Vector2D {
        let mut steering = Vector2D::zero();
        let mut count = 0;

        for (other, distance) in neighbours(agent, others, weights.separation_radius) {
            let diff = (agent.origin - other.origin).normalize() / distance;
            steering += diff;
            count += 1;
        }

        if count > 0 {
            steering = steering / count as f32;
        }
        steering.normalize()
    }

    pub fn alignment(agent: &Agent, others: &[Agent], weights: &FlockingWeights) -> Vector2D {
        let mut sum = Vector2D::zero();
        let mut count = 0;

        for (other, _) in neighbours(agent, others, weights.view_radius) {
            sum += other.velocity;
            count += 1;
        }

        if count > 0 {
            (sum / count as f32).normalize()
        } else {
            Vector2D::zero()
        }
    }

    pub fn cohesion(agent: &Agent, others: &[Agent], weights: &FlockingWeights) -> Vector2D {
        let mut sum = Vector2D::zero();
        let mut count = 0;

        for (other, _) in neighbours(agent, others, weights.view_radius) {
            sum += other.origin;
            count += 1;
        }

        if count > 0 {
            (sum / count as f32 - agent.origin).normalize()
        } else {
            Vector2D::zero()
        }
    }
}

/// Classic separation/alignment/cohesion flocking.
///
/// The neighbourhood picks a desired heading; the agent turns towards it by
/// at most `angular_velocity * dt`, keeps its speed along the new heading and
/// wraps around the world edges.
#[derive(Debug, Clone, Copy)]
pub struct SteeringPolicy {
    pub weights: FlockingWeights,
    pub world: WorldSize,
}

impl SteeringPolicy {
    pub fn new(weights: FlockingWeights, world: WorldSize) -> Self {
        Self { weights, world }
    }

    pub fn steering(&self, agent: &Agent, snapshot: &[Agent]) -> Vector2D {
        behavior::separation(agent, snapshot, &self.weights) * self.weights.separation_weight
            + behavior::alignment(agent, snapshot, &self.weights) * self.weights.alignment_weight
            + behavior::cohesion(agent, snapshot, &self.weights) * self.weights.cohesion_weight
    }
}

impl UpdatePolicy for SteeringPolicy {
    fn update(&self, agent: &Agent, snapshot: &[Agent], now: f64) -> Agent {
        let dt = elapsed(agent, now);
        let mut next = agent.clone();

        let steer = self.steering(agent, snapshot);
        if steer.magnitude() > 0.0 {
            let target = heading_of(agent.origin, agent.origin + steer);
            let max_turn = agent.angular_velocity.abs() * dt;
            let turn = shortest_turn(agent.rotation, target).clamp(-max_turn, max_turn);
            next.rotate(turn);
        }

        let speed = agent.velocity.magnitude();
        next.velocity = next.forward() * speed;
        next.origin = wrap_edges(next.origin + next.velocity * dt, self.world);
        next.last_update = now;
        next
    }
}

/// Moves every agent along its heading with no neighbour influence
#[derive(Debug, Clone, Copy)]
pub struct StraightLinePolicy {
    pub world: WorldSize,
}

impl UpdatePolicy for StraightLinePolicy {
    fn update(&self, agent: &Agent, _snapshot: &[Agent], now: f64) -> Agent {
        let dt = elapsed(agent, now);
        let mut next = agent.clone();
        next.velocity = next.forward() * agent.velocity.magnitude();
        next.origin = wrap_edges(next.origin + next.velocity * dt, self.world);
        next.last_update = now;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> WorldSize {
        WorldSize::new(800.0, 600.0)
    }

    fn agent_at(x: f32, y: f32, rotation: f32) -> Agent {
        Agent::new(Vector2D::new(x, y), Vector2D::new(20.0, 20.0), rotation, 1.0)
    }

    #[test]
    fn test_shortest_turn() {
        assert!((shortest_turn(0.1, 0.3) - 0.2).abs() < 1e-6);
        assert!((shortest_turn(0.1, TAU - 0.1) + 0.2).abs() < 1e-5);
        assert!((shortest_turn(TAU - 0.1, 0.1) - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_wrap_edges() {
        let wrapped = wrap_edges(Vector2D::new(-1.0, 601.0), world());
        assert_eq!(wrapped, Vector2D::new(800.0, 0.0));
    }

    #[test]
    fn test_lonely_agent_keeps_heading() {
        let policy = SteeringPolicy::new(FlockingWeights::default(), world());
        let agent = agent_at(400.0, 300.0, 1.0);
        let next = policy.update(&agent, std::slice::from_ref(&agent), 0.05);

        assert_eq!(next.rotation, agent.rotation);
        assert_eq!(next.shape, agent.shape);
        assert_eq!(next.last_update, 0.05);
        let speed = agent.velocity.magnitude();
        assert!((next.velocity.magnitude() - speed).abs() < 1e-3);
        assert!((next.origin.distance(&agent.origin) - speed * 0.05).abs() < 1e-3);
    }

    #[test]
    fn test_turn_rate_is_bounded() {
        let policy = SteeringPolicy::new(FlockingWeights::default(), world());
        let agent = agent_at(400.0, 300.0, 0.0);
        let crowd = vec![agent.clone(), agent_at(410.0, 300.0, 2.0), agent_at(400.0, 310.0, 4.0)];

        let next = policy.update(&agent, &crowd, 0.05);
        let turned = shortest_turn(agent.rotation, next.rotation).abs();
        assert!(turned > 0.0);
        assert!(turned <= agent.angular_velocity * 0.05 + 1e-5);
    }

    #[test]
    fn test_large_gaps_are_clamped() {
        let policy = StraightLinePolicy { world: world() };
        let agent = agent_at(400.0, 300.0, 0.0);
        let next = policy.update(&agent, &[], 100.0);
        let travelled = next.origin.distance(&agent.origin);
        assert!((travelled - agent.velocity.magnitude() * MAX_STEP as f32).abs() < 1e-3);
    }

    #[test]
    fn test_separation_points_away() {
        let weights = FlockingWeights::default();
        let agent = agent_at(100.0, 100.0, 0.0);
        let others = [agent_at(105.0, 100.0, 0.0)];
        let away = behavior::separation(&agent, &others, &weights);
        assert!(away.x < 0.0);
        assert!(away.y.abs() < 1e-6);
    }

    #[test]
    fn test_cohesion_points_to_centroid() {
        let weights = FlockingWeights::default();
        let agent = agent_at(100.0, 100.0, 0.0);
        let others = [agent_at(100.0, 120.0, 0.0), agent_at(100.0, 130.0, 0.0)];
        let towards = behavior::cohesion(&agent, &others, &weights);
        assert!(towards.approx_eq(&Vector2D::new(0.0, 1.0), 1e-6));
    }

    #[test]
    fn test_closure_policy() {
        let policy = |agent: &Agent, _: &[Agent], now: f64| agent.clone().with_last_update(now);
        let next = policy.update(&agent_at(0.0, 0.0, 0.0), &[], 3.0);
        assert_eq!(next.last_update, 3.0);
    }
}
