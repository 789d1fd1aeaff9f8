use crate::agent::Agent;
use crate::error::{Error, Result};
use crate::policy::UpdatePolicy;
use crate::pool::WorkerPool;
use crate::Vector2D;
use boid_shared::{SimulationSettings, WorldSize};
use rand::Rng;

/// World-space vertices of one agent, ready for the renderer
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Triangle {
    pub v0: Vector2D,
    pub v1: Vector2D,
    pub v2: Vector2D,
}

impl Triangle {
    pub fn vertices(&self) -> [Vector2D; 3] {
        [self.v0, self.v1, self.v2]
    }
}

/// Initial conditions for a freshly spawned flock
#[derive(Debug, Clone, Copy)]
pub struct SpawnParams {
    pub world: WorldSize,
    pub count: usize,
    pub initial_speed: f32,
    pub angular_velocity: f32,
    pub created_at: f64,
}

impl SpawnParams {
    pub fn from_settings(settings: &SimulationSettings, created_at: f64) -> Self {
        Self {
            world: settings.world(),
            count: settings.boids,
            initial_speed: settings.initial_speed,
            angular_velocity: settings.angular_velocity,
            created_at,
        }
    }
}

fn reserve<T>(what: &'static str, count: usize) -> Result<Vec<T>> {
    let mut storage = Vec::new();
    storage
        .try_reserve_exact(count)
        .map_err(|source| Error::Allocation {
            what,
            count,
            source,
        })?;
    Ok(storage)
}

/// Fixed-size, index-addressed collection of agents.
///
/// Agents live in one contiguous buffer. Each update pass writes a second
/// buffer of the same length and swaps it in, so every agent's update reads
/// the flock exactly as it was at the start of the frame.
#[derive(Debug, Clone)]
pub struct Flock {
    agents: Vec<Agent>,
    next: Vec<Agent>,
}

impl Flock {
    pub fn from_agents(agents: Vec<Agent>) -> Result<Self> {
        if agents.is_empty() {
            return Err(Error::InvalidFlock("a flock needs at least one agent".into()));
        }

        let mut next = reserve("agents", agents.len())?;
        next.extend_from_slice(&agents);
        Ok(Self { agents, next })
    }

    /// Spawn `params.count` agents at integer positions inside the world with
    /// integer initial rotations in `0..=6`.
    pub fn spawn<R: Rng>(rng: &mut R, params: &SpawnParams) -> Result<Self> {
        let mut agents = reserve("agents", params.count)?;
        let max_x = params.world.width.max(0.0) as u32;
        let max_y = params.world.height.max(0.0) as u32;

        for _ in 0..params.count {
            let origin = Vector2D::new(
                rng.gen_range(0..=max_x) as f32,
                rng.gen_range(0..=max_y) as f32,
            );
            let rotation = rng.gen_range(0..=6u32) as f32;
            let agent = Agent::new(
                origin,
                Vector2D::new(params.initial_speed, params.initial_speed),
                rotation,
                params.angular_velocity,
            )
            .with_last_update(params.created_at);
            agents.push(agent);
        }

        log::debug!("Spawned {} boids", agents.len());
        Self::from_agents(agents)
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Advance every agent by one frame.
    pub fn update_all<P>(&mut self, policy: &P, pool: &WorkerPool, now: f64)
    where
        P: UpdatePolicy + ?Sized,
    {
        let snapshot = &self.agents;
        pool.for_each_indexed(&mut self.next, |index, slot| {
            *slot = policy.update(&snapshot[index], snapshot, now);
        });
        std::mem::swap(&mut self.agents, &mut self.next);
    }

    /// Output buffer sized for [`Flock::project_into`]
    pub fn triangle_buffer(&self) -> Result<Vec<Triangle>> {
        let mut triangles = reserve("triangles", self.len())?;
        triangles.resize(self.len(), Triangle::default());
        Ok(triangles)
    }

    /// Write each agent's world-space triangle into `out`.
    pub fn project_into(&self, pool: &WorkerPool, out: &mut [Triangle]) -> Result<()> {
        if out.len() != self.len() {
            return Err(Error::InvalidFlock(format!(
                "triangle buffer holds {} entries for {} agents",
                out.len(),
                self.len()
            )));
        }

        let agents = &self.agents;
        pool.for_each_indexed(out, |index, triangle| {
            let [v0, v1, v2] = agents[index].world_vertices();
            *triangle = Triangle { v0, v1, v2 };
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::StraightLinePolicy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params(count: usize) -> SpawnParams {
        SpawnParams {
            world: WorldSize::new(1920.0, 1200.0),
            count,
            initial_speed: 20.0,
            angular_velocity: 1.0,
            created_at: 0.0,
        }
    }

    #[test]
    fn test_flock_creation() {
        let flock = Flock::spawn(&mut StdRng::seed_from_u64(1), &params(50)).unwrap();
        assert_eq!(flock.len(), 50);
        for agent in flock.agents() {
            assert!((0.0..=1920.0).contains(&agent.origin.x));
            assert!((0.0..=1200.0).contains(&agent.origin.y));
            assert_eq!(agent.rotation.fract(), 0.0);
            assert!(agent.rotation <= 6.0);
            assert_eq!(agent.velocity, Vector2D::new(20.0, 20.0));
        }
    }

    #[test]
    fn test_same_seed_same_flock() {
        let a = Flock::spawn(&mut StdRng::seed_from_u64(42690), &params(32)).unwrap();
        let b = Flock::spawn(&mut StdRng::seed_from_u64(42690), &params(32)).unwrap();
        assert_eq!(a.agents(), b.agents());
    }

    #[test]
    fn test_empty_flock_rejected() {
        let err = Flock::spawn(&mut StdRng::seed_from_u64(1), &params(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidFlock(_)));
    }

    #[test]
    fn test_flock_update() {
        let mut flock = Flock::spawn(&mut StdRng::seed_from_u64(3), &params(10)).unwrap();
        let initial: Vec<_> = flock.agents().iter().map(|a| a.origin).collect();
        let policy = StraightLinePolicy {
            world: WorldSize::new(1920.0, 1200.0),
        };

        flock.update_all(&policy, &WorkerPool::serial(), 0.05);

        let changed = flock
            .agents()
            .iter()
            .zip(initial.iter())
            .any(|(agent, before)| agent.origin != *before);
        assert!(changed);
        assert!(flock.agents().iter().all(|a| a.last_update == 0.05));
    }

    #[test]
    fn test_update_reads_frame_snapshot() {
        // Every agent copies the origin of its left neighbour. Reading the
        // snapshot means the values shift by exactly one slot per frame.
        let agents: Vec<Agent> = (0..8)
            .map(|i| Agent::new(Vector2D::new(i as f32, 0.0), Vector2D::zero(), 0.0, 0.0))
            .collect();
        let mut flock = Flock::from_agents(agents).unwrap();
        let shift = |agent: &Agent, snapshot: &[Agent], _now: f64| {
            let index = snapshot.iter().position(|a| a == agent).unwrap_or(0);
            let mut next = agent.clone();
            next.origin = snapshot[(index + snapshot.len() - 1) % snapshot.len()].origin;
            next
        };

        flock.update_all(&shift, &WorkerPool::new(3).unwrap(), 1.0);

        let xs: Vec<f32> = flock.agents().iter().map(|a| a.origin.x).collect();
        assert_eq!(xs, vec![7.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Flock::spawn(&mut StdRng::seed_from_u64(9), &params(4)).unwrap();
        let mut copy = original.clone();
        let policy = StraightLinePolicy {
            world: WorldSize::new(1920.0, 1200.0),
        };
        copy.update_all(&policy, &WorkerPool::serial(), 0.05);
        assert_ne!(original.agents(), copy.agents());
        assert_eq!(original.agents()[0].last_update, 0.0);
    }

    #[test]
    fn test_projection_offsets_shape() {
        let flock = Flock::spawn(&mut StdRng::seed_from_u64(5), &params(17)).unwrap();
        let mut triangles = flock.triangle_buffer().unwrap();

        flock.project_into(&WorkerPool::new(4).unwrap(), &mut triangles).unwrap();

        for (agent, triangle) in flock.agents().iter().zip(triangles.iter()) {
            for (local, world) in agent.shape.iter().zip(triangle.vertices().iter()) {
                assert_eq!(*local + agent.origin, *world);
            }
        }
    }

    #[test]
    fn test_projection_rejects_wrong_buffer() {
        let flock = Flock::spawn(&mut StdRng::seed_from_u64(5), &params(3)).unwrap();
        let mut triangles = vec![Triangle::default(); 2];
        assert!(flock.project_into(&WorkerPool::serial(), &mut triangles).is_err());
    }
}
