//! Simulation session and per-frame step
//!
//! A session owns the particle system, its acceleration structures and the
//! edge buffer, plus playback state. External input handlers drive it through
//! [`FrameInput`] or the explicit setters; nothing here is global.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::edges::{EdgeBuffer, EdgeBuilder, EdgeStrategy};
use super::grid::UniformGrid;
use super::particle::ParticleSystem;
use super::sorted_index::SortedIndex;
use crate::config::{Background, SimConfig};
use crate::consts::{CLOCK_WRAP_MS, DOMAIN_MAX, DOMAIN_MIN};
use crate::error::ConfigError;

/// One-shot inputs collected between frames
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Pause or resume playback (space bar)
    pub toggle_playback: bool,
    /// Switch to the next background (tilde)
    pub cycle_background: bool,
    /// Latest pointer position, already normalized to [-1, 1]
    pub pointer: Option<Vec2>,
}

/// Auxiliary per-frame values for shader effects. The simulation never reads them.
///
/// Laid out as a 16-byte uniform block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    /// Pointer position in [-1, 1] relative to the canvas center
    pub pointer: [f32; 2],
    /// Animation time in milliseconds, including the clock offset
    pub time_ms: f32,
    /// Proximity threshold for fragment-side fading
    pub threshold: f32,
}

/// Everything the rasterizer needs for one frame
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub tick: u64,
    /// Flat particle positions, `N * dims`
    pub positions: &'a [f32],
    /// Flat particle velocities, `N * dims`
    pub velocities: &'a [f32],
    pub edges: &'a EdgeBuffer,
    pub uniforms: FrameUniforms,
    pub clear_color: [f32; 4],
}

/// Map a pointer position in canvas pixels to [-1, 1] around the canvas center
pub fn normalize_pointer(client: Vec2, viewport: Vec2) -> Vec2 {
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return Vec2::ZERO;
    }
    let half = viewport / 2.0;
    (client - half) / half
}

/// Clock offset for a wall-clock time, wrapping every hour
pub fn clock_offset(now_ms: f64) -> f64 {
    now_ms.rem_euclid(CLOCK_WRAP_MS)
}

/// A running simulation
#[derive(Debug, Clone)]
pub struct Session {
    config: SimConfig,
    seed: u64,
    particles: ParticleSystem,
    index: Option<SortedIndex>,
    grid: Option<UniformGrid>,
    edges: EdgeBuilder,
    positions: Vec<f32>,
    velocities: Vec<f32>,
    running: bool,
    tick: u64,
    pointer: Vec2,
    background: Background,
    clock_offset_ms: f64,
}

impl Session {
    /// Validate the config and spawn the particles
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = Pcg32::seed_from_u64(seed);
        let particles =
            ParticleSystem::spawn(config.particle_count, config.speed, config.dimensions, &mut rng);
        let pointer = Vec2::new(
            rng.random_range(DOMAIN_MIN..DOMAIN_MAX),
            rng.random_range(DOMAIN_MIN..DOMAIN_MAX),
        );

        let index = (config.strategy == EdgeStrategy::SortedAxes)
            .then(|| SortedIndex::build(&particles, config.resort));
        let grid = (config.strategy == EdgeStrategy::Grid)
            .then(|| UniformGrid::build(&particles, config.threshold));
        let edges = EdgeBuilder::new(config.strategy, config.threshold, &particles);

        log::info!(
            "Session created: {} particles, {}D, strategy {} (cpu filtered: {}), threshold {}, seed {}",
            config.particle_count,
            config.dimensions.count(),
            config.strategy.as_str(),
            config.strategy.is_filtered(),
            config.threshold,
            seed
        );

        let mut session = Self {
            background: config.background,
            config,
            seed,
            particles,
            index,
            grid,
            edges,
            positions: Vec::new(),
            velocities: Vec::new(),
            running: true,
            tick: 0,
            pointer,
            clock_offset_ms: 0.0,
        };
        session.refresh();
        Ok(session)
    }

    /// Offset added to elapsed time in [`FrameUniforms::time_ms`]
    pub fn with_clock_offset(mut self, offset_ms: f64) -> Self {
        self.clock_offset_ms = offset_ms;
        self
    }

    /// Apply inputs, then advance one tick if playing.
    ///
    /// Returns whether a tick happened.
    pub fn update(&mut self, input: &FrameInput) -> bool {
        if input.toggle_playback {
            self.toggle_playback();
        }
        if input.cycle_background {
            self.cycle_background();
        }
        if let Some(pointer) = input.pointer {
            self.pointer = pointer;
        }

        if !self.running {
            return false;
        }
        self.step();
        true
    }

    /// Advance one tick regardless of playback state
    pub fn step(&mut self) {
        self.particles.advance();
        self.refresh();
        self.tick += 1;
        log::trace!(
            "tick {}: {} segments",
            self.tick,
            self.edges.buffer().segment_count()
        );
    }

    /// Rebuild everything derived from particle positions
    fn refresh(&mut self) {
        if let Some(index) = &mut self.index {
            index.resort(&self.particles);
        }
        if let Some(grid) = &mut self.grid {
            grid.rebuild(&self.particles);
        }
        self.edges
            .rebuild(&self.particles, self.index.as_ref(), self.grid.as_ref());
        self.particles.write_positions(&mut self.positions);
        self.particles.write_velocities(&mut self.velocities);
    }

    /// Pause or resume; state is kept either way. Returns the new running flag.
    pub fn toggle_playback(&mut self) -> bool {
        self.running = !self.running;
        log::debug!(
            "Playback {} at tick {}",
            if self.running { "resumed" } else { "paused" },
            self.tick
        );
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        if self.running != running {
            self.toggle_playback();
        }
    }

    pub fn cycle_background(&mut self) -> Background {
        self.background = self.background.next();
        log::debug!("Background: {}", self.background.as_str());
        self.background
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    pub fn set_pointer(&mut self, pointer: Vec2) {
        self.pointer = pointer;
    }

    #[inline]
    pub fn running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    #[inline]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    #[inline]
    pub fn velocities(&self) -> &[f32] {
        &self.velocities
    }

    #[inline]
    pub fn edges(&self) -> &EdgeBuffer {
        self.edges.buffer()
    }

    #[inline]
    pub fn background(&self) -> Background {
        self.background
    }

    #[inline]
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Shader uniforms for a frame drawn `elapsed_ms` after start
    pub fn uniforms(&self, elapsed_ms: f64) -> FrameUniforms {
        FrameUniforms {
            pointer: self.pointer.to_array(),
            time_ms: (elapsed_ms + self.clock_offset_ms) as f32,
            threshold: self.config.threshold,
        }
    }

    /// Data products for the rasterizer
    pub fn frame(&self, elapsed_ms: f64) -> Frame<'_> {
        Frame {
            tick: self.tick,
            positions: &self.positions,
            velocities: &self.velocities,
            edges: self.edges.buffer(),
            uniforms: self.uniforms(elapsed_ms),
            clear_color: self.background.clear_color(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pair_count;
    use crate::sim::{Dimensions, ResortPolicy};

    fn config(strategy: EdgeStrategy) -> SimConfig {
        SimConfig {
            particle_count: 40,
            speed: 0.02,
            strategy,
            seed: Some(12345),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = Session::new(SimConfig {
            particle_count: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(ConfigError::NoParticles)));
    }

    #[test]
    fn test_rejects_particle_counts_beyond_limit() {
        let full = Session::new(SimConfig {
            particle_count: 5000,
            ..Default::default()
        });
        assert!(matches!(full, Err(ConfigError::TooManyParticles { .. })));

        let huge = Session::new(SimConfig {
            particle_count: usize::MAX,
            strategy: EdgeStrategy::Grid,
            ..Default::default()
        });
        assert!(matches!(huge, Err(ConfigError::TooManyParticles { .. })));
    }

    #[test]
    fn test_large_grid_session_sizes_edges_by_output() {
        let session = Session::new(SimConfig {
            particle_count: 100_000,
            threshold: 0.01,
            strategy: EdgeStrategy::Grid,
            seed: Some(7),
            ..Default::default()
        })
        .unwrap();
        let edges = session.edges();
        assert!(edges.segment_count() < pair_count(100_000) / 1000);
        assert!(edges.positions.capacity() < pair_count(100_000) / 100);
    }

    #[test]
    fn test_default_speed_moves_visibly() {
        let mut session = Session::new(SimConfig {
            particle_count: 50,
            strategy: EdgeStrategy::BruteForce,
            seed: Some(99),
            ..Default::default()
        })
        .unwrap();
        let start = session.positions().to_vec();
        for _ in 0..crate::consts::DEFAULT_FRAMES {
            session.step();
        }
        let moved: f32 = start
            .iter()
            .zip(session.positions())
            .map(|(a, b)| (a - b).abs())
            .sum::<f32>()
            / start.len() as f32;
        assert!(moved > 0.02, "mean displacement {}", moved);
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = Session::new(config(EdgeStrategy::BruteForce)).unwrap();
        let mut b = Session::new(config(EdgeStrategy::BruteForce)).unwrap();
        for _ in 0..50 {
            a.step();
            b.step();
        }
        assert_eq!(a.positions(), b.positions());
        assert_eq!(a.edges().pairs, b.edges().pairs);
        assert_eq!(a.seed(), 12345);
    }

    #[test]
    fn test_first_frame_available_before_step() {
        let session = Session::new(config(EdgeStrategy::FullPairs)).unwrap();
        assert_eq!(session.tick(), 0);
        assert_eq!(session.positions().len(), 40 * 2);
        assert_eq!(session.velocities().len(), 40 * 2);
        assert_eq!(session.edges().segment_count(), pair_count(40));
    }

    #[test]
    fn test_full_pairs_count_every_tick() {
        let mut session = Session::new(config(EdgeStrategy::FullPairs)).unwrap();
        for _ in 0..10 {
            session.step();
            assert_eq!(session.edges().segment_count(), 40 * 39 / 2);
            assert_eq!(session.edges().positions.len(), 40 * 39 / 2 * 2 * 2);
        }
    }

    #[test]
    fn test_pause_keeps_state() {
        let mut session = Session::new(config(EdgeStrategy::BruteForce)).unwrap();
        assert!(session.update(&FrameInput::default()));
        let paused = FrameInput {
            toggle_playback: true,
            ..Default::default()
        };
        assert!(!session.update(&paused));
        assert!(!session.running());

        let positions = session.positions().to_vec();
        let tick = session.tick();
        assert!(!session.update(&FrameInput::default()));
        assert_eq!(session.positions(), positions.as_slice());
        assert_eq!(session.tick(), tick);

        // Resume continues from where it stopped
        assert!(session.update(&paused));
        assert_eq!(session.tick(), tick + 1);
        assert_ne!(session.positions(), positions.as_slice());
    }

    #[test]
    fn test_step_ignores_playback() {
        let mut session = Session::new(config(EdgeStrategy::Grid)).unwrap();
        session.set_running(false);
        session.step();
        assert_eq!(session.tick(), 1);
        assert!(!session.running());
    }

    #[test]
    fn test_positions_stay_in_domain() {
        for dimensions in [Dimensions::Two, Dimensions::Three] {
            let mut session = Session::new(SimConfig {
                particle_count: 25,
                speed: 0.3,
                dimensions,
                seed: Some(9),
                ..Default::default()
            })
            .unwrap();
            for _ in 0..500 {
                session.step();
                assert!(session.positions().iter().all(|c| (-1.0..=1.0).contains(c)));
            }
        }
    }

    #[test]
    fn test_single_particle_session() {
        let mut session = Session::new(SimConfig {
            particle_count: 1,
            speed: 0.01,
            strategy: EdgeStrategy::SortedAxes,
            seed: Some(1),
            ..Default::default()
        })
        .unwrap();
        let before = session.positions().to_vec();
        session.step();
        assert_eq!(session.edges().segment_count(), 0);
        assert_ne!(session.positions(), before.as_slice());
    }

    #[test]
    fn test_strategies_agree_over_time() {
        let mut sessions: Vec<Session> = [
            EdgeStrategy::BruteForce,
            EdgeStrategy::SortedAxes,
            EdgeStrategy::Grid,
        ]
        .into_iter()
        .map(|strategy| {
            Session::new(SimConfig {
                particle_count: 120,
                threshold: 0.2,
                resort: ResortPolicy::Incremental,
                ..config(strategy)
            })
            .unwrap()
        })
        .collect();
        for _ in 0..30 {
            for s in &mut sessions {
                s.step();
            }
            let expected = &sessions[0].edges().pairs;
            assert_eq!(&sessions[1].edges().pairs, expected);
            assert_eq!(&sessions[2].edges().pairs, expected);
        }
    }

    #[test]
    fn test_inputs_update_background_and_pointer() {
        let mut session = Session::new(config(EdgeStrategy::FullPairs)).unwrap();
        assert_eq!(session.background(), Background::Light);
        session.update(&FrameInput {
            cycle_background: true,
            pointer: Some(Vec2::new(0.25, -0.5)),
            ..Default::default()
        });
        assert_eq!(session.background(), Background::Dark);
        assert_eq!(session.pointer(), Vec2::new(0.25, -0.5));
        assert_eq!(session.frame(0.0).clear_color, [0.2, 0.2, 0.2, 1.0]);
    }

    #[test]
    fn test_uniforms_include_clock_offset() {
        let session = Session::new(config(EdgeStrategy::FullPairs))
            .unwrap()
            .with_clock_offset(clock_offset(CLOCK_WRAP_MS * 5.0 + 1500.0));
        let uniforms = session.uniforms(500.0);
        assert_eq!(uniforms.time_ms, 2000.0);
        assert_eq!(uniforms.threshold, session.config().threshold);
        assert_eq!(uniforms.pointer, session.pointer().to_array());
        assert_eq!(session.frame(500.0).uniforms, uniforms);
    }

    #[test]
    fn test_normalize_pointer() {
        let viewport = Vec2::new(800.0, 600.0);
        assert_eq!(normalize_pointer(Vec2::new(400.0, 300.0), viewport), Vec2::ZERO);
        assert_eq!(normalize_pointer(Vec2::new(0.0, 0.0), viewport), Vec2::new(-1.0, -1.0));
        assert_eq!(normalize_pointer(Vec2::new(800.0, 450.0), viewport), Vec2::new(1.0, 0.5));
        assert_eq!(normalize_pointer(Vec2::new(10.0, 10.0), Vec2::ZERO), Vec2::ZERO);
    }
}
