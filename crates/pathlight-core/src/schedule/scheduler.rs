use crate::film::{AccumulationPair, FilmBuffer};
use crate::sampling::SampleGrid;
use crate::session::{ProgressiveSession, SessionConfig};
use crate::uniforms::{RenderUniforms, SamplingUniforms};

use super::event::ViewEvent;

/// Scheduler control state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SchedulerPhase {
    /// No submission pending or in flight.
    Idle,
    /// Exactly one submission runs, then back to `Idle`.
    SingleShot,
    /// Each completed submission schedules the next.
    Progressive,
}

/// Which device resources changed since the last completed submission.
///
/// The sampling block is not tracked here: its frame counter changes every
/// cycle, so the host re-uploads it unconditionally per submission.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DirtyUniforms {
    pub render: bool,
    pub jitter: bool,
}

impl DirtyUniforms {
    fn all() -> Self {
        Self {
            render: true,
            jitter: true,
        }
    }
}

/// The uniform values in effect when a submission was issued.
///
/// Events arriving after the snapshot is taken apply to the next cycle only;
/// a snapshot is never rewritten mid-flight.
#[derive(Debug)]
pub struct FrameSnapshot<'a> {
    pub render: RenderUniforms,
    pub sampling: SamplingUniforms,
    pub jitter: &'a [[f32; 2]],
    pub dirty: DirtyUniforms,
}

/// What `run_frame` did with the tick.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    /// A submission was issued and the accumulation cycle completed.
    Rendered,
    /// Nothing was pending; the tick was a no-op.
    Skipped,
}

/// Event-driven control loop for progressive rendering.
///
/// Owns the session, the jitter grid, and the accumulation film pair. The
/// host feeds input through [`apply`], arms its "run on next frame"
/// primitive whenever [`wants_frame`] holds, and drives one cycle per tick
/// through [`run_frame`]. All mutation happens on the host's cooperative
/// thread; nothing here blocks or locks.
///
/// [`apply`]: RenderScheduler::apply
/// [`wants_frame`]: RenderScheduler::wants_frame
/// [`run_frame`]: RenderScheduler::run_frame
#[derive(Debug)]
pub struct RenderScheduler<B> {
    session: ProgressiveSession,
    grid: SampleGrid,
    films: AccumulationPair<B>,
    pixel_size: f32,
    phase: SchedulerPhase,
    frame_pending: bool,
    dirty: DirtyUniforms,
}

impl<B: FilmBuffer> RenderScheduler<B> {
    /// Creates a scheduler with one frame already pending, so the first tick
    /// renders the initial state.
    pub fn new(config: SessionConfig, films: AccumulationPair<B>) -> Self {
        let pixel_size = 1.0 / films.extent().height.max(1) as f32;
        let session = ProgressiveSession::new(config);
        let grid = SampleGrid::generate(pixel_size, session.subdivisions());

        Self {
            session,
            grid,
            films,
            pixel_size,
            phase: SchedulerPhase::Idle,
            frame_pending: true,
            dirty: DirtyUniforms::all(),
        }
    }

    pub fn session(&self) -> &ProgressiveSession {
        &self.session
    }

    pub fn sample_grid(&self) -> &SampleGrid {
        &self.grid
    }

    pub fn films(&self) -> &AccumulationPair<B> {
        &self.films
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    /// True when the host should arm its next-frame primitive.
    ///
    /// Several events between ticks coalesce into a single pending frame;
    /// there is never more than one submission per tick.
    pub fn wants_frame(&self) -> bool {
        self.frame_pending
    }

    /// Reconciles one external event with the session and schedule.
    pub fn apply(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Zoom { delta } => {
                self.session.zoom(delta);
                self.dirty.render = true;
                self.invalidate();
            }

            ViewEvent::SetShaderMode(mode) => {
                self.session.set_shader_mode(mode);
                self.dirty.render = true;
                self.invalidate();
            }

            ViewEvent::SetAddressMode(mode) => {
                self.session.set_address_mode(mode);
                self.invalidate();
            }

            ViewEvent::SetFilterMode(mode) => {
                self.session.set_filter_mode(mode);
                self.invalidate();
            }

            ViewEvent::IncreaseSubdivisions => {
                self.session.increment_subdivisions();
                self.regenerate_jitter();
                self.invalidate();
            }

            ViewEvent::DecreaseSubdivisions => {
                self.session.decrement_subdivisions();
                self.regenerate_jitter();
                self.invalidate();
            }

            ViewEvent::ToggleProgressive => {
                let enabled = self.session.toggle_progressive();
                log::debug!("progressive refinement {}", if enabled { "on" } else { "off" });
                // Accumulation pauses/resumes in place; no reset. Toggling on
                // still needs one frame request to restart the cycle.
                if enabled {
                    self.frame_pending = true;
                }
            }
        }
    }

    /// Replaces the film pair after a surface resize.
    ///
    /// Both films change together (the pair was validated on construction);
    /// jitter is regenerated for the new pixel size and accumulation
    /// restarts.
    pub fn resize(&mut self, films: AccumulationPair<B>, aspect: f32) {
        self.pixel_size = 1.0 / films.extent().height.max(1) as f32;
        self.films = films;
        self.session.set_aspect(aspect);
        self.grid = SampleGrid::generate(self.pixel_size, self.session.subdivisions());
        self.dirty = DirtyUniforms::all();
        self.session.reset_accumulation();
        self.frame_pending = true;
    }

    /// Runs one tick: issues at most one submission.
    ///
    /// If a frame is pending, the current uniform state is snapshotted and
    /// one accumulation cycle runs through the film pair (`render` into the
    /// source reading the destination, then `copy` source → destination).
    /// On success the frame counter advances by exactly one and the next
    /// frame is self-scheduled iff progressive mode is enabled. On a render
    /// failure everything — counter, dirty flags, pending request — is left
    /// as it was, so the next tick retries the same snapshot.
    pub fn run_frame<C, E>(
        &mut self,
        ctx: &mut C,
        render: impl FnOnce(&mut C, &FrameSnapshot<'_>, &mut B, &B) -> Result<(), E>,
        copy: impl FnOnce(&mut C, &B, &mut B),
    ) -> Result<FrameOutcome, E> {
        if !self.frame_pending {
            return Ok(FrameOutcome::Skipped);
        }

        self.phase = if self.session.progressive() {
            SchedulerPhase::Progressive
        } else {
            SchedulerPhase::SingleShot
        };

        let snapshot = FrameSnapshot {
            render: self.session.render_uniforms(),
            sampling: self.session.sampling_uniforms(),
            jitter: self.grid.offsets(),
            dirty: self.dirty,
        };

        self.films
            .advance(ctx, |ctx, src, dst| render(ctx, &snapshot, src, dst), copy)?;

        self.dirty = DirtyUniforms::default();
        self.session.advance_frame();

        if self.session.progressive() {
            self.frame_pending = true;
        } else {
            self.frame_pending = false;
            self.phase = SchedulerPhase::Idle;
        }

        Ok(FrameOutcome::Rendered)
    }

    fn invalidate(&mut self) {
        self.session.reset_accumulation();
        self.frame_pending = true;
    }

    fn regenerate_jitter(&mut self) {
        self.grid = SampleGrid::generate(self.pixel_size, self.session.subdivisions());
        self.dirty.jitter = true;
        log::debug!(
            "jitter regenerated: {} samples at subdivisions {}",
            self.grid.sample_count(),
            self.grid.subdivisions()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::film::{Extent, FilmError};
    use crate::uniforms::ShaderMode;

    #[derive(Debug)]
    struct CpuFilm {
        extent: Extent,
        pixels: Vec<f32>,
    }

    impl CpuFilm {
        fn new(width: u32, height: u32) -> Self {
            Self {
                extent: Extent::new(width, height),
                pixels: vec![0.0; (width * height) as usize],
            }
        }
    }

    impl FilmBuffer for CpuFilm {
        fn extent(&self) -> Extent {
            self.extent
        }
    }

    fn scheduler(config: SessionConfig) -> RenderScheduler<CpuFilm> {
        let films = AccumulationPair::new(CpuFilm::new(8, 8), CpuFilm::new(8, 8)).unwrap();
        RenderScheduler::new(config, films)
    }

    /// Drives one tick with a stub render that stamps the snapshot frame
    /// into every pixel; returns the snapshot frame counter.
    fn tick(s: &mut RenderScheduler<CpuFilm>) -> Option<u32> {
        let mut seen = None;
        let outcome = s
            .run_frame::<_, ()>(
                &mut seen,
                |seen, snapshot, src, _dst| {
                    *seen = Some(snapshot.sampling.frame);
                    for p in src.pixels.iter_mut() {
                        *p = snapshot.sampling.frame as f32;
                    }
                    Ok(())
                },
                |_, src, dst| dst.pixels.copy_from_slice(&src.pixels),
            )
            .unwrap();

        match outcome {
            FrameOutcome::Rendered => seen,
            FrameOutcome::Skipped => None,
        }
    }

    // ── scheduling ────────────────────────────────────────────────────────

    #[test]
    fn initial_frame_is_pending() {
        let s = scheduler(SessionConfig::default());
        assert!(s.wants_frame());
        assert_eq!(s.phase(), SchedulerPhase::Idle);
    }

    #[test]
    fn single_shot_returns_to_idle() {
        let mut s = scheduler(SessionConfig {
            progressive: false,
            ..Default::default()
        });

        assert_eq!(tick(&mut s), Some(0));
        assert_eq!(s.phase(), SchedulerPhase::Idle);
        assert!(!s.wants_frame());
        assert_eq!(tick(&mut s), None);
    }

    #[test]
    fn progressive_self_schedules_with_monotonic_frames() {
        let mut s = scheduler(SessionConfig::default());

        for expected in 0..6 {
            assert!(s.wants_frame());
            assert_eq!(tick(&mut s), Some(expected));
            assert_eq!(s.phase(), SchedulerPhase::Progressive);
        }
        assert_eq!(s.session().frame(), 6);
    }

    #[test]
    fn toggle_off_lets_pending_frame_complete_then_stops() {
        let mut s = scheduler(SessionConfig::default());
        tick(&mut s);
        tick(&mut s);

        s.apply(ViewEvent::ToggleProgressive);
        assert!(s.wants_frame(), "in-flight request completes");
        assert_eq!(tick(&mut s), Some(2));

        assert!(!s.wants_frame());
        assert_eq!(tick(&mut s), None);
        assert_eq!(s.phase(), SchedulerPhase::Idle);
    }

    #[test]
    fn toggle_preserves_counter_across_pause_and_resume() {
        let mut s = scheduler(SessionConfig::default());
        for _ in 0..5 {
            tick(&mut s);
        }

        s.apply(ViewEvent::ToggleProgressive); // pause
        tick(&mut s); // frame 5 drains
        assert_eq!(tick(&mut s), None);

        s.apply(ViewEvent::ToggleProgressive); // resume
        assert!(s.wants_frame());
        assert_eq!(tick(&mut s), Some(6), "no reset on resume");
    }

    // ── reconciliation ────────────────────────────────────────────────────

    #[test]
    fn resetting_event_zeroes_counter_and_requests_one_frame() {
        let mut s = scheduler(SessionConfig {
            progressive: false,
            ..Default::default()
        });
        tick(&mut s);
        assert!(!s.wants_frame());

        s.apply(ViewEvent::SetShaderMode(ShaderMode::Mirror));
        assert!(s.wants_frame());
        assert_eq!(tick(&mut s), Some(0));
        assert_eq!(tick(&mut s), None, "exactly one submission");
    }

    #[test]
    fn events_coalesce_into_one_submission_per_tick() {
        let mut s = scheduler(SessionConfig {
            progressive: false,
            ..Default::default()
        });
        tick(&mut s);

        // Two menu changes before the next frame completes: both mutations
        // apply, one submission runs.
        s.apply(ViewEvent::SetShaderMode(ShaderMode::Phong));
        s.apply(ViewEvent::Zoom { delta: 100.0 });

        let mut submissions = 0;
        while tick(&mut s).is_some() {
            submissions += 1;
        }
        assert_eq!(submissions, 1);
        assert_eq!(s.session().shader_mode(), ShaderMode::Phong);
        assert!((s.session().cam_const() - 1.025).abs() < 1e-6);
    }

    #[test]
    fn zoom_value_is_visible_in_that_submissions_snapshot() {
        let mut s = scheduler(SessionConfig::default());
        tick(&mut s);

        s.apply(ViewEvent::Zoom { delta: 100.0 });

        let mut seen_cam = 0.0f32;
        s.run_frame::<_, ()>(
            &mut seen_cam,
            |seen, snapshot, _src, _dst| {
                *seen = snapshot.render.cam_const;
                Ok(())
            },
            |_, _, _| {},
        )
        .unwrap();

        assert!((seen_cam - 1.025).abs() < 1e-6);
    }

    #[test]
    fn subdivision_change_mid_run_resets_and_regrows_grid() {
        let mut s = scheduler(SessionConfig {
            subdivisions: 3,
            ..Default::default()
        });
        assert_eq!(s.sample_grid().sample_count(), 9);

        // Run progressive refinement out to frame 42.
        for _ in 0..42 {
            tick(&mut s);
        }
        assert_eq!(s.session().frame(), 42);

        s.apply(ViewEvent::IncreaseSubdivisions);
        assert_eq!(s.sample_grid().sample_count(), 16);
        assert_eq!(tick(&mut s), Some(0), "counter restarts at 0");
        assert!(s.wants_frame(), "progressive scheduling continues");
    }

    #[test]
    fn jitter_dirty_only_after_regeneration() {
        let mut s = scheduler(SessionConfig::default());
        tick(&mut s); // initial dirty flags consumed

        s.apply(ViewEvent::Zoom { delta: 10.0 });
        let mut dirty = DirtyUniforms::default();
        s.run_frame::<_, ()>(
            &mut dirty,
            |dirty, snapshot, _src, _dst| {
                *dirty = snapshot.dirty;
                Ok(())
            },
            |_, _, _| {},
        )
        .unwrap();
        assert!(dirty.render);
        assert!(!dirty.jitter);

        s.apply(ViewEvent::IncreaseSubdivisions);
        s.run_frame::<_, ()>(
            &mut dirty,
            |dirty, snapshot, _src, _dst| {
                *dirty = snapshot.dirty;
                Ok(())
            },
            |_, _, _| {},
        )
        .unwrap();
        assert!(dirty.jitter);
    }

    // ── failure handling ──────────────────────────────────────────────────

    #[test]
    fn failed_render_retries_same_snapshot() {
        let mut s = scheduler(SessionConfig::default());
        tick(&mut s);
        tick(&mut s);

        let result = s.run_frame(
            &mut (),
            |_, _snapshot, _src, _dst| Err("device lost"),
            |_, _, _| {},
        );
        assert_eq!(result, Err("device lost"));

        // Counter untouched, request still pending; next tick re-issues the
        // same frame index.
        assert!(s.wants_frame());
        assert_eq!(s.session().frame(), 2);
        assert_eq!(tick(&mut s), Some(2));
        assert_eq!(tick(&mut s), Some(3));
    }

    // ── resize ────────────────────────────────────────────────────────────

    #[test]
    fn resize_swaps_films_and_restarts_accumulation() {
        let mut s = scheduler(SessionConfig {
            subdivisions: 2,
            ..Default::default()
        });
        for _ in 0..3 {
            tick(&mut s);
        }

        let films =
            AccumulationPair::new(CpuFilm::new(16, 16), CpuFilm::new(16, 16)).unwrap();
        s.resize(films, 16.0 / 16.0);

        assert_eq!(s.films().extent(), Extent::new(16, 16));
        assert!((s.sample_grid().pixel_size() - 1.0 / 16.0).abs() < 1e-9);
        assert_eq!(tick(&mut s), Some(0));
    }

    #[test]
    fn mismatched_resize_pair_never_reaches_the_scheduler() {
        let err = AccumulationPair::new(CpuFilm::new(16, 16), CpuFilm::new(16, 8));
        assert!(matches!(err, Err(FilmError::ExtentMismatch { .. })));
    }
}
