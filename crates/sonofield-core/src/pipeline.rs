//! Frame pipeline - one `tick` per displayed frame
//!
//! Order within an executed frame: aggregation, smoothing, transient
//! detection, envelope update, visual mapping. The "previous" band state is
//! replaced only after transient detection has read it.
//!
//! The configuration is loaded once per tick from the [`SharedConfig`], so a
//! writer on another thread can never tear a frame.

use glam::Vec3;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::analysis::{
    aggregate_bands, smooth_bands, validate_sample_rate, waveform_level, TransientDetector,
    WaveformLevel,
};
use crate::bands::{band_colors, BandEnergies, Transients, BAND_COUNT};
use crate::config::{PipelineConfig, SharedConfig};
use crate::diagnostics::FrameSummary;
use crate::envelope::EnvelopeGenerator;
use crate::quality::{QualityController, QualityLevel};
use crate::spatial::SpatialGrid;
use crate::visual::{
    central_appearance, deform_mesh, map_particles, CentralObject, MaterialUpdate, ParticleField,
    SpectrumIntensity, TrailArena,
};

/// Audio data for one frame, borrowed from the host analyser
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    /// Frequency magnitudes, 0-255 per bin
    pub magnitudes: &'a [u8],
    /// Time-domain window (-1..1); may be empty
    pub time_domain: &'a [f32],
    /// Sample rate of the analysed audio in Hz
    pub sample_rate: f32,
}

/// Deformed vertex buffer of one central object
#[derive(Debug, Clone)]
pub struct CentralFrame {
    /// Object name
    pub name: &'static str,
    /// Displacement applied along the normals
    pub deformation: f32,
    /// Vertex positions
    pub positions: Vec<Vec3>,
}

/// Everything the renderer needs after an executed frame
#[derive(Debug, Clone)]
pub struct VisualFrame {
    /// Executed-frame counter, starting at 1
    pub index: u64,
    /// Smoothed band energies after per-band intensity (0-255 scale)
    pub band_energies: BandEnergies,
    /// Per-band transients (0-1)
    pub transients: Transients,
    /// Envelope value used for this frame
    pub envelope: f32,
    /// Band-group intensities the central objects were driven with
    pub intensity: SpectrumIntensity,
    /// Shared material of the central objects
    pub material: MaterialUpdate,
    /// Deformed central meshes
    pub central: Vec<CentralFrame>,
    /// Particle positions; only the first `active_particles` are current
    pub particle_positions: Vec<Vec3>,
    /// Particle colours; only the first `active_particles` are current
    pub particle_colors: Vec<Vec3>,
    /// Particles updated and drawn at the current quality level
    pub active_particles: usize,
    /// Quality level the frame was computed at
    pub quality: QualityLevel,
    /// Trail buffers
    pub trails: TrailArena,
    /// Draw trails
    pub trails_enabled: bool,
    /// Trail line opacity
    pub trail_opacity: f32,
    /// Time-domain level, when samples were supplied
    pub waveform: Option<WaveformLevel>,
}

impl VisualFrame {
    fn at_rest(objects: &[CentralObject], field: &ParticleField, config: &PipelineConfig) -> Self {
        Self {
            index: 0,
            band_energies: [0.0; BAND_COUNT],
            transients: [0.0; BAND_COUNT],
            envelope: 0.0,
            intensity: SpectrumIntensity::default(),
            material: MaterialUpdate::default(),
            central: objects
                .iter()
                .map(|object| CentralFrame {
                    name: object.name,
                    deformation: 0.0,
                    positions: object.rest.positions.clone(),
                })
                .collect(),
            particle_positions: field.rest_positions().to_vec(),
            particle_colors: vec![Vec3::ZERO; field.len()],
            active_particles: field.len(),
            quality: config.quality.initial_level,
            trails: TrailArena::new(field.len(), 0, config.trails.decay),
            trails_enabled: config.trails.enabled,
            trail_opacity: config.trails.opacity,
            waveform: None,
        }
    }
}

/// Frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Frames that ran the full pipeline
    pub executed: u64,
    /// Frames skipped by the quality divisor
    pub skipped: u64,
    /// Frames dropped for missing or invalid input
    pub missing_input: u64,
    /// Ticks received while paused
    pub paused: u64,
}

/// The audio-to-visual pipeline
pub struct Pipeline {
    config: SharedConfig,
    field: ParticleField,
    objects: Vec<CentralObject>,
    band_colors: [Vec3; BAND_COUNT],
    previous: Option<BandEnergies>,
    detector: TransientDetector,
    envelope: EnvelopeGenerator,
    quality: QualityController,
    grid: SpatialGrid,
    frame: VisualFrame,
    playing: bool,
    pending_seconds: f32,
    stats: PipelineStats,
    trails_stale: bool,
    checked_config: Option<Arc<PipelineConfig>>,
    sample_rate_warned: bool,
}

impl Pipeline {
    /// Build a pipeline. Rest geometry is computed here, once.
    pub fn new(config: SharedConfig) -> Self {
        let snapshot = config.snapshot();
        let field = ParticleField::new(&snapshot.particles);
        let objects = CentralObject::default_set();
        let frame = VisualFrame::at_rest(&objects, &field, &snapshot);

        info!(
            "Pipeline ready: {} particles, {} central objects, {} mapping",
            field.len(),
            objects.len(),
            snapshot.mapping
        );

        Self {
            field,
            objects,
            band_colors: band_colors(),
            previous: None,
            detector: TransientDetector::new(),
            envelope: EnvelopeGenerator::new(),
            quality: QualityController::new(snapshot.quality.initial_level),
            grid: SpatialGrid::new(snapshot.spatial.cell_size),
            frame,
            playing: false,
            pending_seconds: 0.0,
            stats: PipelineStats::default(),
            trails_stale: false,
            checked_config: None,
            sample_rate_warned: false,
            config,
        }
    }

    /// Pipeline over a private copy of `config`
    pub fn with_config(config: PipelineConfig) -> Self {
        Self::new(SharedConfig::new(config))
    }

    /// Playback started: trigger the envelope and start running frames
    pub fn on_play(&mut self) {
        self.playing = true;
        self.envelope.trigger();
        self.quality.reset_window();
        info!("Playback started");
    }

    /// Playback paused: release the envelope and stop running frames.
    /// The last visual frame stays as it is.
    pub fn on_pause(&mut self) {
        self.playing = false;
        self.envelope.release();
        self.pending_seconds = 0.0;
        info!("Playback paused");
    }

    /// Advance one displayed frame.
    ///
    /// Returns the new visual frame when the pipeline executed, or `None`
    /// when the frame was paused, skipped by the quality divisor or had no
    /// usable input. In every `None` case [`last_frame`](Self::last_frame)
    /// still holds the state to display.
    pub fn tick(
        &mut self,
        delta_seconds: f32,
        input: Option<FrameInput<'_>>,
    ) -> Option<&VisualFrame> {
        let config = self.config.snapshot();
        self.check_config(&config);

        if !self.playing {
            self.stats.paused += 1;
            return None;
        }

        let dt = if delta_seconds.is_finite() {
            delta_seconds.max(0.0)
        } else {
            0.0
        };
        self.pending_seconds += dt;

        if let Some(level) = self.quality.record_frame(dt, &config.quality) {
            debug!("Quality level now {}", level);
            // Trail history from the old level is dropped on the next run
            self.trails_stale = true;
        }
        if !self.quality.should_run(&config.quality) {
            self.stats.skipped += 1;
            trace!("Frame skipped at {} quality", self.quality.level());
            return None;
        }

        let Some(input) = input.filter(|input| !input.magnitudes.is_empty()) else {
            self.stats.missing_input += 1;
            trace!("No frequency data, keeping last frame");
            return None;
        };
        if let Err(e) = validate_sample_rate(input.sample_rate) {
            self.stats.missing_input += 1;
            if !self.sample_rate_warned {
                warn!("Skipping frames: {}", e);
                self.sample_rate_warned = true;
            }
            return None;
        }
        self.sample_rate_warned = false;

        let frame_seconds = std::mem::take(&mut self.pending_seconds);
        self.run(&config, input, frame_seconds);
        Some(&self.frame)
    }

    fn run(&mut self, config: &PipelineConfig, input: FrameInput<'_>, frame_seconds: f32) {
        // Analysis
        let raw = aggregate_bands(
            input.magnitudes,
            input.sample_rate,
            config.mapping,
            &config.band_intensities,
        );
        let smoothed = smooth_bands(
            &raw,
            &self.previous.unwrap_or([0.0; BAND_COUNT]),
            config.smoothing,
        );
        // The first frame has no history, so it is its own reference
        let reference = self.previous.unwrap_or(smoothed);
        let transients = self.detector.detect(&smoothed, &reference, &config.transient);
        self.previous = Some(smoothed);

        let envelope = self.envelope.update(frame_seconds, &config.envelope);
        let gain = if config.envelope_gain { envelope } else { 1.0 };
        let driven: BandEnergies = smoothed.map(|band| band * gain);

        // Central objects
        let intensity = SpectrumIntensity::from_bands(&driven);
        for (object, out) in self.objects.iter().zip(self.frame.central.iter_mut()) {
            out.deformation = intensity.deformation(&object.drive);
            deform_mesh(&object.rest, out.deformation, &mut out.positions);
        }
        self.frame.material = central_appearance(&intensity, &config.central_mapping);

        // Particles
        let quality = self.quality.settings(&config.quality);
        let active = quality.active_particles(self.field.len());
        map_particles(
            &self.field,
            &driven,
            &transients,
            &self.band_colors,
            &config.particle_mapping,
            active,
            &mut self.frame.particle_positions,
            &mut self.frame.particle_colors,
        );

        // Trails
        let trail_length = quality.trail_length(config.trails.length);
        if std::mem::take(&mut self.trails_stale) {
            self.frame.trails =
                TrailArena::new(self.field.len(), trail_length, config.trails.decay);
        } else {
            self.frame.trails.resize(self.field.len(), trail_length, config.trails.decay);
        }
        if config.trails.enabled {
            self.frame.trails.push_frame(
                &self.frame.particle_positions,
                &self.frame.particle_colors,
                active,
            );
        }

        if config.spatial.enabled {
            self.grid.rebuild(&self.frame.particle_positions[..active], config.spatial.cell_size);
        }

        self.stats.executed += 1;
        self.frame.index = self.stats.executed;
        self.frame.band_energies = smoothed;
        self.frame.transients = transients;
        self.frame.envelope = envelope;
        self.frame.intensity = intensity;
        self.frame.active_particles = active;
        self.frame.quality = self.quality.level();
        self.frame.trails_enabled = config.trails.enabled;
        self.frame.trail_opacity = config.trails.opacity;
        self.frame.waveform = waveform_level(input.time_domain);

        if config.debug_analysis {
            FrameSummary::from_frame(&self.frame).log();
        }
        trace!(
            "Frame {}: envelope {:.3}, {} active particles",
            self.frame.index,
            envelope,
            active
        );
    }

    /// Warn once per configuration snapshot about out-of-range tunables
    fn check_config(&mut self, config: &Arc<PipelineConfig>) {
        if self
            .checked_config
            .as_ref()
            .is_some_and(|checked| Arc::ptr_eq(checked, config))
        {
            return;
        }
        debug!("Configuration snapshot changed");
        for issue in config.issues() {
            warn!("Config: {}", issue);
        }
        self.checked_config = Some(Arc::clone(config));
    }

    /// Most recent visual state; before the first executed frame this is
    /// the rest pose
    pub fn last_frame(&self) -> &VisualFrame {
        &self.frame
    }

    /// Shared configuration handle
    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// True between `on_play` and `on_pause`
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Envelope generator
    pub fn envelope(&self) -> &EnvelopeGenerator {
        &self.envelope
    }

    /// Quality controller
    pub fn quality(&self) -> &QualityController {
        &self.quality
    }

    /// Frame counters
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Spatial index over the active particles of the last executed frame
    pub fn spatial(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Particle rest layout
    pub fn particle_field(&self) -> &ParticleField {
        &self.field
    }

    /// Central objects with their rest meshes
    pub fn central_objects(&self) -> &[CentralObject] {
        &self.objects
    }

    /// Clear analysis history (smoothing and transient state)
    pub fn reset_analysis(&mut self) {
        self.previous = None;
        self.detector.reset();
        self.frame.trails.reset();
        debug!("Analysis state reset");
    }
}
