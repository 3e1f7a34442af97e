use sonofield_core::analysis::band_bin_ranges;
use sonofield_core::{
    FrameInput, FrequencyMapping, Pipeline, PipelineConfig, QualityLevel, SharedConfig, Vec3,
    BAND_COUNT,
};

const SAMPLE_RATE: f32 = 44_100.0;
const BINS: usize = 512;

fn sub_bass_spectrum(value: u8) -> Vec<u8> {
    let ranges = band_bin_ranges(FrequencyMapping::Logarithmic, SAMPLE_RATE, BINS);
    let mut bins = vec![0u8; BINS];
    for bin in ranges[0].clone() {
        bins[bin] = value;
    }
    bins
}

fn input(bins: &[u8]) -> FrameInput<'_> {
    FrameInput {
        magnitudes: bins,
        time_domain: &[],
        sample_rate: SAMPLE_RATE,
    }
}

#[test]
fn test_sub_bass_end_to_end() {
    let config = PipelineConfig {
        mapping: FrequencyMapping::Logarithmic,
        smoothing: 0.0,
        ..Default::default()
    };
    let mut pipeline = Pipeline::with_config(config);
    pipeline.on_play();

    let bins = sub_bass_spectrum(200);
    let first = pipeline.tick(1.0 / 60.0, Some(input(&bins))).unwrap();
    assert_eq!(first.band_energies[0], 200.0);
    assert!(first.band_energies[1..].iter().all(|&e| e == 0.0));

    let second = pipeline.tick(1.0 / 60.0, Some(input(&bins))).unwrap();
    assert_eq!(second.band_energies[0], 200.0);
    assert!(second.transients[0].abs() < 1e-6);
    assert!(second.transients[1..].iter().all(|&t| t == 0.0));
}

#[test]
fn test_step_produces_decaying_transient() {
    let config = PipelineConfig {
        smoothing: 0.0,
        ..Default::default()
    };
    let mut pipeline = Pipeline::with_config(config);
    pipeline.on_play();

    let silence = vec![0u8; BINS];
    let loud = sub_bass_spectrum(200);
    pipeline.tick(1.0 / 60.0, Some(input(&silence)));

    let attack = pipeline.tick(1.0 / 60.0, Some(input(&loud))).unwrap().transients[0];
    assert!(attack > 0.0 && attack <= 1.0);

    let mut last = attack;
    for _ in 0..60 {
        let t = pipeline.tick(1.0 / 60.0, Some(input(&loud))).unwrap().transients[0];
        assert!(t < last || t == 0.0);
        last = t;
    }
    assert!(last < 1e-3);
}

#[test]
fn test_particles_follow_their_band() {
    let config = PipelineConfig {
        smoothing: 0.0,
        envelope_gain: false,
        ..Default::default()
    };
    let mut pipeline = Pipeline::with_config(config);
    pipeline.on_play();

    let bins = sub_bass_spectrum(255);
    let frame = pipeline.tick(1.0 / 60.0, Some(input(&bins))).unwrap().clone();
    let field = pipeline.particle_field();

    for (i, &band) in field.bands().iter().enumerate() {
        let rest = field.rest_positions()[i];
        let moved = frame.particle_positions[i].distance(rest);
        if band == 0 {
            assert!(moved > 0.1, "particle {} should move", i);
        } else {
            assert!(moved < 1e-6, "particle {} should rest", i);
        }
    }
    assert_eq!(field.bands().iter().filter(|&&b| b == 0).count(), 400 / BAND_COUNT);
}

#[test]
fn test_quality_steps_down_one_level_per_second() {
    let mut pipeline = Pipeline::with_config(PipelineConfig::default());
    pipeline.on_play();
    let bins = sub_bass_spectrum(100);

    // 8 fps against a 30 fps target
    for _ in 0..8 {
        pipeline.tick(0.125, Some(input(&bins)));
    }
    assert_eq!(pipeline.quality().level(), QualityLevel::Medium);
    let frame = pipeline.last_frame();
    assert_eq!(frame.quality, QualityLevel::Medium);
    assert_eq!(frame.trails.length(), 10);
    assert_eq!(frame.active_particles, 280);

    for _ in 0..8 {
        pipeline.tick(0.125, Some(input(&bins)));
    }
    assert_eq!(pipeline.quality().level(), QualityLevel::Low);
    let frame = pipeline.last_frame();
    assert_eq!(frame.trails.length(), 5);
    assert_eq!(frame.active_particles, 160);

    // Medium runs every second frame
    assert!(pipeline.stats().skipped >= 3);
}

#[test]
fn test_skipped_frames_keep_previous_state() {
    let mut config = PipelineConfig::default();
    config.quality.adaptive = false;
    config.quality.initial_level = QualityLevel::Low;
    let mut pipeline = Pipeline::with_config(config);
    pipeline.on_play();

    let bins = sub_bass_spectrum(150);
    assert!(pipeline.tick(1.0 / 60.0, Some(input(&bins))).is_some());
    let index = pipeline.last_frame().index;

    let louder = sub_bass_spectrum(255);
    assert!(pipeline.tick(1.0 / 60.0, Some(input(&louder))).is_none());
    assert!(pipeline.tick(1.0 / 60.0, Some(input(&louder))).is_none());
    assert_eq!(pipeline.last_frame().index, index);
    assert!(pipeline.tick(1.0 / 60.0, Some(input(&louder))).is_some());
    assert_eq!(pipeline.stats().skipped, 2);
}

#[test]
fn test_envelope_advances_over_skipped_frames() {
    let mut config = PipelineConfig::default();
    config.quality.adaptive = false;
    config.quality.initial_level = QualityLevel::Low;
    let mut pipeline = Pipeline::with_config(config);
    pipeline.on_play();

    let bins = sub_bass_spectrum(10);
    pipeline.tick(0.01, Some(input(&bins)));
    pipeline.tick(0.01, Some(input(&bins)));
    pipeline.tick(0.01, Some(input(&bins)));
    pipeline.tick(0.01, Some(input(&bins)));

    // One executed frame of 0.01 s, then one covering three frames
    assert!((pipeline.envelope().elapsed() - 0.04).abs() < 1e-5);
}

#[test]
fn test_level_change_clears_trails_at_equal_length() {
    let mut config = PipelineConfig::default();
    config.quality.initial_level = QualityLevel::Medium;
    config.quality.low.trail_scale = config.quality.medium.trail_scale;
    let mut pipeline = Pipeline::with_config(config);
    pipeline.on_play();
    let bins = sub_bass_spectrum(100);

    // Medium runs ticks 1, 3, 5 and 7; tick 8 closes the fps window
    for _ in 0..7 {
        pipeline.tick(0.125, Some(input(&bins)));
    }
    assert_eq!(pipeline.last_frame().trails.length(), 10);
    assert_ne!(pipeline.last_frame().trails.trail(0).unwrap().0[1], Vec3::ZERO);

    assert!(pipeline.tick(0.125, Some(input(&bins))).is_some());
    let frame = pipeline.last_frame();
    assert_eq!(frame.quality, QualityLevel::Low);
    assert_eq!(frame.trails.length(), 10);

    let (positions, _) = frame.trails.trail(0).unwrap();
    assert_eq!(positions[0], frame.particle_positions[0]);
    assert!(positions[1..].iter().all(|p| *p == Vec3::ZERO));
}

#[test]
fn test_absurd_trail_length_does_not_panic() {
    let mut config = PipelineConfig::default();
    config.trails.length = usize::MAX;
    let mut pipeline = Pipeline::with_config(config);
    pipeline.on_play();
    let bins = sub_bass_spectrum(100);

    assert!(pipeline.tick(1.0 / 60.0, Some(input(&bins))).is_some());
    assert!(pipeline.tick(1.0 / 60.0, Some(input(&bins))).is_some());
    assert_eq!(pipeline.last_frame().trails.length(), 1);
}

#[test]
fn test_band_settings_apply_next_tick() {
    let shared = SharedConfig::new(PipelineConfig {
        smoothing: 0.0,
        ..Default::default()
    });
    let mut pipeline = Pipeline::new(shared.clone());
    pipeline.on_play();
    let bins = sub_bass_spectrum(100);

    let frame = pipeline.tick(1.0 / 60.0, Some(input(&bins))).unwrap();
    assert_eq!(frame.band_energies[0], 100.0);

    shared.update(|cfg| cfg.band_intensities[0] = 2.0);
    let frame = pipeline.tick(1.0 / 60.0, Some(input(&bins))).unwrap();
    assert_eq!(frame.band_energies[0], 200.0);

    // Linear band 0 spreads the single sub-bass bin over 32 bins
    shared.update(|cfg| {
        cfg.band_intensities[0] = 1.0;
        cfg.mapping = FrequencyMapping::Linear;
    });
    let frame = pipeline.tick(1.0 / 60.0, Some(input(&bins))).unwrap();
    assert_eq!(frame.band_energies[0], 100.0 / 32.0);
}
