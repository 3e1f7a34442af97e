use proptest::prelude::*;
use sonofield_core::analysis::band_bin_ranges;
use sonofield_core::bands::default_intensities;
use sonofield_core::{
    aggregate_bands, hz_to_mel, mel_band_edges, mel_to_hz, smooth_bands, FrequencyMapping,
    TransientDetector, TransientSettings, BAND_COUNT,
};

#[test]
fn test_mel_edges_round_trip() {
    for edge in mel_band_edges() {
        let back = hz_to_mel(mel_to_hz(hz_to_mel(edge)));
        assert!((back - hz_to_mel(edge)).abs() < 1e-2, "edge {}", edge);
        assert!((mel_to_hz(hz_to_mel(edge)) - edge).abs() / edge < 1e-4);
    }
}

#[test]
fn test_band_equals_mean_of_its_range() {
    for mapping in FrequencyMapping::ALL {
        let ranges = band_bin_ranges(mapping, 48_000.0, 1024);
        let mut bins = vec![0u8; 1024];
        for (i, range) in ranges.iter().enumerate() {
            for bin in range.clone() {
                bins[bin] = (i * 10 + 5) as u8;
            }
        }

        let bands = aggregate_bands(&bins, 48_000.0, mapping, &default_intensities());
        for (i, range) in ranges.iter().enumerate() {
            let expected = if range.is_empty() {
                0.0
            } else {
                (i * 10 + 5) as f32
            };
            assert_eq!(bands[i], expected, "{} band {}", mapping, i);
        }
    }
}

#[test]
fn test_smoothing_properties() {
    let current: [f32; BAND_COUNT] = std::array::from_fn(|i| i as f32 * 3.0);
    let previous: [f32; BAND_COUNT] = std::array::from_fn(|i| 100.0 - i as f32);

    assert_eq!(smooth_bands(&current, &previous, 0.0), current);
    assert_eq!(smooth_bands(&current, &previous, 1.0), previous);
    let settled = smooth_bands(&current, &current, 0.4);
    for (a, b) in settled.iter().zip(&current) {
        assert!((a - b).abs() < 1e-4);
    }
}

#[test]
fn test_transient_converges_after_step() {
    let settings = TransientSettings::default();
    let mut detector = TransientDetector::new();
    let quiet = [0.0; BAND_COUNT];
    let mut step = [0.0; BAND_COUNT];
    step[5] = 0.05;

    let first = detector.detect(&step, &quiet, &settings)[5];
    assert!(first > 0.0 && first < 1.0);

    let mut last = first;
    let mut frames = 0;
    while last > 1e-4 {
        let next = detector.detect(&step, &step, &settings)[5];
        assert!(next < last);
        last = next;
        frames += 1;
        assert!(frames < 100);
    }
}

proptest! {
    #[test]
    fn prop_aggregate_is_finite_and_non_negative(
        bins in prop::collection::vec(any::<u8>(), 0..2048),
        sample_rate in prop_oneof![Just(0.0f32), 8_000.0f32..192_000.0],
        mapping in prop::sample::select(FrequencyMapping::ALL.to_vec()),
        intensity in 0.0f32..2.0,
    ) {
        let bands = aggregate_bands(&bins, sample_rate, mapping, &[intensity; BAND_COUNT]);
        prop_assert_eq!(bands.len(), BAND_COUNT);
        for band in bands {
            prop_assert!(band.is_finite());
            prop_assert!(band >= 0.0);
            prop_assert!(band <= 255.0 * 2.0);
        }
    }

    #[test]
    fn prop_smoothing_stays_between_inputs(
        current in prop::array::uniform16(0.0f32..255.0),
        previous in prop::array::uniform16(0.0f32..255.0),
        k in 0.0f32..=1.0,
    ) {
        let smoothed = smooth_bands(&current, &previous, k);
        for i in 0..BAND_COUNT {
            let lo = current[i].min(previous[i]) - 1e-3;
            let hi = current[i].max(previous[i]) + 1e-3;
            prop_assert!(smoothed[i] >= lo && smoothed[i] <= hi);
        }
    }
}
