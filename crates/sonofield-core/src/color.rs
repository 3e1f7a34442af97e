//! Colour helpers for the visual mapping stage.

use glam::Vec3;

/// Convert a 0xRRGGBB value into normalized RGB
pub fn rgb_from_hex(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Convert HSL (all components in [0, 1]) into RGB
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Vec3 {
    let h = hue.rem_euclid(1.0);
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    if s == 0.0 {
        return Vec3::splat(l);
    }

    let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    Vec3::new(
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

/// Gradient stops used for waveform intensity: blue, green, yellow, red
const GRADIENT_STOPS: [(f32, u32); 4] = [
    (0.0, 0x00c3ff),
    (0.33, 0x00ff99),
    (0.66, 0xfff700),
    (1.0, 0xff2a00),
];

/// Sample the intensity gradient at `intensity` (clamped to [0, 1])
pub fn gradient_color(intensity: f32) -> Vec3 {
    let intensity = if intensity.is_finite() {
        intensity.clamp(0.0, 1.0)
    } else {
        0.0
    };

    for pair in GRADIENT_STOPS.windows(2) {
        let (start, start_hex) = pair[0];
        let (end, end_hex) = pair[1];
        if intensity >= start && intensity <= end {
            let t = (intensity - start) / (end - start);
            return rgb_from_hex(start_hex).lerp(rgb_from_hex(end_hex), t);
        }
    }

    rgb_from_hex(GRADIENT_STOPS[GRADIENT_STOPS.len() - 1].1)
}
