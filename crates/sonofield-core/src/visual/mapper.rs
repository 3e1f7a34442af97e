//! Visual mapping - band energies to mesh, material and particle buffers
//!
//! Every function here is pure: rest data and band values in, output
//! buffers written in place. Band values are on the 0-255 byte scale.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::mesh::{DeformationDrive, RestMesh};
use super::particles::ParticleField;
use crate::bands::{BandEnergies, Transients, BAND_COUNT};
use crate::color::hsl_to_rgb;

/// Full-scale band value
const BYTE_SCALE: f32 = 255.0;

/// Normalised band-group intensities that drive the central objects
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SpectrumIntensity {
    /// Mean of bands 0 and 1, normalised
    pub low: f32,
    /// Mean of bands 4 and 5, normalised
    pub mid: f32,
    /// Mean of bands 8 and 9, normalised
    pub high: f32,
}

impl SpectrumIntensity {
    /// Derive the group intensities from (gain-scaled) band values
    pub fn from_bands(bands: &BandEnergies) -> Self {
        let pair = |a: usize, b: usize| sanitize((bands[a] + bands[b]) / (2.0 * BYTE_SCALE));
        Self {
            low: pair(0, 1),
            mid: pair(4, 5),
            high: pair(8, 9),
        }
    }

    /// Largest of the three groups
    pub fn peak(&self) -> f32 {
        self.low.max(self.mid).max(self.high)
    }

    /// Outward displacement for a mesh with the given drive
    pub fn deformation(&self, drive: &DeformationDrive) -> f32 {
        self.low * drive.low + self.mid * drive.mid + self.high * drive.high
    }
}

/// Material values shared by the central objects
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MaterialUpdate {
    /// Base colour (linear RGB, 0-1)
    pub color: Vec3,
    /// Emissive colour
    pub emissive: Vec3,
    /// Intensity the colours were derived from
    pub intensity: f32,
}

/// Gains for the central-object mapping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CentralMappingSettings {
    /// Hue at zero intensity (blue)
    pub base_hue: f32,
    /// Hue shift toward red at full intensity
    pub hue_shift: f32,
    /// HSL saturation
    pub saturation: f32,
    /// HSL lightness
    pub lightness: f32,
    /// Emissive multiplier on `colour * intensity`
    pub emissive_gain: f32,
}

impl Default for CentralMappingSettings {
    fn default() -> Self {
        Self {
            base_hue: 0.6,
            hue_shift: 0.4,
            saturation: 0.8,
            lightness: 0.6,
            emissive_gain: 0.5,
        }
    }
}

/// Gains for the particle mapping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleMappingSettings {
    /// Displacement per unit amplitude with no transient
    pub base_displacement: f32,
    /// Extra displacement per unit amplitude at a full transient
    pub transient_boost: f32,
    /// Colour brightness floor
    pub base_brightness: f32,
    /// Brightness added at full amplitude
    pub amplitude_brightness: f32,
    /// Brightness added at a full transient
    pub transient_brightness: f32,
}

impl Default for ParticleMappingSettings {
    fn default() -> Self {
        Self {
            base_displacement: 0.2,
            transient_boost: 0.3,
            base_brightness: 0.3,
            amplitude_brightness: 0.7,
            transient_brightness: 0.3,
        }
    }
}

fn sanitize(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// Push every rest vertex out along its normal by `displacement`.
///
/// `out` is resized to the vertex count of `rest`.
pub fn deform_mesh(rest: &RestMesh, displacement: f32, out: &mut Vec<Vec3>) {
    let displacement = if displacement.is_finite() {
        displacement
    } else {
        0.0
    };
    out.clear();
    out.extend(
        rest.positions
            .iter()
            .zip(&rest.normals)
            .map(|(p, n)| *p + *n * displacement),
    );
}

/// Blue-to-red material for the central objects
pub fn central_appearance(
    intensity: &SpectrumIntensity,
    settings: &CentralMappingSettings,
) -> MaterialUpdate {
    let peak = intensity.peak();
    let color = hsl_to_rgb(
        settings.base_hue - peak * settings.hue_shift,
        settings.saturation,
        settings.lightness,
    );
    MaterialUpdate {
        color,
        emissive: color * peak * settings.emissive_gain,
        intensity: peak,
    }
}

/// Write positions and colours of the first `active` particles.
///
/// Particles past `active` keep whatever the output buffers held. Both output
/// buffers are grown to the field size when shorter.
#[allow(clippy::too_many_arguments)]
pub fn map_particles(
    field: &ParticleField,
    bands: &BandEnergies,
    transients: &Transients,
    band_colors: &[Vec3; BAND_COUNT],
    settings: &ParticleMappingSettings,
    active: usize,
    out_positions: &mut Vec<Vec3>,
    out_colors: &mut Vec<Vec3>,
) {
    let count = field.len();
    if out_positions.len() < count {
        out_positions.resize(count, Vec3::ZERO);
    }
    if out_colors.len() < count {
        out_colors.resize(count, Vec3::ZERO);
    }

    let active = active.min(count);
    let rest = &field.rest_positions()[..active];
    let directions = &field.directions()[..active];
    let assigned = &field.bands()[..active];

    for (i, ((p, dir), &band)) in rest.iter().zip(directions).zip(assigned).enumerate() {
        let amplitude = sanitize(bands[band] / BYTE_SCALE);
        let transient = sanitize(transients[band]);

        let displacement =
            amplitude * (settings.base_displacement + transient * settings.transient_boost);
        out_positions[i] = *p + *dir * displacement;

        let brightness = settings.base_brightness
            + amplitude * settings.amplitude_brightness
            + transient * settings.transient_brightness;
        out_colors[i] = band_colors[band] * brightness;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::band_colors;
    use crate::visual::mesh::CentralObject;

    fn bands_with(pairs: &[(usize, f32)]) -> BandEnergies {
        let mut bands = [0.0; BAND_COUNT];
        for &(i, v) in pairs {
            bands[i] = v;
        }
        bands
    }

    #[test]
    fn test_spectrum_intensity_groups() {
        let bands = bands_with(&[(0, 255.0), (1, 255.0), (4, 127.5), (5, 127.5), (9, 51.0)]);
        let intensity = SpectrumIntensity::from_bands(&bands);
        assert!((intensity.low - 1.0).abs() < 1e-6);
        assert!((intensity.mid - 0.5).abs() < 1e-6);
        assert!((intensity.high - 0.1).abs() < 1e-6);
        assert_eq!(intensity.peak(), intensity.low);
    }

    #[test]
    fn test_spectrum_intensity_rejects_nan() {
        let bands = bands_with(&[(0, f32::NAN)]);
        let intensity = SpectrumIntensity::from_bands(&bands);
        assert_eq!(intensity.low, 0.0);
    }

    #[test]
    fn test_cube_deformation_weights() {
        let cube = CentralObject::cube();
        let intensity = SpectrumIntensity {
            low: 1.0,
            mid: 1.0,
            high: 1.0,
        };
        assert!((intensity.deformation(&cube.drive) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_deform_mesh_along_normals() {
        let cube = CentralObject::cube();
        let mut out = Vec::new();
        deform_mesh(&cube.rest, 0.25, &mut out);
        assert_eq!(out.len(), cube.rest.vertex_count());
        for ((p, rest), n) in out.iter().zip(&cube.rest.positions).zip(&cube.rest.normals) {
            assert!(((*p - *rest).dot(*n) - 0.25).abs() < 1e-6);
        }

        deform_mesh(&cube.rest, 0.0, &mut out);
        assert_eq!(out, cube.rest.positions);
    }

    #[test]
    fn test_central_appearance_hue_shift() {
        let settings = CentralMappingSettings::default();

        let quiet = central_appearance(&SpectrumIntensity::default(), &settings);
        assert_eq!(quiet.emissive, Vec3::ZERO);
        // Hue 0.6 is blue-dominant
        assert!(quiet.color.z > quiet.color.x);

        let loud = central_appearance(
            &SpectrumIntensity {
                low: 1.0,
                mid: 0.0,
                high: 0.0,
            },
            &settings,
        );
        // Hue 0.2 leans toward red/yellow
        assert!(loud.color.x > loud.color.z);
        assert!((loud.emissive - loud.color * 0.5).length() < 1e-6);
    }

    #[test]
    fn test_map_particles_displacement_and_color() {
        let field = ParticleField::from_rest_positions(vec![Vec3::X * 2.0; 16]);
        let colors = band_colors();
        let settings = ParticleMappingSettings::default();
        let bands = bands_with(&[(3, 255.0)]);
        let mut transients = [0.0; BAND_COUNT];
        transients[3] = 1.0;

        let mut positions = Vec::new();
        let mut out_colors = Vec::new();
        map_particles(
            &field,
            &bands,
            &transients,
            &colors,
            &settings,
            16,
            &mut positions,
            &mut out_colors,
        );

        // Silent band: rest position, colour at the brightness floor
        assert_eq!(positions[0], Vec3::X * 2.0);
        assert!((out_colors[0] - colors[0] * 0.3).length() < 1e-6);

        // Full band with full transient: 0.2 + 0.3 displacement, 1.3 brightness
        assert!((positions[3] - Vec3::X * 2.5).length() < 1e-6);
        assert!((out_colors[3] - colors[3] * 1.3).length() < 1e-5);
    }

    #[test]
    fn test_map_particles_respects_active_count() {
        let field = ParticleField::from_rest_positions(vec![Vec3::Y; 4]);
        let bands = [255.0; BAND_COUNT];
        let transients = [0.0; BAND_COUNT];
        let mut positions = vec![Vec3::ZERO; 4];
        let mut colors = vec![Vec3::ZERO; 4];
        map_particles(
            &field,
            &bands,
            &transients,
            &band_colors(),
            &ParticleMappingSettings::default(),
            2,
            &mut positions,
            &mut colors,
        );
        assert_ne!(positions[1], Vec3::ZERO);
        assert_eq!(positions[2], Vec3::ZERO);
        assert_eq!(colors[3], Vec3::ZERO);
    }
}
