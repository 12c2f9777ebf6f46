use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Wavelength → RGB
// ---------------------------------------------------------------------------

const GAMMA: f64 = 0.80;

/// Approximate display colour of monochromatic light.
///
/// Returns `[r, g, b]`, each in `0..=max_intensity`. Wavelengths outside the
/// visible 380–780 nm range map to black, and intensity falls off towards
/// both ends of the range.
pub fn wavelength_to_rgb(wavelength: f64, max_intensity: u32) -> [u32; 3] {
    let w = wavelength;
    let (red, green, blue) = if (380.0..440.0).contains(&w) {
        (-(w - 440.0) / (440.0 - 380.0), 0.0, 1.0)
    } else if (440.0..490.0).contains(&w) {
        (0.0, (w - 440.0) / (490.0 - 440.0), 1.0)
    } else if (490.0..510.0).contains(&w) {
        (0.0, 1.0, -(w - 510.0) / (510.0 - 490.0))
    } else if (510.0..580.0).contains(&w) {
        ((w - 510.0) / (580.0 - 510.0), 1.0, 0.0)
    } else if (580.0..645.0).contains(&w) {
        (1.0, -(w - 645.0) / (645.0 - 580.0), 0.0)
    } else if (645.0..=780.0).contains(&w) {
        (1.0, 0.0, 0.0)
    } else {
        (0.0, 0.0, 0.0)
    };

    let factor = falloff(w);
    [
        adjust_and_scale(red, factor, max_intensity),
        adjust_and_scale(green, factor, max_intensity),
        adjust_and_scale(blue, factor, max_intensity),
    ]
}

/// Intensity factor near the limits of vision.
fn falloff(w: f64) -> f64 {
    if (380.0..420.0).contains(&w) {
        0.3 + 0.7 * (w - 380.0) / (420.0 - 380.0)
    } else if (420.0..701.0).contains(&w) {
        1.0
    } else if (701.0..=780.0).contains(&w) {
        0.3 + 0.7 * (780.0 - w) / (780.0 - 700.0)
    } else {
        0.0
    }
}

fn adjust_and_scale(component: f64, factor: f64, highest: u32) -> u32 {
    if component == 0.0 {
        return 0;
    }
    let scaled = ((component * factor).powf(GAMMA) * f64::from(highest)).round_ties_even();
    scaled.clamp(0.0, f64::from(highest)) as u32
}

/// [`wavelength_to_rgb`] at full 8-bit range, as an egui colour.
pub fn wavelength_color(wavelength: f64) -> Color32 {
    let [r, g, b] = wavelength_to_rgb(wavelength, 255);
    Color32::from_rgb(r as u8, g as u8, b as u8)
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Parse `#rrggbb` into a colour, `None` if malformed.
pub fn parse_hex(hex: &str) -> Option<Color32> {
    let rgb: Srgb<u8> = hex.parse().ok()?;
    Some(Color32::from_rgb(rgb.red, rgb.green, rgb.blue))
}

/// Same colour with opacity `alpha` in `0.0..=1.0`.
pub fn with_alpha(color: Color32, alpha: f32) -> Color32 {
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), a)
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn reference_values() {
        assert_eq!(wavelength_to_rgb(300.0, 255), [0, 0, 0]);
        assert_eq!(wavelength_to_rgb(400.0, 255), [131, 0, 181]);
        assert_eq!(wavelength_to_rgb(600.0, 255), [255, 190, 0]);
    }

    #[test]
    fn band_hues_follow_the_spectrum() {
        // blue, cyan-green, green, yellow-ish, red
        assert_eq!(wavelength_to_rgb(440.0, 100), [0, 0, 100]);
        assert_eq!(wavelength_to_rgb(510.0, 100), [0, 100, 0]);
        assert_eq!(wavelength_to_rgb(645.0, 100), [100, 0, 0]);
        let [r, g, _] = wavelength_to_rgb(560.0, 100);
        assert!(r > 0 && g == 100);
        let [_, g, b] = wavelength_to_rgb(480.0, 100);
        assert!(g > 0 && b == 100);
    }

    #[test]
    fn visible_edges_are_dimmed() {
        assert_eq!(wavelength_to_rgb(780.0, 100), [38, 0, 0]);
        assert_eq!(wavelength_to_rgb(380.0, 100), [38, 0, 38]);
        assert_eq!(wavelength_to_rgb(780.1, 100), [0, 0, 0]);
    }

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(4);
        assert_eq!(colors.len(), 4);
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn hex_face_colour() {
        assert_eq!(parse_hex("#272b30"), Some(Color32::from_rgb(0x27, 0x2b, 0x30)));
        assert_eq!(parse_hex("not a colour"), None);
    }

    proptest! {
        #[test]
        fn outside_visible_range_is_black(
            w in prop_oneof![-1000.0f64..379.999, 780.001f64..5000.0],
            max in 0u32..=1000,
        ) {
            prop_assert_eq!(wavelength_to_rgb(w, max), [0, 0, 0]);
        }

        #[test]
        fn components_stay_in_range(w in 300.0f64..850.0, max in 0u32..=1000) {
            for c in wavelength_to_rgb(w, max) {
                prop_assert!(c <= max);
            }
        }
    }
}
