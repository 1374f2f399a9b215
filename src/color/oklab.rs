//! sRGB ⇄ Oklab conversion.
//!
//! Inputs are gamma-encoded sRGB channels in `[0, 1]`; linearization and the
//! Oklab transform come from `palette`.

use palette::{IntoColor, Oklab, Srgb};

pub fn srgb_to_oklab(rgb: [f32; 3]) -> [f32; 3] {
    let lab: Oklab = Srgb::new(rgb[0], rgb[1], rgb[2]).into_color();
    [lab.l, lab.a, lab.b]
}

/// Inverse of [`srgb_to_oklab`], clipped into the sRGB gamut.
pub fn oklab_to_srgb(lab: [f32; 3]) -> [f32; 3] {
    let rgb: Srgb = Oklab::new(lab[0], lab[1], lab[2]).into_color();
    [
        rgb.red.clamp(0.0, 1.0),
        rgb.green.clamp(0.0, 1.0),
        rgb.blue.clamp(0.0, 1.0),
    ]
}

pub fn distance_squared(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_reference_points() {
        let white = srgb_to_oklab([1.0, 1.0, 1.0]);
        assert!(close(white[0], 1.0) && close(white[1], 0.0) && close(white[2], 0.0));

        let black = srgb_to_oklab([0.0, 0.0, 0.0]);
        assert!(close(black[0], 0.0) && close(black[1], 0.0) && close(black[2], 0.0));

        let red = srgb_to_oklab([1.0, 0.0, 0.0]);
        assert!(close(red[0], 0.62796), "{:?}", red);
        assert!(close(red[1], 0.22486), "{:?}", red);
        assert!(close(red[2], 0.12585), "{:?}", red);
    }

    #[test]
    fn test_inverse() {
        for rgb in [[0.2, 0.4, 0.6], [0.9, 0.1, 0.3], [0.5, 0.5, 0.5]] {
            let back = oklab_to_srgb(srgb_to_oklab(rgb));
            for i in 0..3 {
                assert!(close(back[i], rgb[i]), "{:?} -> {:?}", rgb, back);
            }
        }
    }

    #[test]
    fn test_perceptual_ordering() {
        // dark greys are perceptually closer together than in raw RGB terms
        let a = srgb_to_oklab([0.5, 0.5, 0.5]);
        let b = srgb_to_oklab([0.6, 0.5, 0.5]);
        let c = srgb_to_oklab([0.5, 0.5, 0.9]);
        let d_ab = distance_squared(&[a[0], a[1], a[2], 1.0], &[b[0], b[1], b[2], 1.0]);
        let d_ac = distance_squared(&[a[0], a[1], a[2], 1.0], &[c[0], c[1], c[2], 1.0]);
        assert!(d_ab < d_ac);
    }
}
