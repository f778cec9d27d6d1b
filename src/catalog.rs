//! Static camera catalog and exposure option tables

use crate::models::CameraModel;

/// The fixed camera/film catalog. Exactly one entry is selected at all
/// times; the first entry is the default.
pub static CAMERA_MODELS: [CameraModel; 9] = [
    CameraModel {
        id: "superia",
        name: "Fujifilm Superia 400",
        ratio: "4/3",
        kind: "Disposable / 35mm",
        desc: "Classic nostalgia",
    },
    CameraModel {
        id: "portra",
        name: "Kodak Portra 800",
        ratio: "4/3",
        kind: "Professional Film",
        desc: "Perfect skin tones",
    },
    CameraModel {
        id: "ektar",
        name: "Kodak Ektar 100",
        ratio: "4/3",
        kind: "Professional Film",
        desc: "Vivid colors",
    },
    CameraModel {
        id: "hasselblad",
        name: "Hasselblad 500C/M",
        ratio: "1/1",
        kind: "Medium Format",
        desc: "Professional Studio",
    },
    CameraModel {
        id: "polaroid",
        name: "Polaroid SX-70",
        ratio: "1/1",
        kind: "Instant",
        desc: "Dreamy vintage",
    },
    CameraModel {
        id: "contax",
        name: "Contax T2",
        ratio: "3/2",
        kind: "Point & Shoot",
        desc: "High contrast flash",
    },
    CameraModel {
        id: "leica",
        name: "Leica M6",
        ratio: "3/2",
        kind: "Rangefinder",
        desc: "Street photography",
    },
    CameraModel {
        id: "hp5",
        name: "Ilford HP5 Plus",
        ratio: "3/2",
        kind: "B&W Film",
        desc: "Classic Monochrome",
    },
    CameraModel {
        id: "cinestill",
        name: "Cinestill 800T",
        ratio: "16/9",
        kind: "Film Stock",
        desc: "Cinematic night",
    },
];

/// Slider stops for the aperture control.
pub const APERTURE_STOPS: [&str; 8] = [
    "f/1.4", "f/1.8", "f/2.8", "f/4", "f/5.6", "f/8", "f/11", "f/16",
];

/// Slider stops for the shutter speed control.
pub const SHUTTER_SPEEDS: [&str; 7] = [
    "1/30", "1/60", "1/125", "1/250", "1/500", "1/1000", "1/2000",
];

/// Slider stops for the ISO control.
pub const ISO_VALUES: [&str; 6] = ["100", "200", "400", "800", "1600", "3200"];

/// Looks up a catalog entry by id.
pub fn find_model(id: &str) -> Option<&'static CameraModel> {
    CAMERA_MODELS.iter().find(|m| m.id == id)
}

/// Parses a "W/H" ratio string into its numeric value (e.g. "3/2" -> 1.5).
/// Returns 1.0 for malformed input so the viewfinder stays square rather
/// than breaking.
pub fn aspect_ratio_value(ratio: &str) -> f64 {
    let mut parts = ratio.splitn(2, '/');
    let w = parts.next().and_then(|p| p.trim().parse::<f64>().ok());
    let h = parts.next().and_then(|p| p.trim().parse::<f64>().ok());
    match (w, h) {
        (Some(w), Some(h)) if h != 0.0 => w / h,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_nine_entries_with_unique_ids() {
        assert_eq!(CAMERA_MODELS.len(), 9);
        for (i, a) in CAMERA_MODELS.iter().enumerate() {
            for b in &CAMERA_MODELS[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn find_model_by_id() {
        let leica = find_model("leica").unwrap();
        assert_eq!(leica.name, "Leica M6");
        assert_eq!(leica.kind, "Rangefinder");
        assert!(find_model("nonexistent").is_none());
    }

    #[test]
    fn aspect_ratio_values() {
        assert_eq!(aspect_ratio_value("3/2"), 1.5);
        assert_eq!(aspect_ratio_value("1/1"), 1.0);
        assert_eq!(aspect_ratio_value("16/9"), 16.0 / 9.0);
        assert_eq!(aspect_ratio_value("garbage"), 1.0);
        assert_eq!(aspect_ratio_value("1/0"), 1.0);
    }
}
