//! GPS extraction from photo EXIF metadata.
//!
//! A photo either yields a plausible fix or nothing. Unreadable files are
//! logged and treated as "no GPS" so one bad photo never blocks a batch.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use exif::{Exif, In, Reader, Tag, Value};
use tracing::{debug, warn};

use crate::model::Coordinates;

/// GPS outcome for one photo in a selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoExifRecord {
    pub has_gps: bool,
    pub coordinates: Option<Coordinates>,
}

impl PhotoExifRecord {
    pub fn from_fix(fix: Option<Coordinates>) -> Self {
        Self {
            has_gps: fix.is_some(),
            coordinates: fix,
        }
    }
}

/// EXIF results for the current photo selection, keyed by filename.
///
/// Rebuilt whenever the selection changes; never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifBatch {
    records: HashMap<String, PhotoExifRecord>,
    primary: Option<Coordinates>,
}

impl ExifBatch {
    /// Build a batch from per-file results given in selection order.
    ///
    /// The primary fix is the first file in selection order that has one,
    /// independent of the order in which the parses finished.
    pub fn from_results<I, S>(results: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<Coordinates>)>,
        S: Into<String>,
    {
        let mut records = HashMap::new();
        let mut primary = None;
        for (filename, fix) in results {
            if primary.is_none() {
                primary = fix;
            }
            records.insert(filename.into(), PhotoExifRecord::from_fix(fix));
        }
        Self { records, primary }
    }

    pub fn primary(&self) -> Option<Coordinates> {
        self.primary
    }

    pub fn record(&self, filename: &str) -> Option<&PhotoExifRecord> {
        self.records.get(filename)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Short per-photo label shown next to a preview.
    pub fn badge(&self, filename: &str) -> String {
        match self.record(filename).and_then(|r| r.coordinates) {
            Some(c) => format!("✓ GPS {:.4}, {:.4}", c.lat, c.lng),
            None => "✗ No GPS".to_string(),
        }
    }
}

/// Extract a GPS fix from an image held in memory.
pub fn extract_gps(bytes: &[u8]) -> Option<Coordinates> {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            warn!(error = %e, "could not read image metadata");
            return None;
        }
    };

    let fix = gps_from_exif(&exif)?;
    if fix.is_plausible() {
        Some(fix)
    } else {
        debug!(lat = fix.lat, lng = fix.lng, "discarding implausible GPS fix");
        None
    }
}

/// Extract a GPS fix from an image on disk.
pub fn extract_gps_from_path(path: &Path) -> Option<Coordinates> {
    match std::fs::read(path) {
        Ok(bytes) => extract_gps(&bytes),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read photo");
            None
        }
    }
}

fn gps_from_exif(exif: &Exif) -> Option<Coordinates> {
    let lat = signed_degrees(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')?;
    let lng = signed_degrees(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')?;
    Some(Coordinates::new(lat, lng))
}

/// Read a degrees/minutes/seconds triple and apply the hemisphere reference.
fn signed_degrees(exif: &Exif, value_tag: Tag, ref_tag: Tag, negative: u8) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let degrees = match &field.value {
        Value::Rational(parts) if !parts.is_empty() => {
            let part = |i: usize| parts.get(i).map_or(0.0, |r| r.to_f64());
            part(0) + part(1) / 60.0 + part(2) / 3600.0
        }
        Value::SRational(parts) if !parts.is_empty() => {
            let part = |i: usize| parts.get(i).map_or(0.0, |r| r.to_f64());
            part(0) + part(1) / 60.0 + part(2) / 3600.0
        }
        _ => return None,
    };

    let hemisphere = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(|f| match &f.value {
            Value::Ascii(values) => values.first().and_then(|v| v.first()).copied(),
            _ => None,
        });

    Some(match hemisphere {
        Some(h) if h.eq_ignore_ascii_case(&negative) => -degrees,
        _ => degrees,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use exif::experimental::Writer;
    use exif::{Field, Rational};

    fn rational(num: u32, denom: u32) -> Rational {
        Rational::from((num, denom))
    }

    fn tiff_with_gps(lat: [Rational; 3], lat_ref: &str, lng: [Rational; 3], lng_ref: &str) -> Vec<u8> {
        let fields = [
            Field {
                tag: Tag::GPSLatitudeRef,
                ifd_num: In::PRIMARY,
                value: Value::Ascii(vec![lat_ref.as_bytes().to_vec()]),
            },
            Field {
                tag: Tag::GPSLatitude,
                ifd_num: In::PRIMARY,
                value: Value::Rational(lat.to_vec()),
            },
            Field {
                tag: Tag::GPSLongitudeRef,
                ifd_num: In::PRIMARY,
                value: Value::Ascii(vec![lng_ref.as_bytes().to_vec()]),
            },
            Field {
                tag: Tag::GPSLongitude,
                ifd_num: In::PRIMARY,
                value: Value::Rational(lng.to_vec()),
            },
        ];
        let mut writer = Writer::new();
        for field in &fields {
            writer.push_field(field);
        }
        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, false).unwrap();
        buf.into_inner()
    }

    #[test]
    fn valid_fix_is_returned_exactly() {
        let bytes = tiff_with_gps(
            [rational(69, 10), rational(0, 1), rational(0, 1)],
            "N",
            [rational(798, 10), rational(0, 1), rational(0, 1)],
            "E",
        );
        assert_eq!(extract_gps(&bytes), Some(Coordinates::new(6.9, 79.8)));
    }

    #[test]
    fn zero_fix_means_no_gps() {
        let zero = [rational(0, 1), rational(0, 1), rational(0, 1)];
        let bytes = tiff_with_gps(zero, "N", zero, "E");
        assert_eq!(extract_gps(&bytes), None);
    }

    #[test]
    fn southern_and_western_hemispheres_are_negative() {
        let bytes = tiff_with_gps(
            [rational(33, 1), rational(30, 1), rational(0, 1)],
            "S",
            [rational(70, 1), rational(15, 1), rational(0, 1)],
            "W",
        );
        let fix = extract_gps(&bytes).unwrap();
        assert_eq!(fix.lat, -33.5);
        assert_eq!(fix.lng, -70.25);
    }

    #[test]
    fn garbage_bytes_mean_no_gps() {
        assert_eq!(extract_gps(b"definitely not an image"), None);
        assert_eq!(extract_gps(&[]), None);
    }

    #[test]
    fn missing_file_means_no_gps() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(extract_gps_from_path(&dir.path().join("nope.jpg")), None);
    }

    #[test]
    fn file_on_disk_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geo.tif");
        let bytes = tiff_with_gps(
            [rational(69, 10), rational(0, 1), rational(0, 1)],
            "N",
            [rational(798, 10), rational(0, 1), rational(0, 1)],
            "E",
        );
        std::fs::write(&path, bytes).unwrap();
        assert_eq!(extract_gps_from_path(&path), Some(Coordinates::new(6.9, 79.8)));
    }

    #[test]
    fn primary_follows_selection_order() {
        let batch = ExifBatch::from_results(vec![
            ("a.jpg", None),
            ("b.jpg", Some(Coordinates::new(7.0, 80.0))),
            ("c.jpg", Some(Coordinates::new(6.0, 81.0))),
        ]);
        assert_eq!(batch.primary(), Some(Coordinates::new(7.0, 80.0)));
        assert_eq!(batch.len(), 3);
        assert!(!batch.record("a.jpg").unwrap().has_gps);
        assert!(batch.record("c.jpg").unwrap().has_gps);
    }

    #[test]
    fn badges() {
        let batch = ExifBatch::from_results(vec![
            ("a.jpg", Some(Coordinates::new(6.92712, 79.86124))),
            ("b.jpg", None),
        ]);
        assert_eq!(batch.badge("a.jpg"), "✓ GPS 6.9271, 79.8612");
        assert_eq!(batch.badge("b.jpg"), "✗ No GPS");
        assert_eq!(batch.badge("missing.jpg"), "✗ No GPS");
    }
}
