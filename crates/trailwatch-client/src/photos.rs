//! Concurrent EXIF scan over a photo selection.

use futures::future::join_all;
use tracing::{debug, warn};
use trailwatch_core::{Coordinates, ExifBatch, IncidentDraft, PhotoAttachment, extract_gps};

/// Parse every photo's EXIF on the blocking pool and join the results.
///
/// The returned photos and batch keep selection order, so the batch's
/// primary fix is the first selected photo with GPS however the parses
/// interleave.
pub async fn scan_photos(photos: Vec<PhotoAttachment>) -> (Vec<PhotoAttachment>, ExifBatch) {
    let tasks = photos.into_iter().map(|photo| {
        tokio::task::spawn_blocking(move || {
            let fix = extract_gps(&photo.bytes);
            (photo, fix)
        })
    });

    let mut kept = Vec::new();
    let mut results: Vec<(String, Option<Coordinates>)> = Vec::new();
    for joined in join_all(tasks).await {
        match joined {
            Ok((photo, fix)) => {
                debug!(file = %photo.filename, has_gps = fix.is_some(), "scanned photo");
                results.push((photo.filename.clone(), fix));
                kept.push(photo);
            }
            Err(e) => warn!(error = %e, "photo scan task failed"),
        }
    }

    (kept, ExifBatch::from_results(results))
}

/// Replace the draft's photo selection, rebuilding its EXIF state.
pub async fn select_photos(draft: &mut IncidentDraft, photos: Vec<PhotoAttachment>) {
    let (photos, batch) = scan_photos(photos).await;
    draft.set_photos(photos, batch);
}

#[cfg(test)]
mod tests {
    use super::*;
    use exif::experimental::Writer;
    use exif::{Field, In, Rational, Tag, Value};
    use std::io::Cursor;

    fn degrees(value: f64) -> Vec<Rational> {
        let scaled = (value.abs() * 10_000.0).round() as u32;
        vec![
            Rational::from((scaled, 10_000)),
            Rational::from((0, 1)),
            Rational::from((0, 1)),
        ]
    }

    fn geotagged(lat: f64, lng: f64) -> Vec<u8> {
        let fields = [
            Field {
                tag: Tag::GPSLatitudeRef,
                ifd_num: In::PRIMARY,
                value: Value::Ascii(vec![if lat < 0.0 { b"S".to_vec() } else { b"N".to_vec() }]),
            },
            Field {
                tag: Tag::GPSLatitude,
                ifd_num: In::PRIMARY,
                value: Value::Rational(degrees(lat)),
            },
            Field {
                tag: Tag::GPSLongitudeRef,
                ifd_num: In::PRIMARY,
                value: Value::Ascii(vec![if lng < 0.0 { b"W".to_vec() } else { b"E".to_vec() }]),
            },
            Field {
                tag: Tag::GPSLongitude,
                ifd_num: In::PRIMARY,
                value: Value::Rational(degrees(lng)),
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

    #[tokio::test]
    async fn primary_fix_is_first_geotagged_in_selection_order() {
        let photos = vec![
            PhotoAttachment::new("plain.jpg", b"no metadata".to_vec()),
            PhotoAttachment::new("ella.tif", geotagged(6.8667, 81.0466)),
            PhotoAttachment::new("kandy.tif", geotagged(7.2906, 80.6337)),
        ];
        let (kept, batch) = scan_photos(photos).await;

        let names: Vec<_> = kept.iter().map(|p| p.filename.as_str()).collect();
        assert_eq!(names, vec!["plain.jpg", "ella.tif", "kandy.tif"]);
        assert_eq!(batch.primary(), Some(Coordinates::new(6.8667, 81.0466)));
        assert!(!batch.record("plain.jpg").unwrap().has_gps);
        assert!(batch.record("kandy.tif").unwrap().has_gps);
        assert_eq!(batch.badge("ella.tif"), "✓ GPS 6.8667, 81.0466");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn primary_fix_does_not_depend_on_completion_order() {
        let mut photos = vec![PhotoAttachment::new("first.tif", geotagged(-33.5, -70.25))];
        photos.extend((0..4).map(|i| PhotoAttachment::new(format!("{i}.tif"), geotagged(6.9, 79.8))));
        for _ in 0..10 {
            let (_, batch) = scan_photos(photos.clone()).await;
            assert_eq!(batch.primary(), Some(Coordinates::new(-33.5, -70.25)));
        }
    }

    #[tokio::test]
    async fn unreadable_photos_do_not_block_the_batch() {
        let photos = vec![
            PhotoAttachment::new("a.jpg", b"not a jpeg".to_vec()),
            PhotoAttachment::new("b.jpg", Vec::new()),
        ];
        let (kept, batch) = scan_photos(photos).await;
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].filename, "a.jpg");
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.primary(), None);
        assert!(!batch.record("b.jpg").unwrap().has_gps);
    }

    #[tokio::test]
    async fn selection_replaces_previous_state() {
        let mut draft = IncidentDraft::new();
        select_photos(&mut draft, vec![PhotoAttachment::new("a.jpg", vec![])]).await;
        select_photos(&mut draft, vec![PhotoAttachment::new("b.jpg", vec![])]).await;
        assert_eq!(draft.photos().len(), 1);
        assert!(draft.exif().record("a.jpg").is_none());
        assert!(draft.exif().record("b.jpg").is_some());
    }
}
