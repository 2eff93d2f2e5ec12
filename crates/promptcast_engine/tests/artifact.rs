use std::fs;
use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use promptcast_core::{Disambiguator, ImageHandle};
use promptcast_engine::{normalize_to_png, ArtifactStore, PersistError, PngArtifactStore};
use tempfile::TempDir;

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

fn encoded(format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, Rgb([200, 40, 10])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn store(temp: &TempDir) -> PngArtifactStore {
    PngArtifactStore::new(temp.path().join("images"))
        .with_timestamp(Arc::new(|| "20250101_190000".to_string()))
}

#[test]
fn persists_jpeg_as_png_under_timestamped_name() {
    let temp = TempDir::new().unwrap();
    let path = store(&temp)
        .persist(
            &ImageHandle::Bytes(encoded(ImageFormat::Jpeg)),
            "A fox: in the snow!",
            Disambiguator::Timestamp,
        )
        .unwrap();

    assert_eq!(
        path,
        temp.path().join("images").join("20250101_190000_A fox in the snow.png")
    );
    let written = fs::read(&path).unwrap();
    assert!(written.starts_with(PNG_SIGNATURE));
    let decoded = image::load_from_memory(&written).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (4, 3));
}

#[test]
fn batch_ordinal_names_and_prefix_length() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp).with_prefix_len(5);
    let path = store
        .persist(
            &ImageHandle::Bytes(encoded(ImageFormat::Png)),
            "lighthouse at dusk",
            Disambiguator::Ordinal(2),
        )
        .unwrap();
    assert_eq!(path.file_name().unwrap(), "2_light.png");
}

#[test]
fn reads_file_handles() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("backend_tmp.webp");
    fs::write(&source, encoded(ImageFormat::Png)).unwrap();

    let path = store(&temp)
        .persist(&ImageHandle::File(source), "x", Disambiguator::Ordinal(1))
        .unwrap();
    assert!(path.is_file());
}

#[test]
fn undecodable_bytes_leave_no_file() {
    let temp = TempDir::new().unwrap();
    let err = store(&temp)
        .persist(
            &ImageHandle::Bytes(b"<html>quota exceeded</html>".to_vec()),
            "x",
            Disambiguator::Timestamp,
        )
        .unwrap_err();
    assert!(matches!(err, PersistError::Decode(_)));

    let out = temp.path().join("images");
    let count = fs::read_dir(&out).map(|entries| entries.count()).unwrap_or(0);
    assert_eq!(count, 0);
}

#[test]
fn normalization_is_reproducible() {
    let handle = ImageHandle::Bytes(encoded(ImageFormat::Jpeg));
    assert_eq!(
        normalize_to_png(&handle).unwrap(),
        normalize_to_png(&handle).unwrap()
    );
}
