use std::io::Cursor;

use ambient_palette::{
    LabColor, Orientation, PaletteError, PaletteExtractor, Raster, RgbSpace, cluster, decode,
    extract_palette, extract_slices, resize,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use palette::Srgb;

fn photo_like(width: u32, height: u32) -> RgbImage {
    // Sky on top, grass below, a sun in the corner.
    RgbImage::from_fn(width, height, |x, y| {
        if x < width / 8 && y < height / 8 {
            Rgb([250, 220, 60])
        } else if y < height / 2 {
            Rgb([90, 150, 230 - (y % 10) as u8])
        } else {
            Rgb([40, 140 + (x % 12) as u8, 50])
        }
    })
}

fn encode(image: RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

fn png_bytes(image: RgbImage) -> Vec<u8> {
    encode(image, ImageFormat::Png)
}

/// JPEG with an APP1 segment holding a little-endian TIFF header and a
/// single IFD entry: orientation (0x0112), SHORT, count 1.
fn jpeg_with_exif_orientation(image: RgbImage, value: u16) -> Vec<u8> {
    let jpeg = encode(image, ImageFormat::Jpeg);
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

    let mut tiff = vec![b'I', b'I', 42, 0, 8, 0, 0, 0, 1, 0, 0x12, 0x01, 3, 0, 1, 0, 0, 0];
    tiff.extend_from_slice(&value.to_le_bytes());
    tiff.extend_from_slice(&[0, 0, 0, 0, 0, 0]);

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);
    let length = (payload.len() + 2) as u16;

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

#[test]
fn extraction_is_deterministic_for_a_seed() {
    let raster = Raster::new(photo_like(640, 480));
    let first = extract_palette(&raster, 4, Some(1234)).unwrap();
    let second = extract_palette(&raster, 4, Some(1234)).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
}

#[test]
fn dominant_tones_come_first() {
    let raster = Raster::new(photo_like(640, 480));
    let swatches = PaletteExtractor::new(3).with_seed(3).swatches(&raster).unwrap();

    assert_eq!(swatches.len(), 3);
    for pair in swatches.windows(2) {
        assert!(pair[0].population >= pair[1].population);
    }
    // 72x54 thumbnail.
    let total: usize = swatches.iter().map(|s| s.population).sum();
    assert_eq!(total, 72 * 54);
}

#[test]
fn decoded_png_matches_in_memory_raster() {
    let image = photo_like(300, 200);
    let from_png = decode(&png_bytes(image.clone()), None).unwrap();
    let in_memory = Raster::new(image);

    assert_eq!(
        extract_palette(&from_png, 3, Some(9)).unwrap(),
        extract_palette(&in_memory, 3, Some(9)).unwrap()
    );
}

#[test]
fn decode_applies_requested_orientation() {
    let raster = decode(&png_bytes(photo_like(200, 100)), Some(Orientation::Rotate270)).unwrap();
    assert_eq!(raster.orientation(), Orientation::Rotate270);

    let thumb = resize(&raster, 72).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (36, 72));
}

#[test]
fn decode_reads_embedded_exif_orientation() {
    let bytes = jpeg_with_exif_orientation(photo_like(200, 100), 6);

    let raster = decode(&bytes, None).unwrap();
    assert_eq!((raster.width(), raster.height()), (200, 100));
    assert_eq!(raster.orientation(), Orientation::Rotate90);
    let thumb = resize(&raster, 72).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (36, 72));

    let overridden = decode(&bytes, Some(Orientation::Identity)).unwrap();
    assert_eq!(overridden.orientation(), Orientation::Identity);
}

#[test]
fn images_without_exif_decode_upright() {
    let raster = decode(&encode(photo_like(64, 32), ImageFormat::Jpeg), None).unwrap();
    assert_eq!(raster.orientation(), Orientation::Identity);

    let raster = decode(&png_bytes(photo_like(64, 32)), None).unwrap();
    assert_eq!(raster.orientation(), Orientation::Identity);
}

#[test]
fn garbage_bytes_are_an_image_error() {
    assert!(matches!(
        decode(b"definitely not an image", None),
        Err(PaletteError::Image(_))
    ));
}

#[test]
fn concurrent_extractions_match_sequential_ones() {
    let rasters: Vec<Raster> = (0..4)
        .map(|i| Raster::new(photo_like(200 + 40 * i, 150)))
        .collect();
    let sequential: Vec<_> = rasters
        .iter()
        .enumerate()
        .map(|(i, r)| extract_palette(r, 3, Some(i as u64)).unwrap())
        .collect();

    let concurrent: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = rasters
            .iter()
            .enumerate()
            .map(|(i, r)| scope.spawn(move || extract_palette(r, 3, Some(i as u64)).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, concurrent);
}

#[test]
fn one_palette_per_light() {
    let raster = Raster::new(photo_like(400, 100));
    let palettes = extract_slices(&raster, 4, 2, Some(0)).unwrap();
    assert_eq!(palettes.len(), 4);
    assert!(palettes.iter().all(|p| !p.is_empty() && p.len() <= 2));
}

#[test]
fn rgb_clustering_scenario() {
    let points = vec![
        Srgb::new(255u8, 255, 255),
        Srgb::new(200, 200, 200),
        Srgb::new(140, 24, 53),
        Srgb::new(0, 0, 0),
    ];
    let result = cluster(&points, &RgbSpace, 2, Some(0)).unwrap();
    let a = result.assignments();
    assert_eq!(a[0].1, a[1].1);
    assert_eq!(a[2].1, a[3].1);
    assert_ne!(a[1].1, a[2].1);
}

#[test]
fn short_circuit_never_invents_colors() {
    let raster = Raster::new(RgbImage::from_pixel(10, 10, Rgb([255, 255, 255])));
    let palette = extract_palette(&raster, 3, Some(0)).unwrap();
    assert_eq!(palette, vec![Srgb::new(255, 255, 255)]);
    assert_eq!(
        LabColor::from_rgb(palette[0]),
        LabColor::new(100.0, 0.0053, -0.0104)
    );
}
