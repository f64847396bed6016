//! JPEG builders shared by the unit and integration tests.

/// Build a JPEG with an EXIF `DateTimeOriginal` of `taken`
/// (`"YYYY:MM:DD HH:MM:SS"`) followed by `payload`.
pub fn jpeg_with_capture_time(taken: &str, payload: &[u8]) -> Vec<u8> {
    let mut value = taken.as_bytes().to_vec();
    value.push(0);

    // TIFF header, little endian, IFD0 at offset 8
    let mut tiff = vec![b'I', b'I', 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
    // IFD0: one entry pointing at the Exif sub-IFD (offset 26)
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x8769u16.to_le_bytes());
    tiff.extend_from_slice(&4u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&26u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());
    // Exif IFD: DateTimeOriginal, ASCII, stored at offset 44
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x9003u16.to_le_bytes());
    tiff.extend_from_slice(&2u16.to_le_bytes());
    tiff.extend_from_slice(&(value.len() as u32).to_le_bytes());
    tiff.extend_from_slice(&44u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff.extend_from_slice(&value);

    let mut app1 = b"Exif\0\0".to_vec();
    app1.extend_from_slice(&tiff);

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
    jpeg.extend_from_slice(&app1);
    jpeg.extend_from_slice(payload);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

/// A JPEG with no APP1 segment at all
pub fn jpeg_without_exif(payload: &[u8]) -> Vec<u8> {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend_from_slice(payload);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}
