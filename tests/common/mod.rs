//! Synthesized media fixtures shared by the integration tests

fn atom(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    v.extend_from_slice(kind);
    v.extend_from_slice(payload);
    v
}

/// Smallest MP4 audio file: ftyp, a moov with one sound track, empty mdat
pub fn m4a_bytes() -> Vec<u8> {
    let mut mvhd = vec![0u8; 100];
    mvhd[12..16].copy_from_slice(&1000u32.to_be_bytes());
    mvhd[20..24].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    mvhd[24..26].copy_from_slice(&0x0100u16.to_be_bytes());
    mvhd[96..100].copy_from_slice(&2u32.to_be_bytes());

    let mut mdhd = vec![0u8; 24];
    mdhd[12..16].copy_from_slice(&44100u32.to_be_bytes());

    let mut hdlr = vec![0u8; 25];
    hdlr[8..12].copy_from_slice(b"soun");

    let mdia = atom(b"mdia", &[atom(b"mdhd", &mdhd), atom(b"hdlr", &hdlr)].concat());
    let moov = atom(b"moov", &[atom(b"mvhd", &mvhd), atom(b"trak", &mdia)].concat());

    [
        atom(b"ftyp", b"M4A \0\0\0\0M4A isom"),
        moov,
        atom(b"mdat", &[0u8; 8]),
    ]
    .concat()
}

/// ADTS stream: AAC-LC, 44.1 kHz, stereo, `frames` frames of silence
pub fn adts_bytes(frames: usize) -> Vec<u8> {
    let len: u16 = 7 + 100;
    let header = [
        0xFF,
        0xF1,
        0x50,
        0x80 | ((len >> 11) & 0x3) as u8,
        ((len >> 3) & 0xFF) as u8,
        (((len & 0x7) << 5) as u8) | 0x1F,
        0xFC,
    ];
    let mut v = Vec::new();
    for _ in 0..frames {
        v.extend_from_slice(&header);
        v.resize(v.len() + 100, 0);
    }
    v
}

/// Start of a Matroska/WebM file (EBML header only)
pub fn webm_bytes() -> Vec<u8> {
    let mut v = vec![0x1A, 0x45, 0xDF, 0xA3, 0x9F];
    v.extend_from_slice(&[0x42, 0x82, 0x84]);
    v.extend_from_slice(b"webm");
    v.resize(64, 0);
    v
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, _| image::Rgb([(x % 256) as u8, 80, 160]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}
