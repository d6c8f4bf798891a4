//! Shared helpers for integration tests: tiny TrueType fonts built in memory

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::io::Write;

/// One glyph of a test font: a filled rectangle, or nothing
#[derive(Debug, Clone, Copy)]
pub struct TestGlyph {
    pub name: &'static str,
    /// (x_min, y_min, x_max, y_max) in font units, 1000 units per em
    pub rect: Option<(i16, i16, i16, i16)>,
}

impl TestGlyph {
    pub const fn rect(name: &'static str, x_min: i16, y_min: i16, x_max: i16, y_max: i16) -> Self {
        Self {
            name,
            rect: Some((x_min, y_min, x_max, y_max)),
        }
    }

    pub const fn empty(name: &'static str) -> Self {
        Self { name, rect: None }
    }
}

/// Font with a tall bar, a square, an empty glyph and one unprefixed glyph
pub fn sample_font() -> Vec<u8> {
    build_ttf(&[
        TestGlyph::rect("uniE10E", 100, 0, 300, 700),
        TestGlyph::rect("uniE2F1", 100, 100, 600, 600),
        TestGlyph::empty("uniE3A0"),
        TestGlyph::rect("period", 100, 0, 200, 100),
    ])
}

/// Build a TrueType font; glyph 0 is an empty `.notdef`
pub fn build_ttf(glyphs: &[TestGlyph]) -> Vec<u8> {
    let num_glyphs = glyphs.len() + 1;

    let mut glyf = Vec::new();
    let mut loca = vec![0u32];
    let mut hmtx = Vec::new();
    push_u16(&mut hmtx, 500);
    push_i16(&mut hmtx, 0);
    loca.push(0);

    for glyph in glyphs {
        if let Some((x_min, y_min, x_max, y_max)) = glyph.rect {
            push_i16(&mut glyf, 1);
            for v in [x_min, y_min, x_max, y_max] {
                push_i16(&mut glyf, v);
            }
            push_u16(&mut glyf, 3); // last point of the only contour
            push_u16(&mut glyf, 0); // no instructions
            glyf.extend_from_slice(&[0x01; 4]); // on-curve, 16-bit deltas
            for dx in [x_min, x_max - x_min, 0, x_min - x_max] {
                push_i16(&mut glyf, dx);
            }
            for dy in [y_min, 0, y_max - y_min, 0] {
                push_i16(&mut glyf, dy);
            }
            pad4(&mut glyf);
        }
        loca.push(glyf.len() as u32);
        push_u16(&mut hmtx, 1000);
        push_i16(&mut hmtx, glyph.rect.map_or(0, |r| r.0));
    }

    let mut loca_table = Vec::new();
    for offset in loca {
        push_u32(&mut loca_table, offset);
    }

    let mut head = Vec::new();
    push_u32(&mut head, 0x0001_0000);
    push_u32(&mut head, 0x0001_0000);
    push_u32(&mut head, 0); // checksum adjustment
    push_u32(&mut head, 0x5F0F_3CF5);
    push_u16(&mut head, 0);
    push_u16(&mut head, 1000);
    head.extend_from_slice(&[0u8; 16]); // created, modified
    for v in [0i16, 0, 1000, 1000] {
        push_i16(&mut head, v);
    }
    push_u16(&mut head, 0); // macStyle
    push_u16(&mut head, 8);
    push_i16(&mut head, 2);
    push_i16(&mut head, 1); // long loca offsets
    push_i16(&mut head, 0);
    assert_eq!(head.len(), 54);

    let mut hhea = Vec::new();
    push_u32(&mut hhea, 0x0001_0000);
    push_i16(&mut hhea, 800);
    push_i16(&mut hhea, -200);
    push_i16(&mut hhea, 0);
    push_u16(&mut hhea, 1000);
    for v in [0i16, 0, 1000, 1, 0, 0, 0, 0, 0, 0, 0] {
        push_i16(&mut hhea, v);
    }
    push_u16(&mut hhea, num_glyphs as u16);
    assert_eq!(hhea.len(), 36);

    let mut maxp = Vec::new();
    push_u32(&mut maxp, 0x0000_5000);
    push_u16(&mut maxp, num_glyphs as u16);

    let mut post = Vec::new();
    push_u32(&mut post, 0x0002_0000);
    post.extend_from_slice(&[0u8; 28]);
    push_u16(&mut post, num_glyphs as u16);
    push_u16(&mut post, 0); // .notdef from the standard set
    for index in 0..glyphs.len() {
        push_u16(&mut post, 258 + index as u16);
    }
    for glyph in glyphs {
        post.push(glyph.name.len() as u8);
        post.extend_from_slice(glyph.name.as_bytes());
    }

    assemble_sfnt(&[
        (*b"glyf", glyf),
        (*b"head", head),
        (*b"hhea", hhea),
        (*b"hmtx", hmtx),
        (*b"loca", loca_table),
        (*b"maxp", maxp),
        (*b"post", post),
    ])
}

/// Wrap an sfnt produced by [`build_ttf`] as WOFF 1.0, compressing where it helps
pub fn wrap_woff(sfnt: &[u8]) -> Vec<u8> {
    let num_tables = u16::from_be_bytes([sfnt[4], sfnt[5]]) as usize;
    let header_len = 44;
    let mut entries = Vec::new();
    let mut data = Vec::new();
    let data_start = header_len + num_tables * 20;

    for index in 0..num_tables {
        let record = &sfnt[12 + index * 16..12 + (index + 1) * 16];
        let offset = u32::from_be_bytes(record[8..12].try_into().unwrap()) as usize;
        let length = u32::from_be_bytes(record[12..16].try_into().unwrap()) as usize;
        let table = &sfnt[offset..offset + length];

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(table).unwrap();
        let compressed = encoder.finish().unwrap();
        let stored = if compressed.len() < table.len() {
            compressed
        } else {
            table.to_vec()
        };

        entries.extend_from_slice(&record[0..4]);
        push_u32(&mut entries, (data_start + data.len()) as u32);
        push_u32(&mut entries, stored.len() as u32);
        push_u32(&mut entries, length as u32);
        entries.extend_from_slice(&record[4..8]);
        data.extend_from_slice(&stored);
        pad4(&mut data);
    }

    let mut woff = Vec::new();
    woff.extend_from_slice(b"wOFF");
    woff.extend_from_slice(&sfnt[0..4]);
    push_u32(&mut woff, (data_start + data.len()) as u32);
    push_u16(&mut woff, num_tables as u16);
    push_u16(&mut woff, 0);
    push_u32(&mut woff, sfnt.len() as u32);
    push_u16(&mut woff, 1);
    push_u16(&mut woff, 0);
    woff.extend_from_slice(&[0u8; 20]); // no metadata or private block
    assert_eq!(woff.len(), header_len);
    woff.extend_from_slice(&entries);
    woff.extend_from_slice(&data);
    woff
}

fn assemble_sfnt(tables: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let mut entry_selector = 0u16;
    while (1u16 << (entry_selector + 1)) <= num_tables {
        entry_selector += 1;
    }
    let search_range = (1u16 << entry_selector) * 16;

    let mut font = Vec::new();
    push_u32(&mut font, 0x0001_0000);
    push_u16(&mut font, num_tables);
    push_u16(&mut font, search_range);
    push_u16(&mut font, entry_selector);
    push_u16(&mut font, num_tables * 16 - search_range);

    let mut offset = 12 + tables.len() * 16;
    let mut data = Vec::new();
    for (tag, table) in tables {
        font.extend_from_slice(tag);
        push_u32(&mut font, checksum(table));
        push_u32(&mut font, offset as u32);
        push_u32(&mut font, table.len() as u32);
        data.extend_from_slice(table);
        pad4(&mut data);
        offset = 12 + tables.len() * 16 + data.len();
    }
    font.extend_from_slice(&data);
    font
}

fn checksum(table: &[u8]) -> u32 {
    table.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

fn pad4(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn push_i16(buf: &mut Vec<u8>, v: i16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}
