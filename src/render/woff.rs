//! Font container detection and WOFF 1.0 unwrapping
//!
//! Web fonts usually arrive as WOFF: an sfnt whose tables are individually
//! zlib-compressed. The outline reader only understands sfnt, so WOFF input
//! is inflated table by table and reassembled into a plain TrueType/OpenType
//! binary. WOFF2 (brotli plus table transforms) is not supported.

use flate2::read::ZlibDecoder;
use std::borrow::Cow;
use std::io::Read;
use tracing::debug;

use crate::errors::{RenderError, RenderResult};

const WOFF_HEADER_LEN: usize = 44;
const WOFF_TABLE_ENTRY_LEN: usize = 20;
const SFNT_HEADER_LEN: usize = 12;
const SFNT_TABLE_RECORD_LEN: usize = 16;
/// Most tables an sfnt header can describe (rangeShift is a u16)
const MAX_TABLES: usize = 4095;
/// Upper bound on the reassembled font
const MAX_SFNT_LEN: usize = 64 << 20;
/// Inflate buffers grow from here rather than trusting the declared length
const INFLATE_INITIAL_CAPACITY: usize = 64 << 10;

/// Container format detected from magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFormat {
    Woff,
    Woff2,
    TrueType,
    OpenType,
    Unknown,
}

impl FontFormat {
    pub fn detect(data: &[u8]) -> Self {
        match infer::get(data).map(|kind| kind.extension()) {
            Some("woff") => Self::Woff,
            Some("woff2") => Self::Woff2,
            Some("ttf") => Self::TrueType,
            Some("otf") => Self::OpenType,
            _ => Self::Unknown,
        }
    }
}

/// Return sfnt bytes for any supported container, borrowing when possible
pub fn to_sfnt(data: &[u8]) -> RenderResult<Cow<'_, [u8]>> {
    match FontFormat::detect(data) {
        FontFormat::Woff => decode_woff(data).map(Cow::Owned),
        FontFormat::Woff2 => Err(RenderError::UnsupportedFormat {
            format: "woff2".to_string(),
        }),
        // Unrecognized magic (e.g. Apple 'true') is left for the parser to judge
        FontFormat::TrueType | FontFormat::OpenType | FontFormat::Unknown => {
            Ok(Cow::Borrowed(data))
        }
    }
}

struct WoffTable {
    tag: [u8; 4],
    offset: usize,
    comp_length: usize,
    orig_length: usize,
    orig_checksum: u32,
}

/// Inflate a WOFF 1.0 font into an sfnt binary
pub fn decode_woff(data: &[u8]) -> RenderResult<Vec<u8>> {
    if data.len() < WOFF_HEADER_LEN || &data[0..4] != b"wOFF" {
        return Err(RenderError::woff("missing wOFF header"));
    }

    let flavor = read_u32(data, 4)?;
    let declared_length = read_u32(data, 8)? as usize;
    let num_tables = read_u16(data, 12)? as usize;
    if declared_length != data.len() {
        debug!(
            "WOFF header declares {} bytes but {} were supplied",
            declared_length,
            data.len()
        );
    }
    if num_tables == 0 {
        return Err(RenderError::woff("font has no tables"));
    }
    if num_tables > MAX_TABLES {
        return Err(RenderError::woff(format!(
            "{num_tables} tables exceeds the sfnt limit of {MAX_TABLES}"
        )));
    }
    if WOFF_HEADER_LEN + num_tables * WOFF_TABLE_ENTRY_LEN > data.len() {
        return Err(RenderError::woff(format!(
            "table directory for {num_tables} tables runs past end of file"
        )));
    }

    let mut tables = Vec::with_capacity(num_tables);
    for index in 0..num_tables {
        let entry = WOFF_HEADER_LEN + index * WOFF_TABLE_ENTRY_LEN;
        let tag = read_tag(data, entry)?;
        let table = WoffTable {
            tag,
            offset: read_u32(data, entry + 4)? as usize,
            comp_length: read_u32(data, entry + 8)? as usize,
            orig_length: read_u32(data, entry + 12)? as usize,
            orig_checksum: read_u32(data, entry + 16)?,
        };
        if table.comp_length > table.orig_length {
            return Err(RenderError::woff(format!(
                "table {} is larger compressed than uncompressed",
                tag_name(&tag)
            )));
        }
        tables.push(table);
    }
    let sfnt_len = tables.iter().fold(
        SFNT_HEADER_LEN + num_tables * SFNT_TABLE_RECORD_LEN,
        |len, table| len.saturating_add(table.orig_length),
    );
    if sfnt_len > MAX_SFNT_LEN {
        return Err(RenderError::woff(format!(
            "decoded font would be {sfnt_len} bytes, limit is {MAX_SFNT_LEN}"
        )));
    }
    // sfnt lookups binary-search the directory
    tables.sort_by(|a, b| a.tag.cmp(&b.tag));

    let directory_len = SFNT_HEADER_LEN + num_tables * SFNT_TABLE_RECORD_LEN;
    let mut table_data = Vec::new();
    let mut records = Vec::with_capacity(num_tables);
    for table in &tables {
        let end = table
            .offset
            .checked_add(table.comp_length)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| {
                RenderError::woff(format!("table {} runs past end of file", tag_name(&table.tag)))
            })?;
        let raw = &data[table.offset..end];
        let bytes = if table.comp_length == table.orig_length {
            raw.to_vec()
        } else {
            inflate(raw, table)?
        };

        records.push((table, directory_len + table_data.len()));
        table_data.extend_from_slice(&bytes);
        while table_data.len() % 4 != 0 {
            table_data.push(0);
        }
    }

    let mut sfnt = Vec::with_capacity(directory_len + table_data.len());
    let (search_range, entry_selector, range_shift) = search_params(num_tables);
    sfnt.extend_from_slice(&flavor.to_be_bytes());
    sfnt.extend_from_slice(&(num_tables as u16).to_be_bytes());
    sfnt.extend_from_slice(&search_range.to_be_bytes());
    sfnt.extend_from_slice(&entry_selector.to_be_bytes());
    sfnt.extend_from_slice(&range_shift.to_be_bytes());
    for (table, offset) in records {
        sfnt.extend_from_slice(&table.tag);
        sfnt.extend_from_slice(&table.orig_checksum.to_be_bytes());
        sfnt.extend_from_slice(&(offset as u32).to_be_bytes());
        sfnt.extend_from_slice(&(table.orig_length as u32).to_be_bytes());
    }
    sfnt.extend_from_slice(&table_data);

    debug!(
        "Decoded WOFF with {} tables: {} -> {} bytes",
        num_tables,
        data.len(),
        sfnt.len()
    );
    Ok(sfnt)
}

fn inflate(raw: &[u8], table: &WoffTable) -> RenderResult<Vec<u8>> {
    let mut bytes = Vec::with_capacity(table.orig_length.min(INFLATE_INITIAL_CAPACITY));
    // One byte past the declared length is enough to detect an overrun
    ZlibDecoder::new(raw)
        .take(table.orig_length as u64 + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| RenderError::woff(format!("table {}: {e}", tag_name(&table.tag))))?;
    if bytes.len() > table.orig_length {
        return Err(RenderError::woff(format!(
            "table {} inflates past its declared {} bytes",
            tag_name(&table.tag),
            table.orig_length
        )));
    }
    if bytes.len() != table.orig_length {
        return Err(RenderError::woff(format!(
            "table {} inflated to {} bytes, expected {}",
            tag_name(&table.tag),
            bytes.len(),
            table.orig_length
        )));
    }
    Ok(bytes)
}

/// searchRange, entrySelector and rangeShift for an sfnt header
///
/// `num_tables` must be in `1..=MAX_TABLES` so every field fits in a u16.
fn search_params(num_tables: usize) -> (u16, u16, u16) {
    let mut entry_selector = 0u32;
    while (1usize << (entry_selector + 1)) <= num_tables {
        entry_selector += 1;
    }
    let search_range = (1usize << entry_selector) * SFNT_TABLE_RECORD_LEN;
    let range_shift = num_tables * SFNT_TABLE_RECORD_LEN - search_range;
    (search_range as u16, entry_selector as u16, range_shift as u16)
}

fn tag_name(tag: &[u8; 4]) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

fn read_tag(data: &[u8], offset: usize) -> RenderResult<[u8; 4]> {
    data.get(offset..offset + 4)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| RenderError::woff(format!("truncated table directory at {offset}")))
}

fn read_u32(data: &[u8], offset: usize) -> RenderResult<u32> {
    read_tag(data, offset).map(u32::from_be_bytes)
}

fn read_u16(data: &[u8], offset: usize) -> RenderResult<u16> {
    data.get(offset..offset + 2)
        .map(|bytes| u16::from_be_bytes([bytes[0], bytes[1]]))
        .ok_or_else(|| RenderError::woff(format!("truncated header at {offset}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use rstest::rstest;
    use std::io::Write;

    /// WOFF with one compressed and one stored table, directory out of order
    fn sample_woff() -> Vec<u8> {
        let name_table = b"name table payload that compresses well well well well".to_vec();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&name_table).unwrap();
        let compressed = encoder.finish().unwrap();
        assert!(compressed.len() < name_table.len());
        let head_table = vec![1u8, 2, 3];

        let data_start = WOFF_HEADER_LEN + 2 * WOFF_TABLE_ENTRY_LEN;
        let mut woff = Vec::new();
        woff.extend_from_slice(b"wOFF");
        woff.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        woff.extend_from_slice(&0u32.to_be_bytes()); // length, patched below
        woff.extend_from_slice(&2u16.to_be_bytes());
        woff.extend_from_slice(&[0u8; 30]);
        assert_eq!(woff.len(), WOFF_HEADER_LEN);

        let name_offset = data_start;
        let head_offset = data_start + compressed.len();
        for (tag, offset, comp, orig) in [
            (b"name", name_offset, compressed.len(), name_table.len()),
            (b"head", head_offset, head_table.len(), head_table.len()),
        ] {
            woff.extend_from_slice(tag);
            woff.extend_from_slice(&(offset as u32).to_be_bytes());
            woff.extend_from_slice(&(comp as u32).to_be_bytes());
            woff.extend_from_slice(&(orig as u32).to_be_bytes());
            woff.extend_from_slice(&0xABCD_0123u32.to_be_bytes());
        }
        woff.extend_from_slice(&compressed);
        woff.extend_from_slice(&head_table);
        let len = woff.len() as u32;
        woff[8..12].copy_from_slice(&len.to_be_bytes());
        woff
    }

    #[test]
    fn test_detects_woff() {
        assert_eq!(FontFormat::detect(&sample_woff()), FontFormat::Woff);
        assert_eq!(FontFormat::detect(b"not a font"), FontFormat::Unknown);
    }

    #[test]
    fn test_decode_rebuilds_sorted_sfnt() {
        let sfnt = decode_woff(&sample_woff()).unwrap();

        assert_eq!(&sfnt[0..4], &[0, 1, 0, 0]);
        assert_eq!(u16::from_be_bytes([sfnt[4], sfnt[5]]), 2);
        // head sorts before name
        assert_eq!(&sfnt[12..16], b"head");
        assert_eq!(&sfnt[28..32], b"name");

        let head_offset = u32::from_be_bytes(sfnt[20..24].try_into().unwrap()) as usize;
        assert_eq!(head_offset % 4, 0);
        assert_eq!(&sfnt[head_offset..head_offset + 3], &[1, 2, 3]);

        let name_offset = u32::from_be_bytes(sfnt[36..40].try_into().unwrap()) as usize;
        let name_len = u32::from_be_bytes(sfnt[40..44].try_into().unwrap()) as usize;
        assert_eq!(
            &sfnt[name_offset..name_offset + name_len],
            b"name table payload that compresses well well well well"
        );
    }

    #[test]
    fn test_sfnt_passes_through_borrowed() {
        let ttf = [0u8, 1, 0, 0, 0, 4, 0, 0];
        assert!(matches!(to_sfnt(&ttf).unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_woff2_is_unsupported() {
        let mut woff2 = b"wOF2".to_vec();
        woff2.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        woff2.extend_from_slice(&[0u8; 40]);
        let err = to_sfnt(&woff2).unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_truncated_woff_is_an_error() {
        let woff = sample_woff();
        let err = decode_woff(&woff[..WOFF_HEADER_LEN + 10]).unwrap_err();
        assert!(matches!(err, RenderError::Woff { .. }));
    }

    #[test]
    fn test_corrupt_stream_is_an_error() {
        let mut woff = sample_woff();
        let data_start = WOFF_HEADER_LEN + 2 * WOFF_TABLE_ENTRY_LEN;
        woff[data_start] ^= 0xFF;
        woff[data_start + 1] ^= 0xFF;
        assert!(decode_woff(&woff).is_err());
    }

    #[rstest]
    #[case(1, (16, 0, 0))]
    #[case(7, (64, 2, 48))]
    #[case(9, (128, 3, 16))]
    #[case(16, (256, 4, 0))]
    #[case(4095, (32768, 11, 32752))]
    fn test_search_params(#[case] tables: usize, #[case] expected: (u16, u16, u16)) {
        assert_eq!(search_params(tables), expected);
    }

    /// Header only, declaring `num_tables` and followed by `directory` zero bytes
    fn header_with_tables(num_tables: u16, directory: usize) -> Vec<u8> {
        let mut woff = Vec::new();
        woff.extend_from_slice(b"wOFF");
        woff.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        woff.extend_from_slice(&((WOFF_HEADER_LEN + directory) as u32).to_be_bytes());
        woff.extend_from_slice(&num_tables.to_be_bytes());
        woff.extend_from_slice(&[0u8; 30]);
        woff.resize(WOFF_HEADER_LEN + directory, 0);
        woff
    }

    #[rstest]
    #[case(4096)]
    #[case(u16::MAX)]
    fn test_table_count_beyond_sfnt_limit_is_rejected(#[case] num_tables: u16) {
        let woff = header_with_tables(num_tables, num_tables as usize * WOFF_TABLE_ENTRY_LEN);
        let err = decode_woff(&woff).unwrap_err();
        assert!(err.to_string().contains("exceeds the sfnt limit"), "{err}");
    }

    #[test]
    fn test_directory_past_end_of_file_is_rejected() {
        let woff = header_with_tables(10, 3 * WOFF_TABLE_ENTRY_LEN);
        let err = decode_woff(&woff).unwrap_err();
        assert!(err.to_string().contains("runs past end of file"), "{err}");
    }

    #[test]
    fn test_oversized_stream_stops_after_declared_length() {
        // 2 MiB of zeros deflates to a couple of KiB
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&vec![0u8; 2 << 20]).unwrap();
        let compressed = encoder.finish().unwrap();
        let declared = 4096usize;
        assert!(compressed.len() < declared);

        let mut woff = header_with_tables(1, WOFF_TABLE_ENTRY_LEN);
        let data_start = woff.len();
        woff[data_start - WOFF_TABLE_ENTRY_LEN..data_start - 16].copy_from_slice(b"glyf");
        woff[data_start - 16..data_start - 12].copy_from_slice(&(data_start as u32).to_be_bytes());
        woff[data_start - 12..data_start - 8]
            .copy_from_slice(&(compressed.len() as u32).to_be_bytes());
        woff[data_start - 8..data_start - 4].copy_from_slice(&(declared as u32).to_be_bytes());
        woff.extend_from_slice(&compressed);

        let err = decode_woff(&woff).unwrap_err();
        assert!(err.to_string().contains("inflates past its declared 4096 bytes"), "{err}");
    }

    #[test]
    fn test_declared_size_beyond_limit_is_rejected() {
        let mut woff = header_with_tables(1, WOFF_TABLE_ENTRY_LEN);
        let entry = WOFF_HEADER_LEN;
        woff[entry..entry + 4].copy_from_slice(b"glyf");
        woff[entry + 12..entry + 16].copy_from_slice(&u32::MAX.to_be_bytes());
        let err = decode_woff(&woff).unwrap_err();
        assert!(err.to_string().contains("limit is"), "{err}");
    }
}
