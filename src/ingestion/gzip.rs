//! Gzip payload handling (`GZIP_JSON` report downloads).

use std::borrow::Cow;
use std::io::Read;

use flate2::read::GzDecoder;

use crate::error::ReportResult;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Returns `true` if `bytes` starts with the gzip magic number.
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Decompress a gzip stream held in memory.
pub fn decompress(bytes: &[u8]) -> ReportResult<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Decompress at most the first `limit` bytes of a gzip stream.
///
/// Enough to inspect the start of a large payload without inflating all of it.
pub fn decompress_prefix(bytes: &[u8], limit: u64) -> ReportResult<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).take(limit).read_to_end(&mut out)?;
    Ok(out)
}

/// Decompress `bytes` if they are gzip, otherwise borrow them unchanged.
///
/// HTTP clients often inflate `Content-Encoding: gzip` bodies on the fly, so a payload labelled
/// gzip may already be plain.
pub fn maybe_decompress(bytes: &[u8]) -> ReportResult<Cow<'_, [u8]>> {
    if is_gzip(bytes) {
        decompress(bytes).map(Cow::Owned)
    } else {
        Ok(Cow::Borrowed(bytes))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    use super::{decompress, decompress_prefix, is_gzip, maybe_decompress};

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn decompresses_gzip_payload() {
        let packed = gzip(br#"[{"clicks":1}]"#);
        assert!(is_gzip(&packed));
        assert_eq!(decompress(&packed).unwrap(), br#"[{"clicks":1}]"#.to_vec());
    }

    #[test]
    fn plain_bytes_pass_through() {
        assert!(!is_gzip(b"[]"));
        assert_eq!(&*maybe_decompress(b"[]").unwrap(), b"[]");
    }

    #[test]
    fn maybe_decompress_inflates_gzip() {
        let packed = gzip(b"sku,qty\nA,1\n");
        assert_eq!(&*maybe_decompress(&packed).unwrap(), b"sku,qty\nA,1\n");
    }

    #[test]
    fn prefix_stops_at_limit() {
        let body = "x".repeat(10_000);
        let packed = gzip(body.as_bytes());
        assert_eq!(decompress_prefix(&packed, 16).unwrap(), vec![b'x'; 16]);
        assert_eq!(decompress_prefix(&gzip(b"[]"), 16).unwrap(), b"[]".to_vec());
    }

    #[test]
    fn bad_header_is_io_error() {
        // Magic bytes followed by an unsupported compression method.
        let bogus = [0x1f, 0x8b, 0x00, 0x00, 0, 0, 0, 0, 0, 0xff, 1, 2, 3];
        let err = decompress(&bogus).unwrap_err();
        assert!(err.to_string().starts_with("io error"));
    }
}
