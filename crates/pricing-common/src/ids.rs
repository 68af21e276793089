/// Deterministic identifiers and digests.
///
/// Record ids hash the row position and product name, so extracting the same document
/// twice yields the same ids.
use sha2::{Digest, Sha256};

/// Position of a row inside a document: (page, table, row), all zero-based.
pub type RowPosition = (usize, usize, usize);

/// Build the record id for the row at `position`.
pub fn record_id(position: RowPosition, product_name: &str) -> String {
    let (page, table, row) = position;
    let mut h = Sha256::new();
    h.update((page as u64).to_le_bytes());
    h.update((table as u64).to_le_bytes());
    h.update((row as u64).to_le_bytes());
    h.update(product_name.as_bytes());
    let digest = h.finalize();
    hex_lower(&digest[..16])
}

/// Full SHA-256 of an uploaded document, used for log correlation.
pub fn document_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex_lower(&digest)
}

fn hex_lower(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_is_stable_and_position_sensitive() {
        let a = record_id((0, 0, 1), "Cimento");
        assert_eq!(a, record_id((0, 0, 1), "Cimento"));
        assert_eq!(a.len(), 32);
        assert_ne!(a, record_id((0, 0, 2), "Cimento"));
        assert_ne!(a, record_id((1, 0, 1), "Cimento"));
    }

    #[test]
    fn document_digest_matches_known_value() {
        assert_eq!(
            document_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
