//! Canonical leaf encodings.
//!
//! Every variable-length field is framed as `u64_le(len) || bytes`; integers
//! are written little-endian at their full width.  With every field framed,
//! no two distinct field tuples share an encoding (`"ab" + "c"` and
//! `"a" + "bc"` differ in their length prefixes).

/// Canonical, unambiguous byte encoding of one record.
pub trait LeafEncode {
    /// Appends the record's canonical encoding to `out`.
    fn encode_leaf(&self, out: &mut Vec<u8>);

    /// Returns the canonical encoding as a fresh buffer.
    fn to_leaf_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_leaf(&mut out);
        out
    }
}

/// Appends a length-prefixed byte field.
pub fn put_field(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    out.extend_from_slice(bytes);
}

/// Encodes a raw payload into the canonical single-field leaf layout.
pub fn encode_leaf(payload: &[u8]) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(8 + payload.len());
    put_field(&mut encoded, payload);
    encoded
}

impl LeafEncode for [u8] {
    fn encode_leaf(&self, out: &mut Vec<u8>) {
        put_field(out, self);
    }
}

impl LeafEncode for Vec<u8> {
    fn encode_leaf(&self, out: &mut Vec<u8>) {
        put_field(out, self);
    }
}

impl LeafEncode for str {
    fn encode_leaf(&self, out: &mut Vec<u8>) {
        put_field(out, self.as_bytes());
    }
}

impl LeafEncode for String {
    fn encode_leaf(&self, out: &mut Vec<u8>) {
        put_field(out, self.as_bytes());
    }
}

impl<T: LeafEncode + ?Sized> LeafEncode for &T {
    fn encode_leaf(&self, out: &mut Vec<u8>) {
        (**self).encode_leaf(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str) -> Vec<u8> {
        let mut out = Vec::new();
        a.encode_leaf(&mut out);
        b.encode_leaf(&mut out);
        out
    }

    #[test]
    fn boundary_shift_does_not_collide() {
        assert_ne!(pair("ab", "c"), pair("a", "bc"));
        assert_ne!(pair("", "abc"), pair("abc", ""));
    }

    #[test]
    fn single_field_layout() {
        assert_eq!("X".to_leaf_bytes(), vec![1, 0, 0, 0, 0, 0, 0, 0, b'X']);
        assert_eq!(encode_leaf(b"X"), "X".to_leaf_bytes());
        assert_eq!(encode_leaf(&[]), vec![0u8; 8]);
    }

    #[test]
    fn owned_and_borrowed_forms_agree() {
        let owned = String::from("donation");
        assert_eq!(owned.to_leaf_bytes(), "donation".to_leaf_bytes());
        assert_eq!(b"donation".to_vec().to_leaf_bytes(), owned.to_leaf_bytes());
        assert_eq!((&owned).to_leaf_bytes(), owned.to_leaf_bytes());
    }
}
