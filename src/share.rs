use core::fmt;

use serde::{
    de::{self, SeqAccess, Visitor},
    ser::SerializeSeq,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::error::Error;
use crate::field::Gf256;

/// One point `(x, P(x))` of a sharing polynomial.
///
/// `x` identifies the player and is never zero; `y` is the polynomial evaluated at `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Share {
    pub x: Gf256,
    pub y: Gf256,
}

impl Share {
    pub fn new(x: Gf256, y: Gf256) -> Self {
        Share { x, y }
    }
}

/// Everything one player holds for a multi-byte secret: its x-coordinate and one y-value per
/// secret byte.
///
/// The persisted form is the raw byte sequence `[x, y_0, y_1, ..]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareEntry {
    pub x: Gf256,
    pub ys: Vec<u8>,
}

impl ShareEntry {
    pub fn new(x: Gf256, ys: Vec<u8>) -> Self {
        ShareEntry { x, ys }
    }

    /// Number of secret bytes covered by this entry.
    pub fn len(&self) -> usize {
        self.ys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ys.is_empty()
    }

    /// The single-byte share at secret position `index`.
    pub fn share_at(&self, index: usize) -> Option<Share> {
        self.ys
            .get(index)
            .map(|&y| Share::new(self.x, Gf256::new(y)))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.ys.len() + 1);
        bytes.push(self.x.value());
        bytes.extend_from_slice(&self.ys);
        bytes
    }

    /// Parses the persisted layout.
    ///
    /// # Errors
    ///
    /// * [`Error::MalformedShare`] if `bytes` is empty.
    /// * [`Error::ZeroAbscissa`] if the leading x-coordinate is zero.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let (&x, ys) = bytes
            .split_first()
            .ok_or_else(|| Error::MalformedShare("missing x-coordinate".to_string()))?;
        if x == 0 {
            return Err(Error::ZeroAbscissa);
        }
        Ok(ShareEntry::new(Gf256::new(x), ys.to_vec()))
    }
}

/// Serializes a `ShareEntry` as its persisted byte sequence.
impl Serialize for ShareEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.ys.len() + 1))?;
        seq.serialize_element(&self.x.value())?;
        for y in &self.ys {
            seq.serialize_element(y)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for ShareEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ShareEntryVisitor;

        impl<'de> Visitor<'de> for ShareEntryVisitor {
            type Value = ShareEntry;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a sequence of bytes: x-coordinate followed by y-values")
            }

            fn visit_seq<V>(self, mut seq: V) -> Result<ShareEntry, V::Error>
            where
                V: SeqAccess<'de>,
            {
                let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                ShareEntry::from_bytes(&bytes).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_seq(ShareEntryVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_byte_layout() {
        let entry = ShareEntry::new(Gf256::new(4), vec![9, 8, 7]);
        assert_eq!(entry.to_bytes(), vec![4, 9, 8, 7]);
        assert_eq!(ShareEntry::from_bytes(&[4, 9, 8, 7]).unwrap(), entry);
    }

    #[test]
    fn test_entry_without_ys() {
        let entry = ShareEntry::from_bytes(&[1]).unwrap();
        assert!(entry.is_empty());
        assert_eq!(entry.share_at(0), None);
    }

    #[test]
    fn test_entry_rejects_bad_bytes() {
        assert!(matches!(
            ShareEntry::from_bytes(&[]),
            Err(Error::MalformedShare(_))
        ));
        assert_eq!(ShareEntry::from_bytes(&[0, 1, 2]), Err(Error::ZeroAbscissa));
    }

    #[test]
    fn test_share_at() {
        let entry = ShareEntry::new(Gf256::new(2), vec![10, 20]);
        assert_eq!(
            entry.share_at(1),
            Some(Share::new(Gf256::new(2), Gf256::new(20)))
        );
    }

    #[test]
    fn test_entry_serde_json() {
        let entry = ShareEntry::new(Gf256::new(3), vec![1, 255]);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, "[3,1,255]");
        let back: ShareEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
        assert!(serde_json::from_str::<ShareEntry>("[0,1]").is_err());
    }

    #[test]
    fn test_share_serde_json() {
        let share = Share::new(Gf256::new(5), Gf256::new(77));
        let json = serde_json::to_string(&share).unwrap();
        assert_eq!(json, r#"{"x":5,"y":77}"#);
    }
}
