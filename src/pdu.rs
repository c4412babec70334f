//! Schema-driven packing and unpacking of PDU bit fields
//!
//! A PDU type is described by an ordered table of field layouts ([`PduSchema`]) rather than by
//! per-type generated code; one generic engine packs and unpacks every PDU type against its
//! table. Schemas are immutable once built and are meant to be defined from configuration data
//! (they round-trip through JSON) and shared read-only across all calls.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{Bit, Error};

/// Value of one decoded or to-be-encoded field
#[derive(Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub enum FieldValue {
    /// Raw bit array, passed through unchanged
    Bits(Vec<Bit>),
    /// Bits packed into bytes, most-significant bit first, final partial byte zero-padded
    Bytes(Vec<u8>),
    /// Unsigned integer accumulated most-significant bit first
    Uint(u64),
}

/// Value kind of a field
#[derive(Clone, Eq, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub enum FieldKind {
    /// Raw bit array
    Bits,
    /// Byte array
    Bytes,
    /// Unsigned integer
    Uint,
}

/// Layout of one information element within a PDU
#[derive(Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub struct FieldSpec {
    /// Name of the information element
    pub name: String,
    /// Length of the element in bits
    pub num_bits: usize,
    /// Value kind the bits convert to and from
    pub kind: FieldKind,
    /// Default value, also the reference value for constant fields
    pub default: FieldValue,
    /// Constant fields must decode to their default for the PDU to be valid
    pub constant: bool,
}

impl FieldSpec {
    /// Returns an unsigned-integer field layout.
    #[must_use]
    pub fn uint(name: &str, num_bits: usize, default: u64, constant: bool) -> Self {
        Self {
            name: name.to_string(),
            num_bits,
            kind: FieldKind::Uint,
            default: FieldValue::Uint(default),
            constant,
        }
    }

    /// Returns a bit-array field layout with an all-zero default.
    #[must_use]
    pub fn bits(name: &str, num_bits: usize) -> Self {
        Self {
            name: name.to_string(),
            num_bits,
            kind: FieldKind::Bits,
            default: FieldValue::Bits(vec![Bit::Zero; num_bits]),
            constant: false,
        }
    }

    /// Returns a byte-array field layout with an all-zero default.
    #[must_use]
    pub fn bytes(name: &str, num_bits: usize) -> Self {
        Self {
            name: name.to_string(),
            num_bits,
            kind: FieldKind::Bytes,
            default: FieldValue::Bytes(vec![0; num_bits.div_ceil(8)]),
            constant: false,
        }
    }
}

/// Ordered, immutable field layout of one PDU type
#[derive(Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
#[serde(try_from = "Vec<FieldSpec>", into = "Vec<FieldSpec>")]
pub struct PduSchema {
    fields: Vec<FieldSpec>,
}

impl TryFrom<Vec<FieldSpec>> for PduSchema {
    type Error = Error;

    fn try_from(fields: Vec<FieldSpec>) -> Result<Self, Error> {
        Self::new(fields)
    }
}

impl From<PduSchema> for Vec<FieldSpec> {
    fn from(schema: PduSchema) -> Self {
        schema.fields
    }
}

impl PduSchema {
    /// Returns the schema for a given ordered field table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is empty, if a field name repeats, if any field is zero
    /// bits wide, if an integer field is wider than 64 bits, or if a default value does not
    /// match its field's kind and width.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, Error> {
        if fields.is_empty() {
            return Err(Error::InvalidInput(
                "PDU schema cannot be empty".to_string(),
            ));
        }
        if !fields.iter().map(|spec| spec.name.as_str()).all_unique() {
            return Err(Error::InvalidInput(
                "PDU field names must be unique".to_string(),
            ));
        }
        for spec in &fields {
            if spec.num_bits == 0 {
                return Err(Error::InvalidInput(format!(
                    "Field \"{}\" cannot be zero bits wide",
                    spec.name
                )));
            }
            if spec.kind == FieldKind::Uint && spec.num_bits > 64 {
                return Err(Error::InvalidInput(format!(
                    "Integer field \"{}\" cannot be wider than 64 bits (found {})",
                    spec.name, spec.num_bits
                )));
            }
            // The default must itself pack cleanly
            value_to_bits(&spec.default, spec, &mut Vec::with_capacity(spec.num_bits))?;
        }
        Ok(Self { fields })
    }

    /// Returns the schema parsed from its JSON representation (an array of field layouts).
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the field table is invalid.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the ordered field layouts.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Returns the total PDU length in bits.
    #[must_use]
    pub fn num_bits(&self) -> usize {
        self.fields.iter().map(|spec| spec.num_bits).sum()
    }

    /// Returns a record populated with every field's default value.
    #[must_use]
    pub fn default_record(&self) -> PduRecord {
        PduRecord {
            fields: self
                .fields
                .iter()
                .map(|spec| (spec.name.clone(), spec.default.clone()))
                .collect(),
            valid: true,
        }
    }

    /// Unpacks PDU bits into named field values, in schema order.
    ///
    /// A constant field decoding to something other than its default clears the record's
    /// validity flag; the field values are still returned so a malformed PDU can be inspected.
    ///
    /// # Errors
    ///
    /// Returns an error if `bits.len()` is not equal to `self.num_bits()`.
    pub fn unpack(&self, bits: &[Bit]) -> Result<PduRecord, Error> {
        if bits.len() != self.num_bits() {
            return Err(Error::InvalidInput(format!(
                "Invalid PDU length (expected {} bits, found {})",
                self.num_bits(),
                bits.len()
            )));
        }
        let mut record = PduRecord {
            fields: Vec::with_capacity(self.fields.len()),
            valid: true,
        };
        let mut cursor = 0;
        for spec in &self.fields {
            let value = bits_to_value(&bits[cursor .. cursor + spec.num_bits], spec.kind);
            if spec.constant && value != spec.default {
                record.valid = false;
            }
            record.fields.push((spec.name.clone(), value));
            cursor += spec.num_bits;
        }
        Ok(record)
    }

    /// Packs a record's field values into PDU bits, in schema order. The output length always
    /// equals `self.num_bits()`. Constant fields absent from the record fall back to their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a non-constant field is absent from the record, if a value's kind
    /// does not match its field, or if a value does not fit in its declared bit width.
    pub fn pack(&self, record: &PduRecord) -> Result<Vec<Bit>, Error> {
        let mut bits = Vec::with_capacity(self.num_bits());
        for spec in &self.fields {
            let value = match record.get(&spec.name) {
                Some(value) => value,
                None if spec.constant => &spec.default,
                None => {
                    return Err(Error::InvalidInput(format!(
                        "Field \"{}\" missing from record",
                        spec.name
                    )))
                }
            };
            value_to_bits(value, spec, &mut bits)?;
        }
        Ok(bits)
    }
}

/// Decoded (or to-be-encoded) PDU: ordered (name, value) pairs plus a validity flag
#[derive(Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub struct PduRecord {
    fields: Vec<(String, FieldValue)>,
    valid: bool,
}

impl PduRecord {
    /// Returns the value of a named field, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, value)| value)
    }

    /// Returns the value of a named unsigned-integer field, if present and of that kind.
    #[must_use]
    pub fn uint(&self, name: &str) -> Option<u64> {
        match self.get(name) {
            Some(&FieldValue::Uint(value)) => Some(value),
            _ => None,
        }
    }

    /// Sets the value of a named field, replacing an existing entry or appending a new one.
    pub fn set(&mut self, name: &str, value: FieldValue) {
        match self.fields.iter_mut().find(|(field_name, _)| field_name == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Returns the ordered (name, value) pairs.
    #[must_use]
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// Returns `true` if every constant field matched its default when the record was unpacked
    /// and no outer check has failed since.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Clears the validity flag. Used when an outer check over the same payload, such as the
    /// block CRC, fails.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }
}

/// Converts a field's bits to a value of the given kind.
fn bits_to_value(bits: &[Bit], kind: FieldKind) -> FieldValue {
    match kind {
        FieldKind::Bits => FieldValue::Bits(bits.to_vec()),
        FieldKind::Bytes => FieldValue::Bytes(
            bits.chunks(8)
                .map(|chunk| {
                    let mut byte = 0u8;
                    for (i, &bit) in chunk.iter().enumerate() {
                        byte |= (bit as u8) << (7 - i);
                    }
                    byte
                })
                .collect(),
        ),
        FieldKind::Uint => {
            FieldValue::Uint(bits.iter().fold(0u64, |acc, &bit| (acc << 1) | bit as u64))
        }
    }
}

/// Converts a field value back into exactly `spec.num_bits` bits, appending to `bits`.
fn value_to_bits(value: &FieldValue, spec: &FieldSpec, bits: &mut Vec<Bit>) -> Result<(), Error> {
    match (value, spec.kind) {
        (FieldValue::Bits(field_bits), FieldKind::Bits) => {
            if field_bits.len() != spec.num_bits {
                return Err(Error::InvalidInput(format!(
                    "Field \"{}\" must hold {} bits (found {})",
                    spec.name,
                    spec.num_bits,
                    field_bits.len()
                )));
            }
            bits.extend_from_slice(field_bits);
        }
        (FieldValue::Bytes(bytes), FieldKind::Bytes) => {
            if bytes.len() != spec.num_bits.div_ceil(8) {
                return Err(Error::InvalidInput(format!(
                    "Field \"{}\" must hold {} bytes (found {})",
                    spec.name,
                    spec.num_bits.div_ceil(8),
                    bytes.len()
                )));
            }
            if spec.num_bits % 8 != 0
                && bytes[bytes.len() - 1] & ((1 << (8 - spec.num_bits % 8)) - 1) != 0
            {
                return Err(Error::FieldOverflow(format!(
                    "Padding bits of field \"{}\" must be zero",
                    spec.name
                )));
            }
            bits.extend((0 .. spec.num_bits).map(|i| {
                if bytes[i / 8] >> (7 - i % 8) & 1 == 1 {
                    Bit::One
                } else {
                    Bit::Zero
                }
            }));
        }
        (&FieldValue::Uint(value), FieldKind::Uint) => {
            if spec.num_bits < 64 && value >> spec.num_bits != 0 {
                return Err(Error::FieldOverflow(format!(
                    "Value {value} of field \"{}\" does not fit in {} bits",
                    spec.name, spec.num_bits
                )));
            }
            bits.extend((0 .. spec.num_bits).rev().map(|i| {
                if value >> i & 1 == 1 {
                    Bit::One
                } else {
                    Bit::Zero
                }
            }));
        }
        _ => {
            return Err(Error::InvalidInput(format!(
                "Value kind of field \"{}\" does not match its layout",
                spec.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests_of_pdu_schema {
    use super::*;
    use crate::utils::bits_from_str;
    use Bit::{One, Zero};

    fn test_schema() -> PduSchema {
        PduSchema::new(vec![
            FieldSpec::uint("Kind", 3, 5, true),
            FieldSpec::uint("Count", 12, 0, false),
            FieldSpec::bits("Flags", 5),
            FieldSpec::bytes("Payload", 12),
        ])
        .unwrap()
    }

    #[test]
    fn test_new() {
        // Invalid input
        assert!(PduSchema::new(vec![]).is_err());
        assert!(PduSchema::new(vec![
            FieldSpec::uint("A", 3, 0, false),
            FieldSpec::uint("A", 4, 0, false),
        ])
        .is_err());
        assert!(PduSchema::new(vec![FieldSpec::uint("A", 0, 0, false)]).is_err());
        assert!(PduSchema::new(vec![FieldSpec::uint("A", 65, 0, false)]).is_err());
        // Default must fit the declared width
        assert!(PduSchema::new(vec![FieldSpec::uint("A", 2, 4, true)]).is_err());
        // Valid input
        assert_eq!(test_schema().num_bits(), 32);
    }

    #[test]
    fn test_unpack() {
        let schema = test_schema();
        // Length mismatch
        assert!(schema.unpack(&[Zero; 31]).is_err());
        // Kind = 5, Count = 1930, Flags = 01101, Payload = 0xA5C (padded to 0xA5, 0xC0)
        let record = schema
            .unpack(&bits_from_str("10101111000101001101101001011100"))
            .unwrap();
        assert!(record.is_valid());
        assert_eq!(record.uint("Kind"), Some(5));
        assert_eq!(record.uint("Count"), Some(1930));
        assert_eq!(
            record.get("Flags"),
            Some(&FieldValue::Bits(vec![Zero, One, One, Zero, One]))
        );
        assert_eq!(record.get("Payload"), Some(&FieldValue::Bytes(vec![0xA5, 0xC0])));
        // Field enumeration preserves schema order
        let names: Vec<&str> = record.fields().iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["Kind", "Count", "Flags", "Payload"]);
    }

    #[test]
    fn test_unpack_constant_mismatch() {
        let schema = test_schema();
        // Kind decodes to 4 instead of the declared constant 5
        let record = schema
            .unpack(&bits_from_str("10001111000101001101101001011100"))
            .unwrap();
        assert!(!record.is_valid());
        // The mismatched value is still exposed for inspection
        assert_eq!(record.uint("Kind"), Some(4));
        assert_eq!(record.uint("Count"), Some(1930));
    }

    #[test]
    fn test_pack() {
        let schema = test_schema();
        let mut record = schema.default_record();
        record.set("Count", FieldValue::Uint(1930));
        record.set("Flags", FieldValue::Bits(vec![Zero, One, One, Zero, One]));
        record.set("Payload", FieldValue::Bytes(vec![0xA5, 0xC0]));
        assert_eq!(
            schema.pack(&record).unwrap(),
            bits_from_str("10101111000101001101101001011100")
        );
    }

    #[test]
    fn test_pack_round_trip() {
        let schema = test_schema();
        let bits = bits_from_str("10101111000101001101101001011100");
        let record = schema.unpack(&bits).unwrap();
        assert_eq!(schema.pack(&record).unwrap(), bits);
    }

    #[test]
    fn test_pack_missing_field() {
        let schema = test_schema();
        let mut record = schema.default_record();
        record.set("Count", FieldValue::Uint(7));
        // A constant field may be absent: it falls back to its default
        let mut partial = record.clone();
        partial.fields.retain(|(name, _)| name != "Kind");
        assert_eq!(schema.pack(&partial).unwrap(), schema.pack(&record).unwrap());
        // A non-constant field may not
        partial.fields.retain(|(name, _)| name != "Count");
        assert!(schema.pack(&partial).is_err());
    }

    #[test]
    fn test_pack_overflow() {
        let schema = test_schema();
        // Integer wider than its field
        let mut record = schema.default_record();
        record.set("Count", FieldValue::Uint(4096));
        assert!(matches!(
            schema.pack(&record),
            Err(Error::FieldOverflow(_))
        ));
        // Nonzero padding bits in a byte array
        let mut record = schema.default_record();
        record.set("Payload", FieldValue::Bytes(vec![0xA5, 0xCF]));
        assert!(matches!(
            schema.pack(&record),
            Err(Error::FieldOverflow(_))
        ));
    }

    #[test]
    fn test_pack_kind_mismatch() {
        let schema = test_schema();
        let mut record = schema.default_record();
        record.set("Count", FieldValue::Bits(vec![Zero; 12]));
        assert!(schema.pack(&record).is_err());
        // Wrong bit-array length
        let mut record = schema.default_record();
        record.set("Flags", FieldValue::Bits(vec![Zero; 4]));
        assert!(schema.pack(&record).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let schema = test_schema();
        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(PduSchema::from_json(&json).unwrap(), schema);
        // Validation also runs on deserialized tables
        assert!(PduSchema::from_json("[]").is_err());
    }
}
