//! UR (Uniform Resource) fragment parsing with case-insensitive scheme
//! per BCR-2020-005
use std::borrow::Cow;

use foundation_ur::UR as FoundationUr;

use crate::error::{Result, ToUrError as _, UrError};
use crate::ur_type::UrType;

/// Position of one fragment inside a multi-part UR, `ur:<type>/<index>-<count>/<fragment>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sequence {
    /// 1-based sequence number, values above `count` are fountain-mixed parts
    pub index: u32,
    /// Number of pure fragments the message was split into
    pub count: u32,
}

impl Sequence {
    /// Pure fragments carry exactly one segment of the message, mixed parts are XORs
    pub fn is_pure_fragment(&self) -> bool {
        self.index <= self.count
    }
}

/// Message description carried in the CBOR body of every multi-part fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FragmentHeader {
    pub sequence: u32,
    pub sequence_count: u32,
    /// Length of the reassembled message in bytes
    pub message_length: u64,
    /// CRC32 of the reassembled message
    pub checksum: u32,
    /// Length of the fragment data, equal for every part of one message
    pub fragment_length: u64,
}

impl FragmentHeader {
    /// Bytes a fountain decoder reserves for the padded message
    pub fn buffer_len(&self) -> u64 {
        self.fragment_length.saturating_mul(u64::from(self.sequence_count))
    }

    /// Whether both fragments were split from the same message
    pub fn same_message(&self, other: &Self) -> bool {
        self.sequence_count == other.sequence_count
            && self.message_length == other.message_length
            && self.checksum == other.checksum
            && self.fragment_length == other.fragment_length
    }
}

/// A validated UR string, lowercased if the scanner delivered it in uppercase
#[derive(Debug, Clone)]
pub struct Ur<'a> {
    text: Cow<'a, str>,
    ur_type: UrType,
    sequence: Option<Sequence>,
}

impl<'a> Ur<'a> {
    /// Parse a UR string, the scheme and type are case-insensitive
    ///
    /// # Errors
    /// Returns error if UR parsing fails
    pub fn parse(input: &'a str) -> Result<Self> {
        let input = input.trim();

        // QR alphanumeric mode forces uppercase, foundation_ur only accepts lowercase
        let text = match input.bytes().any(|b| b.is_ascii_uppercase()) {
            true => Cow::Owned(input.to_ascii_lowercase()),
            false => Cow::Borrowed(input),
        };

        let (ur_type, is_multi_part) = {
            let parsed = FoundationUr::parse(&text).map_err_ur_parse()?;
            let is_multi_part = matches!(
                parsed,
                FoundationUr::MultiPart { .. } | FoundationUr::MultiPartDeserialized { .. }
            );

            (UrType::from(parsed.as_type()), is_multi_part)
        };

        let sequence = match is_multi_part {
            true => Some(parse_sequence(&text)?),
            false => None,
        };

        Ok(Self { text, ur_type, sequence })
    }

    /// Get the UR type (e.g., "bytes", "crypto-account")
    pub fn ur_type(&self) -> &UrType {
        &self.ur_type
    }

    /// Sequence position, `None` for single-part URs
    pub fn sequence(&self) -> Option<Sequence> {
        self.sequence
    }

    pub fn is_single_part(&self) -> bool {
        self.sequence.is_none()
    }

    /// The normalized (lowercase) UR string
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Get a `foundation_ur::UR` that borrows from self
    ///
    /// # Errors
    /// Returns error if UR parsing fails
    pub fn to_foundation_ur(&self) -> Result<FoundationUr<'_>> {
        FoundationUr::parse(&self.text).map_err_ur_parse()
    }

    /// Decode the bytewords body of a single-part UR, verifying its CRC32 checksum
    ///
    /// # Errors
    /// Returns error for multi-part URs or a corrupt bytewords body
    pub fn single_part_message(&self) -> Result<Vec<u8>> {
        match self.to_foundation_ur()? {
            FoundationUr::SinglePart { message, .. } => {
                foundation_ur::bytewords::decode(message, foundation_ur::bytewords::Style::Minimal)
                    .map_err_ur_parse()
            }
            FoundationUr::SinglePartDeserialized { message, .. } => Ok(message.to_vec()),
            FoundationUr::MultiPart { .. } | FoundationUr::MultiPartDeserialized { .. } => Err(
                UrError::InvalidField("multi-part UR has no standalone message".into()),
            ),
        }
    }

    /// Decode the fragment header of a multi-part UR without touching a fountain decoder
    ///
    /// # Errors
    /// Returns error for single-part URs or a fragment body that is not a valid part
    pub fn fragment_header(&self) -> Result<FragmentHeader> {
        let ur = self.to_foundation_ur()?;
        if !ur.is_multi_part() {
            return Err(UrError::InvalidField("single-part UR has no fragment header".into()));
        }

        if let Some(part) = ur.as_part() {
            return Ok(FragmentHeader {
                sequence: part.sequence,
                sequence_count: part.sequence_count,
                message_length: part.message_length as u64,
                checksum: part.checksum,
                fragment_length: part.data.len() as u64,
            });
        }

        let bytewords = ur
            .as_bytewords()
            .ok_or_else(|| UrError::InvalidField("multi-part UR without a fragment".into()))?;

        let cbor = foundation_ur::bytewords::decode(bytewords, foundation_ur::bytewords::Style::Minimal)
            .map_err_ur_parse()?;

        decode_fragment_header(&cbor).map_err(|e| UrError::CborDecodeError(e.to_string()))
    }
}

/// `[sequence, sequence_count, message_length, checksum, data]`
fn decode_fragment_header(cbor: &[u8]) -> std::result::Result<FragmentHeader, minicbor::decode::Error> {
    let mut decoder = minicbor::Decoder::new(cbor);
    if decoder.array()? != Some(5) {
        return Err(minicbor::decode::Error::message("fragment is not a 5 element array"));
    }

    Ok(FragmentHeader {
        sequence: decoder.u32()?,
        sequence_count: decoder.u32()?,
        message_length: decoder.u32()?.into(),
        checksum: decoder.u32()?,
        fragment_length: decoder.bytes()?.len() as u64,
    })
}

/// Read `<index>-<count>` from the path segment between the type and the fragment
fn parse_sequence(text: &str) -> Result<Sequence> {
    let invalid = || UrError::InvalidField(format!("Missing UR sequence in: {text}"));

    let path = text.strip_prefix("ur:").ok_or_else(invalid)?;
    let mut segments = path.split('/');
    let _ur_type = segments.next().ok_or_else(invalid)?;
    let sequence = segments.next().ok_or_else(invalid)?;

    let (index, count) = sequence.split_once('-').ok_or_else(invalid)?;
    let index = index.parse::<u32>().map_err(|_| invalid())?;
    let count = count.parse::<u32>().map_err(|_| invalid())?;

    if index == 0 || count == 0 {
        return Err(invalid());
    }

    Ok(Sequence { index, count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation_ur::{Encoder, UR};
    use pretty_assertions::assert_eq;

    fn cbor_bytes(payload: &[u8]) -> Vec<u8> {
        let mut cbor = Vec::new();
        minicbor::Encoder::new(&mut cbor).bytes(payload).unwrap();
        cbor
    }

    #[test]
    fn test_parse_single_part_lowercase() {
        let cbor = cbor_bytes(b"portfolio");
        let text = UR::new("bytes", &cbor).to_string();

        let ur = Ur::parse(&text).unwrap();
        assert_eq!(ur.ur_type(), &UrType::Bytes);
        assert!(ur.is_single_part());
        assert_eq!(ur.sequence(), None);
        assert_eq!(ur.single_part_message().unwrap(), cbor);
    }

    #[test]
    fn test_parse_single_part_uppercase_is_normalized() {
        let cbor = cbor_bytes(b"portfolio");
        let text = UR::new("bytes", &cbor).to_string().to_uppercase();

        let ur = Ur::parse(&text).unwrap();
        assert!(ur.as_str().starts_with("ur:bytes/"));
        assert_eq!(ur.single_part_message().unwrap(), cbor);
    }

    #[test]
    fn test_parse_multi_part_sequence() {
        let cbor = cbor_bytes(&[0xAB; 64]);
        let mut encoder = Encoder::new();
        encoder.start("bytes", &cbor, 20);

        let count = encoder.sequence_count();
        assert!(count > 1, "payload should need several fragments");

        for expected_index in 1..=count {
            let text = encoder.next_part().to_string();
            let ur = Ur::parse(&text).unwrap();

            assert_eq!(ur.ur_type(), &UrType::Bytes);
            assert_eq!(ur.sequence(), Some(Sequence { index: expected_index, count }));
            assert!(ur.sequence().unwrap().is_pure_fragment());
            assert!(ur.single_part_message().is_err());
        }

        // past the pure fragments the encoder emits fountain-mixed parts
        let mixed = encoder.next_part().to_string();
        let sequence = Ur::parse(&mixed).unwrap().sequence().unwrap();
        assert!(!sequence.is_pure_fragment());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Ur::parse("").is_err());
        assert!(Ur::parse("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq").is_err());

        // the body is only checked once the message is decoded
        for text in ["ur:bytes/", "ur:bytes/not!!bytewords"] {
            let message = Ur::parse(text).and_then(|ur| ur.single_part_message());
            assert!(message.is_err(), "{text} should not decode");
        }
    }

    #[test]
    fn test_fragment_header_matches_encoder() {
        let cbor = cbor_bytes(&[0x5A; 64]);
        let mut encoder = Encoder::new();
        encoder.start("bytes", &cbor, 20);
        let count = encoder.sequence_count();

        let first = Ur::parse(&encoder.next_part().to_string()).unwrap().fragment_header().unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(first.sequence_count, count);
        assert_eq!(first.message_length, cbor.len() as u64);
        assert!(first.buffer_len() >= first.message_length);

        let second = Ur::parse(&encoder.next_part().to_string()).unwrap().fragment_header().unwrap();
        assert_eq!(second.sequence, 2);
        assert!(first.same_message(&second));

        let mut other_encoder = Encoder::new();
        let other = cbor_bytes(&[0xA5; 64]);
        other_encoder.start("bytes", &other, 20);
        let other_first =
            Ur::parse(&other_encoder.next_part().to_string()).unwrap().fragment_header().unwrap();
        assert!(!first.same_message(&other_first));
    }

    #[test]
    fn test_fragment_header_rejects_single_part_and_bad_body() {
        let single = UR::new("bytes", &cbor_bytes(b"portfolio")).to_string();
        assert!(matches!(
            Ur::parse(&single).unwrap().fragment_header(),
            Err(UrError::InvalidField(_))
        ));

        // valid bytewords whose CBOR is a byte string, not a part array
        let body = foundation_ur::bytewords::encode(&cbor_bytes(b"xy"), foundation_ur::bytewords::Style::Minimal);
        let text = format!("ur:bytes/1-2/{body}");
        assert!(matches!(
            Ur::parse(&text).unwrap().fragment_header(),
            Err(UrError::CborDecodeError(_))
        ));
    }

    #[test]
    fn test_parse_sequence_segment() {
        assert_eq!(
            parse_sequence("ur:bytes/3-7/lpaxatcf").unwrap(),
            Sequence { index: 3, count: 7 }
        );
        assert!(parse_sequence("ur:bytes/0-7/lpaxatcf").is_err());
        assert!(parse_sequence("ur:bytes/3/lpaxatcf").is_err());
        assert!(parse_sequence("bytes/3-7/lpaxatcf").is_err());
    }
}
