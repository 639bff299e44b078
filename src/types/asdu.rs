//! IEC 60870-5-104 ASDU (Application Service Data Unit).
//!
//! The ASDU is the application payload of an I-frame: a fixed header
//! (type identification, variable structure qualifier, cause of
//! transmission, common address) followed by one or more information
//! objects. Field widths that CS101/CS104 leave configurable are carried
//! by [`AsduParameters`], passed explicitly into every parse and encode
//! call; both ends of a link must use the same parameter set for the
//! lifetime of the connection.

use bytes::{BufMut, BytesMut};

use crate::error::{Iec104Error, Result};
use crate::types::{Cot, InformationElement, InformationObject, TypeId};

/// Configurable ASDU field widths.
///
/// The CS104 defaults (2-byte common address, 2-byte cause including the
/// originator octet, 3-byte information object address) match lib60870's
/// connection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsduParameters {
    /// Size of the common address field in bytes (1 or 2)
    pub ca_size: u8,
    /// Size of the cause-of-transmission field in bytes (1 or 2);
    /// 2 means an originator address octet follows the cause octet
    pub cot_size: u8,
    /// Size of the information object address field in bytes (1 to 3)
    pub ioa_size: u8,
}

impl Default for AsduParameters {
    fn default() -> Self {
        Self {
            ca_size: 2,
            cot_size: 2,
            ioa_size: 3,
        }
    }
}

impl AsduParameters {
    /// Check the field sizes are within the ranges the standard allows.
    pub fn validate(&self) -> Result<()> {
        if !(1..=2).contains(&self.ca_size) {
            return Err(Iec104Error::protocol_static(
                "common address size must be 1 or 2",
            ));
        }
        if !(1..=2).contains(&self.cot_size) {
            return Err(Iec104Error::protocol_static(
                "cause of transmission size must be 1 or 2",
            ));
        }
        if !(1..=3).contains(&self.ioa_size) {
            return Err(Iec104Error::protocol_static(
                "information object address size must be 1 to 3",
            ));
        }
        Ok(())
    }

    /// Encoded length of the ASDU header under these parameters.
    #[inline]
    pub fn header_len(&self) -> usize {
        2 + self.cot_size as usize + self.ca_size as usize
    }
}

/// Variable Structure Qualifier (VSQ).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vsq {
    /// Number of information objects (0-127)
    pub count: u8,
    /// If true, only the first object carries an explicit address and
    /// subsequent addresses increment by one (SQ=1)
    pub sequence: bool,
}

impl Vsq {
    /// Create a new VSQ.
    #[inline]
    pub const fn new(count: u8, sequence: bool) -> Self {
        Self { count, sequence }
    }

    /// Parse VSQ from byte.
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        Self {
            count: value & 0x7F,
            sequence: (value & 0x80) != 0,
        }
    }

    /// Encode VSQ to byte.
    #[inline]
    pub const fn as_u8(&self) -> u8 {
        (self.count & 0x7F) | if self.sequence { 0x80 } else { 0 }
    }
}

/// Quality descriptor for single/double point information (SIQ/DIQ bits 4-7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QualityDescriptor {
    /// Blocked (BL)
    pub blocked: bool,
    /// Substituted (SB)
    pub substituted: bool,
    /// Not topical (NT)
    pub not_topical: bool,
    /// Invalid (IV)
    pub invalid: bool,
}

impl QualityDescriptor {
    /// Create a quality descriptor with all flags clear.
    pub const fn new() -> Self {
        Self {
            blocked: false,
            substituted: false,
            not_topical: false,
            invalid: false,
        }
    }

    /// Create a quality descriptor indicating invalid data.
    pub const fn invalid() -> Self {
        Self {
            invalid: true,
            blocked: false,
            substituted: false,
            not_topical: false,
        }
    }

    /// Parse from the upper nibble of a SIQ/DIQ octet.
    pub const fn from_raw(value: u8) -> Self {
        Self {
            blocked: (value & 0x10) != 0,
            substituted: (value & 0x20) != 0,
            not_topical: (value & 0x40) != 0,
            invalid: (value & 0x80) != 0,
        }
    }

    /// Encode to the upper nibble of a SIQ/DIQ octet (value bits clear).
    pub const fn to_raw(&self) -> u8 {
        let mut result = 0u8;
        if self.blocked {
            result |= 0x10;
        }
        if self.substituted {
            result |= 0x20;
        }
        if self.not_topical {
            result |= 0x40;
        }
        if self.invalid {
            result |= 0x80;
        }
        result
    }

    /// Check if the quality is good (all flags clear).
    pub const fn is_good(&self) -> bool {
        !self.blocked && !self.substituted && !self.not_topical && !self.invalid
    }
}

/// Quality descriptor for measured values (QDS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeasuredQuality {
    /// Overflow (OV)
    pub overflow: bool,
    /// Blocked (BL)
    pub blocked: bool,
    /// Substituted (SB)
    pub substituted: bool,
    /// Not topical (NT)
    pub not_topical: bool,
    /// Invalid (IV)
    pub invalid: bool,
}

impl MeasuredQuality {
    /// Create a quality descriptor with all flags clear.
    pub const fn new() -> Self {
        Self {
            overflow: false,
            blocked: false,
            substituted: false,
            not_topical: false,
            invalid: false,
        }
    }

    /// Create a quality descriptor indicating invalid data.
    pub const fn invalid() -> Self {
        Self {
            invalid: true,
            overflow: false,
            blocked: false,
            substituted: false,
            not_topical: false,
        }
    }

    /// Parse from QDS byte.
    pub const fn from_u8(value: u8) -> Self {
        Self {
            overflow: (value & 0x01) != 0,
            blocked: (value & 0x10) != 0,
            substituted: (value & 0x20) != 0,
            not_topical: (value & 0x40) != 0,
            invalid: (value & 0x80) != 0,
        }
    }

    /// Encode to QDS byte.
    pub const fn as_u8(&self) -> u8 {
        let mut result = 0u8;
        if self.overflow {
            result |= 0x01;
        }
        if self.blocked {
            result |= 0x10;
        }
        if self.substituted {
            result |= 0x20;
        }
        if self.not_topical {
            result |= 0x40;
        }
        if self.invalid {
            result |= 0x80;
        }
        result
    }

    /// Check if the quality is good (all flags clear).
    pub const fn is_good(&self) -> bool {
        !self.overflow && !self.blocked && !self.substituted && !self.not_topical && !self.invalid
    }
}

/// CP56Time2a timestamp (7 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cp56Time2a {
    /// Milliseconds within the minute (0-59999; seconds are folded in)
    pub milliseconds: u16,
    /// Minutes (0-59)
    pub minutes: u8,
    /// Hours (0-23)
    pub hours: u8,
    /// Day of month (1-31)
    pub day: u8,
    /// Day of week (1-7, 1=Monday, 0=unused)
    pub day_of_week: u8,
    /// Month (1-12)
    pub month: u8,
    /// Year (0-99, years since 2000)
    pub year: u8,
    /// Invalid flag
    pub invalid: bool,
    /// Summer time flag
    pub summer_time: bool,
}

impl Cp56Time2a {
    /// Parse from 7 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 7 {
            return Err(Iec104Error::malformed_asdu_static("CP56Time2a too short"));
        }

        Ok(Self {
            milliseconds: bytes[0] as u16 | ((bytes[1] as u16) << 8),
            minutes: bytes[2] & 0x3F,
            invalid: (bytes[2] & 0x80) != 0,
            hours: bytes[3] & 0x1F,
            summer_time: (bytes[3] & 0x80) != 0,
            day: bytes[4] & 0x1F,
            day_of_week: (bytes[4] >> 5) & 0x07,
            month: bytes[5] & 0x0F,
            year: bytes[6] & 0x7F,
        })
    }

    /// Encode to 7 bytes.
    pub fn to_bytes(&self) -> [u8; 7] {
        [
            (self.milliseconds & 0xFF) as u8,
            ((self.milliseconds >> 8) & 0xFF) as u8,
            (self.minutes & 0x3F) | if self.invalid { 0x80 } else { 0 },
            (self.hours & 0x1F) | if self.summer_time { 0x80 } else { 0 },
            (self.day & 0x1F) | ((self.day_of_week & 0x07) << 5),
            self.month & 0x0F,
            self.year & 0x7F,
        ]
    }

    /// Whole seconds within the minute (0-59).
    #[inline]
    pub const fn second(&self) -> u8 {
        (self.milliseconds / 1000) as u8
    }

    /// Millisecond remainder (0-999).
    #[inline]
    pub const fn millisecond(&self) -> u16 {
        self.milliseconds % 1000
    }
}

/// CP24Time2a timestamp (3 bytes): milliseconds and minutes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cp24Time2a {
    /// Milliseconds within the minute (0-59999)
    pub milliseconds: u16,
    /// Minutes (0-59)
    pub minutes: u8,
    /// Invalid flag
    pub invalid: bool,
}

impl Cp24Time2a {
    /// Parse from 3 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 3 {
            return Err(Iec104Error::malformed_asdu_static("CP24Time2a too short"));
        }

        Ok(Self {
            milliseconds: bytes[0] as u16 | ((bytes[1] as u16) << 8),
            minutes: bytes[2] & 0x3F,
            invalid: (bytes[2] & 0x80) != 0,
        })
    }

    /// Encode to 3 bytes.
    pub fn to_bytes(&self) -> [u8; 3] {
        [
            (self.milliseconds & 0xFF) as u8,
            ((self.milliseconds >> 8) & 0xFF) as u8,
            (self.minutes & 0x3F) | if self.invalid { 0x80 } else { 0 },
        ]
    }
}

/// ASDU header (fixed part).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsduHeader {
    /// Type identification
    pub type_id: TypeId,
    /// Variable structure qualifier
    pub vsq: Vsq,
    /// Cause of transmission
    pub cot: Cot,
    /// Test flag (bit 7 of the cause octet)
    pub test: bool,
    /// Negative confirmation flag (bit 6 of the cause octet)
    pub negative: bool,
    /// Originator address (0 when `cot_size` is 1)
    pub originator: u8,
    /// Common address of ASDU (station address)
    pub common_address: u16,
}

impl AsduHeader {
    /// Create a new ASDU header with no objects yet; [`Asdu::add_object`]
    /// keeps the count in step.
    pub fn new(type_id: TypeId, cot: Cot, common_address: u16) -> Self {
        Self {
            type_id,
            vsq: Vsq::new(0, false),
            cot,
            test: false,
            negative: false,
            originator: 0,
            common_address,
        }
    }

    /// Mark the header as carrying a sequence of objects at consecutive
    /// addresses (SQ=1).
    pub fn with_sequence(mut self) -> Self {
        self.vsq.sequence = true;
        self
    }

    /// Parse an ASDU header. Returns the header and the bytes consumed.
    pub fn parse(data: &[u8], params: &AsduParameters) -> Result<(Self, usize)> {
        let header_len = params.header_len();
        if data.len() < header_len {
            return Err(Iec104Error::malformed_asdu_static("ASDU header too short"));
        }

        let type_id = TypeId::from_u8(data[0])?;
        let vsq = Vsq::from_u8(data[1]);

        let cot = Cot::from_u8(data[2])?;
        let test = (data[2] & 0x80) != 0;
        let negative = (data[2] & 0x40) != 0;

        let mut offset = 3;
        let originator = if params.cot_size == 2 {
            let oa = data[offset];
            offset += 1;
            oa
        } else {
            0
        };

        let common_address = if params.ca_size == 2 {
            let ca = data[offset] as u16 | ((data[offset + 1] as u16) << 8);
            offset += 2;
            ca
        } else {
            let ca = data[offset] as u16;
            offset += 1;
            ca
        };

        Ok((
            Self {
                type_id,
                vsq,
                cot,
                test,
                negative,
                originator,
                common_address,
            },
            offset,
        ))
    }

    /// Encode the ASDU header.
    pub fn encode(&self, buf: &mut BytesMut, params: &AsduParameters) {
        buf.put_u8(self.type_id.as_u8());
        buf.put_u8(self.vsq.as_u8());

        let mut cot_byte = self.cot.as_u8();
        if self.test {
            cot_byte |= 0x80;
        }
        if self.negative {
            cot_byte |= 0x40;
        }
        buf.put_u8(cot_byte);
        if params.cot_size == 2 {
            buf.put_u8(self.originator);
        }
        if params.ca_size == 2 {
            buf.put_u16_le(self.common_address);
        } else {
            buf.put_u8(self.common_address as u8);
        }
    }
}

fn read_ioa(data: &[u8], params: &AsduParameters) -> u32 {
    let mut value = 0u32;
    for (i, b) in data[..params.ioa_size as usize].iter().enumerate() {
        value |= (*b as u32) << (8 * i);
    }
    value
}

fn write_ioa(buf: &mut BytesMut, address: u32, params: &AsduParameters) {
    for i in 0..params.ioa_size as usize {
        buf.put_u8(((address >> (8 * i)) & 0xFF) as u8);
    }
}

/// Complete ASDU: header plus typed information objects.
#[derive(Debug, Clone, PartialEq)]
pub struct Asdu {
    /// ASDU header
    pub header: AsduHeader,
    /// Information objects; always matches `header.vsq.count`
    pub objects: Vec<InformationObject>,
}

impl Asdu {
    /// Create an empty ASDU for the given header.
    pub fn new(header: AsduHeader) -> Self {
        Self {
            header,
            objects: Vec::new(),
        }
    }

    /// Append an information object.
    ///
    /// Returns false when the object's element does not match the ASDU's
    /// type identification, the object count would exceed 127, or (for
    /// SQ=1 ASDUs) the address is not consecutive with the previous
    /// object's.
    pub fn add_object(&mut self, object: InformationObject) -> bool {
        if object.element.type_id() != self.header.type_id {
            return false;
        }
        if self.header.vsq.count >= 127 {
            return false;
        }
        if self.header.vsq.sequence {
            if let Some(last) = self.objects.last() {
                if object.address != last.address.wrapping_add(1) {
                    return false;
                }
            }
        }
        self.objects.push(object);
        self.header.vsq.count += 1;
        true
    }

    /// Clone of this ASDU with a different cause of transmission, for
    /// mirrored responses (confirmations, error markers).
    pub fn with_cause(&self, cot: Cot, negative: bool) -> Self {
        let mut response = self.clone();
        response.header.cot = cot;
        response.header.negative = negative;
        response
    }

    /// Activation confirmation for this ASDU (ACT_CON).
    pub fn activation_confirm(&self, negative: bool) -> Self {
        self.with_cause(Cot::ActivationConfirm, negative)
    }

    /// Activation termination for this ASDU (ACT_TERM).
    pub fn activation_termination(&self) -> Self {
        self.with_cause(Cot::ActivationTermination, false)
    }

    /// Create an interrogation command ASDU (C_IC_NA_1).
    pub fn interrogation_command(common_address: u16, qoi: u8) -> Self {
        let mut asdu = Self::new(AsduHeader::new(
            TypeId::InterrogationCommand,
            Cot::Activation,
            common_address,
        ));
        asdu.add_object(InformationObject::new(
            0,
            InformationElement::Interrogation { qualifier: qoi },
        ));
        asdu
    }

    /// Create a clock synchronization command ASDU (C_CS_NA_1).
    pub fn clock_sync_command(common_address: u16, time: Cp56Time2a) -> Self {
        let mut asdu = Self::new(AsduHeader::new(
            TypeId::ClockSync,
            Cot::Activation,
            common_address,
        ));
        asdu.add_object(InformationObject::new(
            0,
            InformationElement::ClockSync { time },
        ));
        asdu
    }

    /// Parse an ASDU from the body of an I-frame.
    ///
    /// The information objects are walked by the fixed per-type element
    /// width; with SQ=1 only the first object carries an address and the
    /// rest increment from it. An unknown type identification fails with
    /// [`Iec104Error::UnknownTypeId`] before any object bytes are
    /// consumed, so the caller can drop the unit without losing framing.
    pub fn parse(data: &[u8], params: &AsduParameters) -> Result<Self> {
        let (header, header_len) = AsduHeader::parse(data, params)?;
        let count = header.vsq.count as usize;
        let width = header.type_id.element_width();
        let ioa_size = params.ioa_size as usize;

        let mut objects = Vec::with_capacity(count);
        let mut offset = header_len;

        if header.vsq.sequence {
            if count > 0 {
                if data.len() < offset + ioa_size {
                    return Err(Iec104Error::malformed_asdu_static(
                        "object address truncated",
                    ));
                }
                let first = read_ioa(&data[offset..], params);
                offset += ioa_size;

                for i in 0..count {
                    if data.len() < offset + width {
                        return Err(Iec104Error::malformed_asdu_static(
                            "information element truncated",
                        ));
                    }
                    let element =
                        InformationElement::decode(header.type_id, &data[offset..offset + width])?;
                    offset += width;
                    objects.push(InformationObject::new(first.wrapping_add(i as u32), element));
                }
            }
        } else {
            for _ in 0..count {
                if data.len() < offset + ioa_size + width {
                    return Err(Iec104Error::malformed_asdu_static(
                        "information object truncated",
                    ));
                }
                let address = read_ioa(&data[offset..], params);
                offset += ioa_size;
                let element =
                    InformationElement::decode(header.type_id, &data[offset..offset + width])?;
                offset += width;
                objects.push(InformationObject::new(address, element));
            }
        }

        if offset != data.len() {
            return Err(Iec104Error::malformed_asdu_static(
                "trailing bytes after information objects",
            ));
        }

        Ok(Self { header, objects })
    }

    /// Encode this ASDU into a fresh buffer.
    pub fn encode(&self, params: &AsduParameters) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.encoded_len(params));
        self.encode_to(&mut buf, params);
        buf
    }

    /// Encode this ASDU into the provided buffer.
    pub fn encode_to(&self, buf: &mut BytesMut, params: &AsduParameters) {
        self.header.encode(buf, params);

        if self.header.vsq.sequence {
            if let Some(first) = self.objects.first() {
                write_ioa(buf, first.address, params);
                for object in &self.objects {
                    object.element.encode(buf);
                }
            }
        } else {
            for object in &self.objects {
                write_ioa(buf, object.address, params);
                object.element.encode(buf);
            }
        }
    }

    /// Encoded length of this ASDU under the given parameters.
    pub fn encoded_len(&self, params: &AsduParameters) -> usize {
        let width = self.header.type_id.element_width();
        let ioa_size = params.ioa_size as usize;
        let mut len = params.header_len();
        if !self.objects.is_empty() {
            if self.header.vsq.sequence {
                len += ioa_size + self.objects.len() * width;
            } else {
                len += self.objects.len() * (ioa_size + width);
            }
        }
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: AsduParameters = AsduParameters {
        ca_size: 2,
        cot_size: 2,
        ioa_size: 3,
    };

    #[test]
    fn test_vsq() {
        let vsq = Vsq::new(10, false);
        assert_eq!(vsq.as_u8(), 10);

        let vsq = Vsq::new(10, true);
        assert_eq!(vsq.as_u8(), 0x8A);

        let vsq = Vsq::from_u8(0x8A);
        assert_eq!(vsq.count, 10);
        assert!(vsq.sequence);
    }

    #[test]
    fn test_parameters_validate() {
        assert!(AsduParameters::default().validate().is_ok());
        assert!(AsduParameters {
            ca_size: 1,
            cot_size: 1,
            ioa_size: 1
        }
        .validate()
        .is_ok());
        assert!(AsduParameters {
            ca_size: 3,
            ..Default::default()
        }
        .validate()
        .is_err());
        assert!(AsduParameters {
            ioa_size: 0,
            ..Default::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_quality_descriptor_bits() {
        let qd = QualityDescriptor::from_raw(0x90);
        assert!(qd.blocked);
        assert!(qd.invalid);
        assert!(!qd.substituted);
        assert!(!qd.not_topical);
        assert_eq!(qd.to_raw(), 0x90);

        assert!(QualityDescriptor::new().is_good());
        assert!(!QualityDescriptor::invalid().is_good());
    }

    #[test]
    fn test_measured_quality_bits() {
        let q = MeasuredQuality::from_u8(0x81);
        assert!(q.invalid);
        assert!(q.overflow);
        assert!(!q.blocked);
        assert_eq!(q.as_u8(), 0x81);

        let all = MeasuredQuality::from_u8(0xF1);
        assert!(all.overflow && all.blocked && all.substituted && all.not_topical && all.invalid);
        assert_eq!(all.as_u8(), 0xF1);
    }

    #[test]
    fn test_cp56time2a_roundtrip() {
        let time = Cp56Time2a {
            milliseconds: 30123,
            minutes: 30,
            hours: 12,
            day: 15,
            day_of_week: 3,
            month: 6,
            year: 24,
            invalid: false,
            summer_time: true,
        };

        let parsed = Cp56Time2a::from_bytes(&time.to_bytes()).unwrap();
        assert_eq!(parsed, time);
        assert_eq!(parsed.second(), 30);
        assert_eq!(parsed.millisecond(), 123);
    }

    #[test]
    fn test_cp24time2a_roundtrip() {
        let time = Cp24Time2a {
            milliseconds: 59999,
            minutes: 59,
            invalid: true,
        };
        let parsed = Cp24Time2a::from_bytes(&time.to_bytes()).unwrap();
        assert_eq!(parsed, time);
    }

    #[test]
    fn test_header_roundtrip_default_params() {
        let mut header = AsduHeader::new(TypeId::MeasuredFloat, Cot::Spontaneous, 47);
        header.originator = 3;
        header.test = true;
        let mut buf = BytesMut::new();
        header.encode(&mut buf, &PARAMS);
        assert_eq!(buf.len(), PARAMS.header_len());

        let (parsed, consumed) = AsduHeader::parse(&buf, &PARAMS).unwrap();
        assert_eq!(consumed, PARAMS.header_len());
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_header_roundtrip_narrow_params() {
        let narrow = AsduParameters {
            ca_size: 1,
            cot_size: 1,
            ioa_size: 2,
        };
        let mut header = AsduHeader::new(TypeId::SinglePoint, Cot::Activation, 9);
        header.negative = true;
        let mut buf = BytesMut::new();
        header.encode(&mut buf, &narrow);
        assert_eq!(buf.len(), 4);

        let (parsed, _) = AsduHeader::parse(&buf, &narrow).unwrap();
        assert_eq!(parsed.common_address, 9);
        assert_eq!(parsed.originator, 0);
        assert!(parsed.negative);
    }

    #[test]
    fn test_asdu_roundtrip_individual_addresses() {
        let mut asdu = Asdu::new(AsduHeader::new(TypeId::MeasuredScaled, Cot::Spontaneous, 1));
        assert!(asdu.add_object(InformationObject::measured_scaled(
            100,
            -1,
            MeasuredQuality::new()
        )));
        assert!(asdu.add_object(InformationObject::measured_scaled(
            205,
            2300,
            MeasuredQuality::invalid()
        )));

        let encoded = asdu.encode(&PARAMS);
        assert_eq!(encoded.len(), asdu.encoded_len(&PARAMS));
        let parsed = Asdu::parse(&encoded, &PARAMS).unwrap();
        assert_eq!(parsed, asdu);
    }

    #[test]
    fn test_asdu_roundtrip_sequence_addresses() {
        let mut asdu = Asdu::new(
            AsduHeader::new(TypeId::SinglePoint, Cot::InterrogatedByStation, 1).with_sequence(),
        );
        for (i, value) in [true, false, true].iter().enumerate() {
            assert!(asdu.add_object(InformationObject::single_point(
                300 + i as u32,
                *value,
                QualityDescriptor::new()
            )));
        }

        let encoded = asdu.encode(&PARAMS);
        // header + one address + three 1-byte elements
        assert_eq!(encoded.len(), PARAMS.header_len() + 3 + 3);
        let parsed = Asdu::parse(&encoded, &PARAMS).unwrap();
        assert_eq!(parsed, asdu);
        assert_eq!(parsed.objects[2].address, 302);
    }

    #[test]
    fn test_add_object_rejects_mismatch() {
        let mut asdu = Asdu::new(AsduHeader::new(TypeId::SinglePoint, Cot::Spontaneous, 1));
        assert!(!asdu.add_object(InformationObject::measured_scaled(
            1,
            0,
            MeasuredQuality::new()
        )));
        assert_eq!(asdu.header.vsq.count, 0);
    }

    #[test]
    fn test_add_object_rejects_gap_in_sequence() {
        let mut asdu =
            Asdu::new(AsduHeader::new(TypeId::SinglePoint, Cot::Spontaneous, 1).with_sequence());
        assert!(asdu.add_object(InformationObject::single_point(
            10,
            true,
            QualityDescriptor::new()
        )));
        assert!(!asdu.add_object(InformationObject::single_point(
            12,
            true,
            QualityDescriptor::new()
        )));
        assert_eq!(asdu.header.vsq.count, 1);
    }

    #[test]
    fn test_parse_unknown_type_id() {
        // type 200 does not exist
        let data = [200u8, 0x01, 0x03, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00];
        match Asdu::parse(&data, &PARAMS) {
            Err(Iec104Error::UnknownTypeId(200)) => {}
            other => panic!("expected UnknownTypeId, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_truncated_object() {
        let mut asdu = Asdu::new(AsduHeader::new(TypeId::MeasuredFloat, Cot::Spontaneous, 1));
        asdu.add_object(InformationObject::measured_float(
            1,
            1.5,
            MeasuredQuality::new(),
        ));
        let encoded = asdu.encode(&PARAMS);
        assert!(Asdu::parse(&encoded[..encoded.len() - 1], &PARAMS).is_err());
    }

    #[test]
    fn test_parse_trailing_bytes() {
        let mut asdu = Asdu::new(AsduHeader::new(TypeId::SinglePoint, Cot::Spontaneous, 1));
        asdu.add_object(InformationObject::single_point(
            1,
            true,
            QualityDescriptor::new(),
        ));
        let mut encoded = asdu.encode(&PARAMS);
        encoded.put_u8(0xFF);
        assert!(Asdu::parse(&encoded, &PARAMS).is_err());
    }

    #[test]
    fn test_with_cause_helpers() {
        let asdu = Asdu::interrogation_command(7, 20);
        let con = asdu.activation_confirm(false);
        assert_eq!(con.header.cot, Cot::ActivationConfirm);
        assert!(!con.header.negative);
        assert_eq!(con.objects, asdu.objects);

        let rejected = asdu.activation_confirm(true);
        assert!(rejected.header.negative);

        let term = asdu.activation_termination();
        assert_eq!(term.header.cot, Cot::ActivationTermination);
    }
}
