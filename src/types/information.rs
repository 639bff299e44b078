//! Typed information objects.
//!
//! Each type identification maps to one fixed value shape; the decoded
//! type id selects the variant, so no downcasting is needed anywhere.
//! Encoding and decoding are exact inverses for every variant, including
//! all quality and flag bits.

use bytes::{BufMut, BytesMut};

use crate::error::{Iec104Error, Result};
use crate::types::{Cp24Time2a, Cp56Time2a, MeasuredQuality, QualityDescriptor, TypeId};

/// Fixed bit pattern of the C_TS_NA_1 test command (FBP).
pub const TEST_COMMAND_PATTERN: u16 = 0x55AA;

/// Double-point state (DPI/DCS, 2 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DoublePointValue {
    /// Indeterminate or intermediate (00)
    Indeterminate = 0,
    /// Determined OFF (01)
    Off = 1,
    /// Determined ON (10)
    On = 2,
    /// Indeterminate (11)
    IndeterminateOrFaulty = 3,
}

impl DoublePointValue {
    /// Parse from the lower 2 bits of a DIQ/DCO octet.
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        match value & 0x03 {
            0 => Self::Indeterminate,
            1 => Self::Off,
            2 => Self::On,
            _ => Self::IndeterminateOrFaulty,
        }
    }

    /// Raw 2-bit value.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Regulating step command state (RCS, 2 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StepDirection {
    /// Not permitted (00)
    Invalid0 = 0,
    /// Next step lower (01)
    Lower = 1,
    /// Next step higher (10)
    Higher = 2,
    /// Not permitted (11)
    Invalid3 = 3,
}

impl StepDirection {
    /// Parse from the lower 2 bits of an RCO octet.
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        match value & 0x03 {
            0 => Self::Invalid0,
            1 => Self::Lower,
            2 => Self::Higher,
            _ => Self::Invalid3,
        }
    }

    /// Raw 2-bit value.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Binary counter reading (BCR, 5 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryCounterReading {
    /// Counter value
    pub value: i32,
    /// Sequence notation (0-31)
    pub sequence: u8,
    /// Carry (CY)
    pub carry: bool,
    /// Counter adjusted (CA)
    pub adjusted: bool,
    /// Invalid (IV)
    pub invalid: bool,
}

impl BinaryCounterReading {
    fn decode(data: &[u8]) -> Self {
        let value = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let flags = data[4];
        Self {
            value,
            sequence: flags & 0x1F,
            carry: (flags & 0x20) != 0,
            adjusted: (flags & 0x40) != 0,
            invalid: (flags & 0x80) != 0,
        }
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.value);
        let mut flags = self.sequence & 0x1F;
        if self.carry {
            flags |= 0x20;
        }
        if self.adjusted {
            flags |= 0x40;
        }
        if self.invalid {
            flags |= 0x80;
        }
        buf.put_u8(flags);
    }
}

/// One information object: address plus typed element.
#[derive(Debug, Clone, PartialEq)]
pub struct InformationObject {
    /// Information object address
    pub address: u32,
    /// Typed information element
    pub element: InformationElement,
}

impl InformationObject {
    /// Create a new information object.
    pub fn new(address: u32, element: InformationElement) -> Self {
        Self { address, element }
    }

    /// Single-point information (M_SP_NA_1).
    pub fn single_point(address: u32, value: bool, quality: QualityDescriptor) -> Self {
        Self::new(address, InformationElement::SinglePoint { value, quality })
    }

    /// Measured value, scaled (M_ME_NB_1).
    pub fn measured_scaled(address: u32, value: i16, quality: MeasuredQuality) -> Self {
        Self::new(address, InformationElement::MeasuredScaled { value, quality })
    }

    /// Measured value, short floating point (M_ME_NC_1).
    pub fn measured_float(address: u32, value: f32, quality: MeasuredQuality) -> Self {
        Self::new(address, InformationElement::MeasuredFloat { value, quality })
    }
}

/// Information element: the typed value shape of one object, selected by
/// the ASDU's type identification.
///
/// Normalized values are kept as the raw 16-bit representation so the
/// round trip through the wire is exact; -32768..=32767 maps to
/// -1.0..=+1.0 (divide by 32768).
#[derive(Debug, Clone, PartialEq)]
pub enum InformationElement {
    /// M_SP_NA_1
    SinglePoint {
        value: bool,
        quality: QualityDescriptor,
    },
    /// M_SP_TA_1
    SinglePointTime24 {
        value: bool,
        quality: QualityDescriptor,
        time: Cp24Time2a,
    },
    /// M_SP_TB_1
    SinglePointTime56 {
        value: bool,
        quality: QualityDescriptor,
        time: Cp56Time2a,
    },
    /// M_DP_NA_1
    DoublePoint {
        value: DoublePointValue,
        quality: QualityDescriptor,
    },
    /// M_DP_TA_1
    DoublePointTime24 {
        value: DoublePointValue,
        quality: QualityDescriptor,
        time: Cp24Time2a,
    },
    /// M_DP_TB_1
    DoublePointTime56 {
        value: DoublePointValue,
        quality: QualityDescriptor,
        time: Cp56Time2a,
    },
    /// M_ST_NA_1; value is -64..=63, transient set while the device moves
    StepPosition {
        value: i8,
        transient: bool,
        quality: MeasuredQuality,
    },
    /// M_BO_NA_1
    Bitstring32 { value: u32, quality: MeasuredQuality },
    /// M_ME_NA_1 (raw normalized value)
    MeasuredNormalized { value: i16, quality: MeasuredQuality },
    /// M_ME_TA_1
    MeasuredNormalizedTime24 {
        value: i16,
        quality: MeasuredQuality,
        time: Cp24Time2a,
    },
    /// M_ME_NB_1
    MeasuredScaled { value: i16, quality: MeasuredQuality },
    /// M_ME_TB_1
    MeasuredScaledTime24 {
        value: i16,
        quality: MeasuredQuality,
        time: Cp24Time2a,
    },
    /// M_ME_NC_1
    MeasuredFloat { value: f32, quality: MeasuredQuality },
    /// M_ME_TC_1
    MeasuredFloatTime24 {
        value: f32,
        quality: MeasuredQuality,
        time: Cp24Time2a,
    },
    /// M_ME_TF_1
    MeasuredFloatTime56 {
        value: f32,
        quality: MeasuredQuality,
        time: Cp56Time2a,
    },
    /// M_IT_NA_1
    IntegratedTotals { counter: BinaryCounterReading },
    /// M_EI_NA_1 (COI octet)
    EndOfInit { cause: u8 },
    /// C_SC_NA_1; qualifier is QU (0-31), select distinguishes select/execute
    SingleCommand {
        value: bool,
        select: bool,
        qualifier: u8,
    },
    /// C_SC_TA_1
    SingleCommandTime56 {
        value: bool,
        select: bool,
        qualifier: u8,
        time: Cp56Time2a,
    },
    /// C_DC_NA_1
    DoubleCommand {
        value: DoublePointValue,
        select: bool,
        qualifier: u8,
    },
    /// C_DC_TA_1
    DoubleCommandTime56 {
        value: DoublePointValue,
        select: bool,
        qualifier: u8,
        time: Cp56Time2a,
    },
    /// C_RC_NA_1
    RegulatingStep {
        step: StepDirection,
        select: bool,
        qualifier: u8,
    },
    /// C_SE_NA_1 (raw normalized set-point); qualifier is QL (0-127)
    SetpointNormalized {
        value: i16,
        select: bool,
        qualifier: u8,
    },
    /// C_SE_NB_1
    SetpointScaled {
        value: i16,
        select: bool,
        qualifier: u8,
    },
    /// C_SE_NC_1
    SetpointFloat {
        value: f32,
        select: bool,
        qualifier: u8,
    },
    /// C_SE_TC_1
    SetpointFloatTime56 {
        value: f32,
        select: bool,
        qualifier: u8,
        time: Cp56Time2a,
    },
    /// C_BO_NA_1
    Bitstring32Command { value: u32 },
    /// C_IC_NA_1 (QOI octet; 20 = station interrogation)
    Interrogation { qualifier: u8 },
    /// C_CI_NA_1 (QCC octet)
    CounterInterrogation { qualifier: u8 },
    /// C_RD_NA_1 (no payload)
    Read,
    /// C_CS_NA_1
    ClockSync { time: Cp56Time2a },
    /// C_TS_NA_1 (FBP, 0x55AA on the wire)
    TestCommand { pattern: u16 },
    /// C_TS_TA_1 (test sequence counter + time)
    TestCommandTime56 { counter: u16, time: Cp56Time2a },
    /// C_RP_NA_1 (QRP octet)
    ResetProcess { qualifier: u8 },
}

impl InformationElement {
    /// The type identification this element belongs to.
    pub fn type_id(&self) -> TypeId {
        match self {
            Self::SinglePoint { .. } => TypeId::SinglePoint,
            Self::SinglePointTime24 { .. } => TypeId::SinglePointTime24,
            Self::SinglePointTime56 { .. } => TypeId::SinglePointTime56,
            Self::DoublePoint { .. } => TypeId::DoublePoint,
            Self::DoublePointTime24 { .. } => TypeId::DoublePointTime24,
            Self::DoublePointTime56 { .. } => TypeId::DoublePointTime56,
            Self::StepPosition { .. } => TypeId::StepPosition,
            Self::Bitstring32 { .. } => TypeId::Bitstring32,
            Self::MeasuredNormalized { .. } => TypeId::MeasuredNormalized,
            Self::MeasuredNormalizedTime24 { .. } => TypeId::MeasuredNormalizedTime24,
            Self::MeasuredScaled { .. } => TypeId::MeasuredScaled,
            Self::MeasuredScaledTime24 { .. } => TypeId::MeasuredScaledTime24,
            Self::MeasuredFloat { .. } => TypeId::MeasuredFloat,
            Self::MeasuredFloatTime24 { .. } => TypeId::MeasuredFloatTime24,
            Self::MeasuredFloatTime56 { .. } => TypeId::MeasuredFloatTime56,
            Self::IntegratedTotals { .. } => TypeId::IntegratedTotals,
            Self::EndOfInit { .. } => TypeId::EndOfInit,
            Self::SingleCommand { .. } => TypeId::SingleCommand,
            Self::SingleCommandTime56 { .. } => TypeId::SingleCommandTime56,
            Self::DoubleCommand { .. } => TypeId::DoubleCommand,
            Self::DoubleCommandTime56 { .. } => TypeId::DoubleCommandTime56,
            Self::RegulatingStep { .. } => TypeId::RegulatingStep,
            Self::SetpointNormalized { .. } => TypeId::SetpointNormalized,
            Self::SetpointScaled { .. } => TypeId::SetpointScaled,
            Self::SetpointFloat { .. } => TypeId::SetpointFloat,
            Self::SetpointFloatTime56 { .. } => TypeId::SetpointFloatTime56,
            Self::Bitstring32Command { .. } => TypeId::Bitstring32Command,
            Self::Interrogation { .. } => TypeId::InterrogationCommand,
            Self::CounterInterrogation { .. } => TypeId::CounterInterrogation,
            Self::Read => TypeId::ReadCommand,
            Self::ClockSync { .. } => TypeId::ClockSync,
            Self::TestCommand { .. } => TypeId::TestCommand,
            Self::TestCommandTime56 { .. } => TypeId::TestCommandTime56,
            Self::ResetProcess { .. } => TypeId::ResetProcess,
        }
    }

    /// Decode one element of the given type from exactly
    /// `type_id.element_width()` bytes.
    pub fn decode(type_id: TypeId, data: &[u8]) -> Result<Self> {
        if data.len() < type_id.element_width() {
            return Err(Iec104Error::malformed_asdu_static(
                "information element truncated",
            ));
        }

        let element = match type_id {
            TypeId::SinglePoint => {
                let (value, quality) = decode_siq(data[0]);
                Self::SinglePoint { value, quality }
            }
            TypeId::SinglePointTime24 => {
                let (value, quality) = decode_siq(data[0]);
                Self::SinglePointTime24 {
                    value,
                    quality,
                    time: Cp24Time2a::from_bytes(&data[1..4])?,
                }
            }
            TypeId::SinglePointTime56 => {
                let (value, quality) = decode_siq(data[0]);
                Self::SinglePointTime56 {
                    value,
                    quality,
                    time: Cp56Time2a::from_bytes(&data[1..8])?,
                }
            }
            TypeId::DoublePoint => {
                let (value, quality) = decode_diq(data[0]);
                Self::DoublePoint { value, quality }
            }
            TypeId::DoublePointTime24 => {
                let (value, quality) = decode_diq(data[0]);
                Self::DoublePointTime24 {
                    value,
                    quality,
                    time: Cp24Time2a::from_bytes(&data[1..4])?,
                }
            }
            TypeId::DoublePointTime56 => {
                let (value, quality) = decode_diq(data[0]);
                Self::DoublePointTime56 {
                    value,
                    quality,
                    time: Cp56Time2a::from_bytes(&data[1..8])?,
                }
            }
            TypeId::StepPosition => {
                let vti = data[0];
                Self::StepPosition {
                    // 7-bit two's complement, -64..=63
                    value: (((vti & 0x7F) << 1) as i8) >> 1,
                    transient: (vti & 0x80) != 0,
                    quality: MeasuredQuality::from_u8(data[1]),
                }
            }
            TypeId::Bitstring32 => Self::Bitstring32 {
                value: u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
                quality: MeasuredQuality::from_u8(data[4]),
            },
            TypeId::MeasuredNormalized => Self::MeasuredNormalized {
                value: i16::from_le_bytes([data[0], data[1]]),
                quality: MeasuredQuality::from_u8(data[2]),
            },
            TypeId::MeasuredNormalizedTime24 => Self::MeasuredNormalizedTime24 {
                value: i16::from_le_bytes([data[0], data[1]]),
                quality: MeasuredQuality::from_u8(data[2]),
                time: Cp24Time2a::from_bytes(&data[3..6])?,
            },
            TypeId::MeasuredScaled => Self::MeasuredScaled {
                value: i16::from_le_bytes([data[0], data[1]]),
                quality: MeasuredQuality::from_u8(data[2]),
            },
            TypeId::MeasuredScaledTime24 => Self::MeasuredScaledTime24 {
                value: i16::from_le_bytes([data[0], data[1]]),
                quality: MeasuredQuality::from_u8(data[2]),
                time: Cp24Time2a::from_bytes(&data[3..6])?,
            },
            TypeId::MeasuredFloat => Self::MeasuredFloat {
                value: f32::from_le_bytes([data[0], data[1], data[2], data[3]]),
                quality: MeasuredQuality::from_u8(data[4]),
            },
            TypeId::MeasuredFloatTime24 => Self::MeasuredFloatTime24 {
                value: f32::from_le_bytes([data[0], data[1], data[2], data[3]]),
                quality: MeasuredQuality::from_u8(data[4]),
                time: Cp24Time2a::from_bytes(&data[5..8])?,
            },
            TypeId::MeasuredFloatTime56 => Self::MeasuredFloatTime56 {
                value: f32::from_le_bytes([data[0], data[1], data[2], data[3]]),
                quality: MeasuredQuality::from_u8(data[4]),
                time: Cp56Time2a::from_bytes(&data[5..12])?,
            },
            TypeId::IntegratedTotals => Self::IntegratedTotals {
                counter: BinaryCounterReading::decode(data),
            },
            TypeId::EndOfInit => Self::EndOfInit { cause: data[0] },
            TypeId::SingleCommand => {
                let (value, select, qualifier) = decode_sco(data[0]);
                Self::SingleCommand {
                    value,
                    select,
                    qualifier,
                }
            }
            TypeId::SingleCommandTime56 => {
                let (value, select, qualifier) = decode_sco(data[0]);
                Self::SingleCommandTime56 {
                    value,
                    select,
                    qualifier,
                    time: Cp56Time2a::from_bytes(&data[1..8])?,
                }
            }
            TypeId::DoubleCommand => {
                let (value, select, qualifier) = decode_dco(data[0]);
                Self::DoubleCommand {
                    value,
                    select,
                    qualifier,
                }
            }
            TypeId::DoubleCommandTime56 => {
                let (value, select, qualifier) = decode_dco(data[0]);
                Self::DoubleCommandTime56 {
                    value,
                    select,
                    qualifier,
                    time: Cp56Time2a::from_bytes(&data[1..8])?,
                }
            }
            TypeId::RegulatingStep => {
                let rco = data[0];
                Self::RegulatingStep {
                    step: StepDirection::from_u8(rco),
                    select: (rco & 0x80) != 0,
                    qualifier: (rco >> 2) & 0x1F,
                }
            }
            TypeId::SetpointNormalized => {
                let (select, qualifier) = decode_qos(data[2]);
                Self::SetpointNormalized {
                    value: i16::from_le_bytes([data[0], data[1]]),
                    select,
                    qualifier,
                }
            }
            TypeId::SetpointScaled => {
                let (select, qualifier) = decode_qos(data[2]);
                Self::SetpointScaled {
                    value: i16::from_le_bytes([data[0], data[1]]),
                    select,
                    qualifier,
                }
            }
            TypeId::SetpointFloat => {
                let (select, qualifier) = decode_qos(data[4]);
                Self::SetpointFloat {
                    value: f32::from_le_bytes([data[0], data[1], data[2], data[3]]),
                    select,
                    qualifier,
                }
            }
            TypeId::SetpointFloatTime56 => {
                let (select, qualifier) = decode_qos(data[4]);
                Self::SetpointFloatTime56 {
                    value: f32::from_le_bytes([data[0], data[1], data[2], data[3]]),
                    select,
                    qualifier,
                    time: Cp56Time2a::from_bytes(&data[5..12])?,
                }
            }
            TypeId::Bitstring32Command => Self::Bitstring32Command {
                value: u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            },
            TypeId::InterrogationCommand => Self::Interrogation { qualifier: data[0] },
            TypeId::CounterInterrogation => Self::CounterInterrogation { qualifier: data[0] },
            TypeId::ReadCommand => Self::Read,
            TypeId::ClockSync => Self::ClockSync {
                time: Cp56Time2a::from_bytes(&data[0..7])?,
            },
            TypeId::TestCommand => Self::TestCommand {
                pattern: u16::from_le_bytes([data[0], data[1]]),
            },
            TypeId::TestCommandTime56 => Self::TestCommandTime56 {
                counter: u16::from_le_bytes([data[0], data[1]]),
                time: Cp56Time2a::from_bytes(&data[2..9])?,
            },
            TypeId::ResetProcess => Self::ResetProcess { qualifier: data[0] },
        };

        Ok(element)
    }

    /// Encode this element; emits exactly `type_id().element_width()` bytes.
    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            Self::SinglePoint { value, quality } => buf.put_u8(encode_siq(*value, quality)),
            Self::SinglePointTime24 {
                value,
                quality,
                time,
            } => {
                buf.put_u8(encode_siq(*value, quality));
                buf.put_slice(&time.to_bytes());
            }
            Self::SinglePointTime56 {
                value,
                quality,
                time,
            } => {
                buf.put_u8(encode_siq(*value, quality));
                buf.put_slice(&time.to_bytes());
            }
            Self::DoublePoint { value, quality } => buf.put_u8(encode_diq(*value, quality)),
            Self::DoublePointTime24 {
                value,
                quality,
                time,
            } => {
                buf.put_u8(encode_diq(*value, quality));
                buf.put_slice(&time.to_bytes());
            }
            Self::DoublePointTime56 {
                value,
                quality,
                time,
            } => {
                buf.put_u8(encode_diq(*value, quality));
                buf.put_slice(&time.to_bytes());
            }
            Self::StepPosition {
                value,
                transient,
                quality,
            } => {
                let vti = (*value as u8 & 0x7F) | if *transient { 0x80 } else { 0 };
                buf.put_u8(vti);
                buf.put_u8(quality.as_u8());
            }
            Self::Bitstring32 { value, quality } => {
                buf.put_u32_le(*value);
                buf.put_u8(quality.as_u8());
            }
            Self::MeasuredNormalized { value, quality }
            | Self::MeasuredScaled { value, quality } => {
                buf.put_i16_le(*value);
                buf.put_u8(quality.as_u8());
            }
            Self::MeasuredNormalizedTime24 {
                value,
                quality,
                time,
            }
            | Self::MeasuredScaledTime24 {
                value,
                quality,
                time,
            } => {
                buf.put_i16_le(*value);
                buf.put_u8(quality.as_u8());
                buf.put_slice(&time.to_bytes());
            }
            Self::MeasuredFloat { value, quality } => {
                buf.put_f32_le(*value);
                buf.put_u8(quality.as_u8());
            }
            Self::MeasuredFloatTime24 {
                value,
                quality,
                time,
            } => {
                buf.put_f32_le(*value);
                buf.put_u8(quality.as_u8());
                buf.put_slice(&time.to_bytes());
            }
            Self::MeasuredFloatTime56 {
                value,
                quality,
                time,
            } => {
                buf.put_f32_le(*value);
                buf.put_u8(quality.as_u8());
                buf.put_slice(&time.to_bytes());
            }
            Self::IntegratedTotals { counter } => counter.encode(buf),
            Self::EndOfInit { cause } => buf.put_u8(*cause),
            Self::SingleCommand {
                value,
                select,
                qualifier,
            } => buf.put_u8(encode_sco(*value, *select, *qualifier)),
            Self::SingleCommandTime56 {
                value,
                select,
                qualifier,
                time,
            } => {
                buf.put_u8(encode_sco(*value, *select, *qualifier));
                buf.put_slice(&time.to_bytes());
            }
            Self::DoubleCommand {
                value,
                select,
                qualifier,
            } => buf.put_u8(encode_dco(*value, *select, *qualifier)),
            Self::DoubleCommandTime56 {
                value,
                select,
                qualifier,
                time,
            } => {
                buf.put_u8(encode_dco(*value, *select, *qualifier));
                buf.put_slice(&time.to_bytes());
            }
            Self::RegulatingStep {
                step,
                select,
                qualifier,
            } => {
                let rco =
                    step.as_u8() | ((qualifier & 0x1F) << 2) | if *select { 0x80 } else { 0 };
                buf.put_u8(rco);
            }
            Self::SetpointNormalized {
                value,
                select,
                qualifier,
            }
            | Self::SetpointScaled {
                value,
                select,
                qualifier,
            } => {
                buf.put_i16_le(*value);
                buf.put_u8(encode_qos(*select, *qualifier));
            }
            Self::SetpointFloat {
                value,
                select,
                qualifier,
            } => {
                buf.put_f32_le(*value);
                buf.put_u8(encode_qos(*select, *qualifier));
            }
            Self::SetpointFloatTime56 {
                value,
                select,
                qualifier,
                time,
            } => {
                buf.put_f32_le(*value);
                buf.put_u8(encode_qos(*select, *qualifier));
                buf.put_slice(&time.to_bytes());
            }
            Self::Bitstring32Command { value } => buf.put_u32_le(*value),
            Self::Interrogation { qualifier }
            | Self::CounterInterrogation { qualifier }
            | Self::ResetProcess { qualifier } => buf.put_u8(*qualifier),
            Self::Read => {}
            Self::ClockSync { time } => buf.put_slice(&time.to_bytes()),
            Self::TestCommand { pattern } => buf.put_u16_le(*pattern),
            Self::TestCommandTime56 { counter, time } => {
                buf.put_u16_le(*counter);
                buf.put_slice(&time.to_bytes());
            }
        }
    }
}

#[inline]
fn decode_siq(byte: u8) -> (bool, QualityDescriptor) {
    ((byte & 0x01) != 0, QualityDescriptor::from_raw(byte))
}

#[inline]
fn encode_siq(value: bool, quality: &QualityDescriptor) -> u8 {
    (value as u8) | quality.to_raw()
}

#[inline]
fn decode_diq(byte: u8) -> (DoublePointValue, QualityDescriptor) {
    (
        DoublePointValue::from_u8(byte),
        QualityDescriptor::from_raw(byte),
    )
}

#[inline]
fn encode_diq(value: DoublePointValue, quality: &QualityDescriptor) -> u8 {
    value.as_u8() | quality.to_raw()
}

#[inline]
fn decode_sco(byte: u8) -> (bool, bool, u8) {
    ((byte & 0x01) != 0, (byte & 0x80) != 0, (byte >> 2) & 0x1F)
}

#[inline]
fn encode_sco(value: bool, select: bool, qualifier: u8) -> u8 {
    (value as u8) | ((qualifier & 0x1F) << 2) | if select { 0x80 } else { 0 }
}

#[inline]
fn decode_dco(byte: u8) -> (DoublePointValue, bool, u8) {
    (
        DoublePointValue::from_u8(byte),
        (byte & 0x80) != 0,
        (byte >> 2) & 0x1F,
    )
}

#[inline]
fn encode_dco(value: DoublePointValue, select: bool, qualifier: u8) -> u8 {
    value.as_u8() | ((qualifier & 0x1F) << 2) | if select { 0x80 } else { 0 }
}

#[inline]
fn decode_qos(byte: u8) -> (bool, u8) {
    ((byte & 0x80) != 0, byte & 0x7F)
}

#[inline]
fn encode_qos(select: bool, qualifier: u8) -> u8 {
    (qualifier & 0x7F) | if select { 0x80 } else { 0 }
}
