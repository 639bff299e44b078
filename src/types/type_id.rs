//! IEC 60870-5-104 Type Identification.
//!
//! The type identification selects the information-object shape carried by
//! an ASDU, and with it the fixed per-object encoded width the codec uses
//! to walk the object list.

use crate::error::{Iec104Error, Result};

/// IEC 60870-5-104 Type Identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeId {
    // ============================================
    // Process information in monitoring direction
    // ============================================
    /// Single-point information (M_SP_NA_1)
    SinglePoint = 1,

    /// Single-point information with CP24Time2a time tag (M_SP_TA_1)
    SinglePointTime24 = 2,

    /// Double-point information (M_DP_NA_1)
    DoublePoint = 3,

    /// Double-point information with CP24Time2a time tag (M_DP_TA_1)
    DoublePointTime24 = 4,

    /// Step position information (M_ST_NA_1)
    StepPosition = 5,

    /// Bitstring of 32 bit (M_BO_NA_1)
    Bitstring32 = 7,

    /// Measured value, normalized (M_ME_NA_1)
    MeasuredNormalized = 9,

    /// Measured value, normalized with CP24Time2a time tag (M_ME_TA_1)
    MeasuredNormalizedTime24 = 10,

    /// Measured value, scaled (M_ME_NB_1)
    MeasuredScaled = 11,

    /// Measured value, scaled with CP24Time2a time tag (M_ME_TB_1)
    MeasuredScaledTime24 = 12,

    /// Measured value, short floating point (M_ME_NC_1)
    MeasuredFloat = 13,

    /// Measured value, short floating point with CP24Time2a time tag (M_ME_TC_1)
    MeasuredFloatTime24 = 14,

    /// Integrated totals (M_IT_NA_1)
    IntegratedTotals = 15,

    /// Single-point information with CP56Time2a time tag (M_SP_TB_1)
    SinglePointTime56 = 30,

    /// Double-point information with CP56Time2a time tag (M_DP_TB_1)
    DoublePointTime56 = 31,

    /// Measured value, short floating point with CP56Time2a time tag (M_ME_TF_1)
    MeasuredFloatTime56 = 36,

    // ============================================
    // Process information in control direction
    // ============================================
    /// Single command (C_SC_NA_1)
    SingleCommand = 45,

    /// Double command (C_DC_NA_1)
    DoubleCommand = 46,

    /// Regulating step command (C_RC_NA_1)
    RegulatingStep = 47,

    /// Set-point command, normalized (C_SE_NA_1)
    SetpointNormalized = 48,

    /// Set-point command, scaled (C_SE_NB_1)
    SetpointScaled = 49,

    /// Set-point command, short floating point (C_SE_NC_1)
    SetpointFloat = 50,

    /// Bitstring of 32 bit command (C_BO_NA_1)
    Bitstring32Command = 51,

    /// Single command with CP56Time2a time tag (C_SC_TA_1)
    SingleCommandTime56 = 58,

    /// Double command with CP56Time2a time tag (C_DC_TA_1)
    DoubleCommandTime56 = 59,

    /// Set-point command, short floating point with CP56Time2a time tag (C_SE_TC_1)
    SetpointFloatTime56 = 63,

    // ============================================
    // System information in monitoring direction
    // ============================================
    /// End of initialization (M_EI_NA_1)
    EndOfInit = 70,

    // ============================================
    // System information in control direction
    // ============================================
    /// Interrogation command (C_IC_NA_1)
    InterrogationCommand = 100,

    /// Counter interrogation command (C_CI_NA_1)
    CounterInterrogation = 101,

    /// Read command (C_RD_NA_1)
    ReadCommand = 102,

    /// Clock synchronization command (C_CS_NA_1)
    ClockSync = 103,

    /// Test command (C_TS_NA_1)
    TestCommand = 104,

    /// Reset process command (C_RP_NA_1)
    ResetProcess = 105,

    /// Test command with CP56Time2a time tag (C_TS_TA_1)
    TestCommandTime56 = 107,
}

impl TypeId {
    /// Create TypeId from raw byte value.
    #[inline]
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::SinglePoint),
            2 => Ok(Self::SinglePointTime24),
            3 => Ok(Self::DoublePoint),
            4 => Ok(Self::DoublePointTime24),
            5 => Ok(Self::StepPosition),
            7 => Ok(Self::Bitstring32),
            9 => Ok(Self::MeasuredNormalized),
            10 => Ok(Self::MeasuredNormalizedTime24),
            11 => Ok(Self::MeasuredScaled),
            12 => Ok(Self::MeasuredScaledTime24),
            13 => Ok(Self::MeasuredFloat),
            14 => Ok(Self::MeasuredFloatTime24),
            15 => Ok(Self::IntegratedTotals),
            30 => Ok(Self::SinglePointTime56),
            31 => Ok(Self::DoublePointTime56),
            36 => Ok(Self::MeasuredFloatTime56),
            45 => Ok(Self::SingleCommand),
            46 => Ok(Self::DoubleCommand),
            47 => Ok(Self::RegulatingStep),
            48 => Ok(Self::SetpointNormalized),
            49 => Ok(Self::SetpointScaled),
            50 => Ok(Self::SetpointFloat),
            51 => Ok(Self::Bitstring32Command),
            58 => Ok(Self::SingleCommandTime56),
            59 => Ok(Self::DoubleCommandTime56),
            63 => Ok(Self::SetpointFloatTime56),
            70 => Ok(Self::EndOfInit),
            100 => Ok(Self::InterrogationCommand),
            101 => Ok(Self::CounterInterrogation),
            102 => Ok(Self::ReadCommand),
            103 => Ok(Self::ClockSync),
            104 => Ok(Self::TestCommand),
            105 => Ok(Self::ResetProcess),
            107 => Ok(Self::TestCommandTime56),
            _ => Err(Iec104Error::UnknownTypeId(value)),
        }
    }

    /// Convert to raw byte value.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Check if this type is in the monitoring direction (outstation to master).
    #[inline]
    pub const fn is_monitoring(&self) -> bool {
        matches!(self.as_u8(), 1..=36 | 70)
    }

    /// Check if this type is in the control direction (master to outstation).
    #[inline]
    pub const fn is_control(&self) -> bool {
        matches!(self.as_u8(), 45..=63 | 100..=107)
    }

    /// Check if this type carries a time tag.
    #[inline]
    pub const fn has_time_tag(&self) -> bool {
        matches!(
            self,
            Self::SinglePointTime24
                | Self::DoublePointTime24
                | Self::MeasuredNormalizedTime24
                | Self::MeasuredScaledTime24
                | Self::MeasuredFloatTime24
                | Self::SinglePointTime56
                | Self::DoublePointTime56
                | Self::MeasuredFloatTime56
                | Self::SingleCommandTime56
                | Self::DoubleCommandTime56
                | Self::SetpointFloatTime56
                | Self::TestCommandTime56
        )
    }

    /// Encoded width in bytes of one information element of this type,
    /// excluding the object address.
    #[inline]
    pub const fn element_width(&self) -> usize {
        match self {
            Self::SinglePoint => 1,
            Self::SinglePointTime24 => 4,
            Self::DoublePoint => 1,
            Self::DoublePointTime24 => 4,
            Self::StepPosition => 2,
            Self::Bitstring32 => 5,
            Self::MeasuredNormalized => 3,
            Self::MeasuredNormalizedTime24 => 6,
            Self::MeasuredScaled => 3,
            Self::MeasuredScaledTime24 => 6,
            Self::MeasuredFloat => 5,
            Self::MeasuredFloatTime24 => 8,
            Self::IntegratedTotals => 5,
            Self::SinglePointTime56 => 8,
            Self::DoublePointTime56 => 8,
            Self::MeasuredFloatTime56 => 12,
            Self::SingleCommand => 1,
            Self::DoubleCommand => 1,
            Self::RegulatingStep => 1,
            Self::SetpointNormalized => 3,
            Self::SetpointScaled => 3,
            Self::SetpointFloat => 5,
            Self::Bitstring32Command => 4,
            Self::SingleCommandTime56 => 8,
            Self::DoubleCommandTime56 => 8,
            Self::SetpointFloatTime56 => 12,
            Self::EndOfInit => 1,
            Self::InterrogationCommand => 1,
            Self::CounterInterrogation => 1,
            Self::ReadCommand => 0,
            Self::ClockSync => 7,
            Self::TestCommand => 2,
            Self::ResetProcess => 1,
            Self::TestCommandTime56 => 9,
        }
    }

    /// Get the IEC standard name (e.g., "M_SP_NA_1").
    #[inline]
    pub const fn standard_name(&self) -> &'static str {
        match self {
            Self::SinglePoint => "M_SP_NA_1",
            Self::SinglePointTime24 => "M_SP_TA_1",
            Self::DoublePoint => "M_DP_NA_1",
            Self::DoublePointTime24 => "M_DP_TA_1",
            Self::StepPosition => "M_ST_NA_1",
            Self::Bitstring32 => "M_BO_NA_1",
            Self::MeasuredNormalized => "M_ME_NA_1",
            Self::MeasuredNormalizedTime24 => "M_ME_TA_1",
            Self::MeasuredScaled => "M_ME_NB_1",
            Self::MeasuredScaledTime24 => "M_ME_TB_1",
            Self::MeasuredFloat => "M_ME_NC_1",
            Self::MeasuredFloatTime24 => "M_ME_TC_1",
            Self::IntegratedTotals => "M_IT_NA_1",
            Self::SinglePointTime56 => "M_SP_TB_1",
            Self::DoublePointTime56 => "M_DP_TB_1",
            Self::MeasuredFloatTime56 => "M_ME_TF_1",
            Self::SingleCommand => "C_SC_NA_1",
            Self::DoubleCommand => "C_DC_NA_1",
            Self::RegulatingStep => "C_RC_NA_1",
            Self::SetpointNormalized => "C_SE_NA_1",
            Self::SetpointScaled => "C_SE_NB_1",
            Self::SetpointFloat => "C_SE_NC_1",
            Self::Bitstring32Command => "C_BO_NA_1",
            Self::SingleCommandTime56 => "C_SC_TA_1",
            Self::DoubleCommandTime56 => "C_DC_TA_1",
            Self::SetpointFloatTime56 => "C_SE_TC_1",
            Self::EndOfInit => "M_EI_NA_1",
            Self::InterrogationCommand => "C_IC_NA_1",
            Self::CounterInterrogation => "C_CI_NA_1",
            Self::ReadCommand => "C_RD_NA_1",
            Self::ClockSync => "C_CS_NA_1",
            Self::TestCommand => "C_TS_NA_1",
            Self::ResetProcess => "C_RP_NA_1",
            Self::TestCommandTime56 => "C_TS_TA_1",
        }
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.standard_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPE_IDS: [u8; 34] = [
        1, 2, 3, 4, 5, 7, 9, 10, 11, 12, 13, 14, 15, 30, 31, 36, 45, 46, 47, 48, 49, 50, 51,
        58, 59, 63, 70, 100, 101, 102, 103, 104, 105, 107,
    ];

    #[test]
    fn test_type_id_roundtrip() {
        for val in ALL_TYPE_IDS {
            let type_id = TypeId::from_u8(val).unwrap();
            assert_eq!(type_id.as_u8(), val, "roundtrip failed for {}", val);
        }
    }

    #[test]
    fn test_type_id_invalid_values() {
        for val in [0, 6, 8, 16, 29, 37, 44, 52, 64, 71, 99, 106, 108, 255] {
            assert!(TypeId::from_u8(val).is_err(), "expected error for {}", val);
        }
    }

    #[test]
    fn test_type_id_direction() {
        assert!(TypeId::SinglePoint.is_monitoring());
        assert!(TypeId::EndOfInit.is_monitoring());
        assert!(!TypeId::SinglePoint.is_control());

        assert!(TypeId::SingleCommand.is_control());
        assert!(TypeId::InterrogationCommand.is_control());
        assert!(!TypeId::SingleCommand.is_monitoring());
    }

    #[test]
    fn test_type_id_time_tag() {
        assert!(!TypeId::SinglePoint.has_time_tag());
        assert!(TypeId::SinglePointTime24.has_time_tag());
        assert!(TypeId::MeasuredFloatTime56.has_time_tag());
        assert!(!TypeId::ClockSync.has_time_tag());
    }

    #[test]
    fn test_element_widths() {
        assert_eq!(TypeId::SinglePoint.element_width(), 1);
        assert_eq!(TypeId::SinglePointTime56.element_width(), 8);
        assert_eq!(TypeId::MeasuredScaled.element_width(), 3);
        assert_eq!(TypeId::MeasuredFloat.element_width(), 5);
        assert_eq!(TypeId::MeasuredFloatTime56.element_width(), 12);
        assert_eq!(TypeId::IntegratedTotals.element_width(), 5);
        assert_eq!(TypeId::InterrogationCommand.element_width(), 1);
        assert_eq!(TypeId::ReadCommand.element_width(), 0);
        assert_eq!(TypeId::ClockSync.element_width(), 7);
        assert_eq!(TypeId::TestCommandTime56.element_width(), 9);
    }

    #[test]
    fn test_type_id_standard_name() {
        assert_eq!(TypeId::SinglePoint.standard_name(), "M_SP_NA_1");
        assert_eq!(TypeId::MeasuredFloat.standard_name(), "M_ME_NC_1");
        assert_eq!(TypeId::SingleCommand.standard_name(), "C_SC_NA_1");
        assert_eq!(format!("{}", TypeId::InterrogationCommand), "C_IC_NA_1");
    }
}
