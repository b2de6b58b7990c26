use core::fmt::{self, Display, Formatter};

use embedded_can::ErrorKind;
use thiserror::Error;

use crate::codec::ObjectAddress;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    #[error("invalid data width: {width} (expected 1, 2 or 4 bytes)")]
    InvalidWidth { width: usize },
    #[error("value {value:#x} does not fit in {width} byte(s)")]
    ValueTooWide { value: u32, width: usize },
    #[error("invalid standard id: {cob_id:#x}")]
    InvalidStandardId { cob_id: u16 },
    #[error("frame creation failed, data: {data:x?}")]
    FrameCreationFailed { data: Vec<u8> },
    #[error("no matching SDO reply after {attempts} attempt(s)")]
    TransactionTimeout { attempts: u32 },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("SDO transfer aborted on {address}: {abort}")]
    SdoAbort { address: ObjectAddress, abort: AbortCode },
    #[error("unexpected reply command {command:#04x} on {address}")]
    UnexpectedReply { address: ObjectAddress, command: u8 },
}

/// Failures reported by a [`Transport`](crate::transport::Transport).
///
/// Everything except [`TransportError::Disconnected`] and
/// [`TransportError::InvalidFrame`] means "no reply yet" to the transaction
/// engine, which resends the pending request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("CAN bus error: {0:?}")]
    Bus(ErrorKind),
    #[error("receive timed out")]
    Timeout,
    #[error("CAN adapter disconnected")]
    Disconnected,
    #[error("adapter cannot carry frame: {0}")]
    InvalidFrame(String),
    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::Disconnected | TransportError::InvalidFrame(_))
    }
}

impl From<ErrorKind> for TransportError {
    fn from(kind: ErrorKind) -> Self {
        TransportError::Bus(kind)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum AbortCode {
    ToggleBitNotAlternated,
    SdoProtocolTimedOut,
    CommandSpecifierNotValidOrUnknown,
    OutOfMemory,
    UnsupportedAccessToObject,
    AttemptToReadWriteOnlyObject,
    AttemptToWriteReadOnlyObject,
    ObjectDoesNotExistInObjectDictionary,
    GeneralParameterIncompatibility,
    GeneralInternalIncompatibility,
    HardwareError,
    DataTypeMismatchLengthMismatch,
    DataTypeMismatchLengthTooHigh,
    DataTypeMismatchLengthTooLow,
    SubIndexDoesNotExist,
    ValueRangeExceeded,
    ValueWrittenTooHigh,
    ValueWrittenTooLow,
    MaxValueLessThanMinValue,
    GeneralError,
    DataTransferOrStoreFailed,
    DataTransferOrStoreFailedDueToLocalControl,
    DataTransferOrStoreFailedDueToDeviceState,

    /// A code this client has no name for.
    Unknown(u32),
}

impl AbortCode {
    pub fn code(&self) -> u32 {
        match *self {
            AbortCode::ToggleBitNotAlternated => 0x0503_0000,
            AbortCode::SdoProtocolTimedOut => 0x0504_0000,
            AbortCode::CommandSpecifierNotValidOrUnknown => 0x0504_0001,
            AbortCode::OutOfMemory => 0x0504_0005,
            AbortCode::UnsupportedAccessToObject => 0x0601_0000,
            AbortCode::AttemptToReadWriteOnlyObject => 0x0601_0001,
            AbortCode::AttemptToWriteReadOnlyObject => 0x0601_0002,
            AbortCode::ObjectDoesNotExistInObjectDictionary => 0x0602_0000,
            AbortCode::GeneralParameterIncompatibility => 0x0604_0043,
            AbortCode::GeneralInternalIncompatibility => 0x0604_0047,
            AbortCode::HardwareError => 0x0606_0000,
            AbortCode::DataTypeMismatchLengthMismatch => 0x0607_0010,
            AbortCode::DataTypeMismatchLengthTooHigh => 0x0607_0012,
            AbortCode::DataTypeMismatchLengthTooLow => 0x0607_0013,
            AbortCode::SubIndexDoesNotExist => 0x0609_0011,
            AbortCode::ValueRangeExceeded => 0x0609_0030,
            AbortCode::ValueWrittenTooHigh => 0x0609_0031,
            AbortCode::ValueWrittenTooLow => 0x0609_0032,
            AbortCode::MaxValueLessThanMinValue => 0x0609_0036,
            AbortCode::GeneralError => 0x0800_0000,
            AbortCode::DataTransferOrStoreFailed => 0x0800_0020,
            AbortCode::DataTransferOrStoreFailedDueToLocalControl => 0x0800_0021,
            AbortCode::DataTransferOrStoreFailedDueToDeviceState => 0x0800_0022,
            AbortCode::Unknown(code) => code,
        }
    }

    pub fn description(&self) -> &'static str {
        match *self {
            AbortCode::ToggleBitNotAlternated => "Toggle bit not alternated",
            AbortCode::SdoProtocolTimedOut => "SDO protocol timed out",
            AbortCode::CommandSpecifierNotValidOrUnknown => "Client/server command specifier not valid or unknown",
            AbortCode::OutOfMemory => "Out of memory",
            AbortCode::UnsupportedAccessToObject => "Unsupported access to an object",
            AbortCode::AttemptToReadWriteOnlyObject => "Attempt to read a write only object",
            AbortCode::AttemptToWriteReadOnlyObject => "Attempt to write a read only object",
            AbortCode::ObjectDoesNotExistInObjectDictionary => "Object does not exist in the object dictionary",
            AbortCode::GeneralParameterIncompatibility => "General parameter incompatibility reason",
            AbortCode::GeneralInternalIncompatibility => "General internal incompatibility in the device",
            AbortCode::HardwareError => "Access failed due to a hardware error",
            AbortCode::DataTypeMismatchLengthMismatch => "Data type does not match; length of service parameter does not match",
            AbortCode::DataTypeMismatchLengthTooHigh => "Data type does not match; length of service parameter too high",
            AbortCode::DataTypeMismatchLengthTooLow => "Data type does not match; length of service parameter too low",
            AbortCode::SubIndexDoesNotExist => "Sub-index does not exist",
            AbortCode::ValueRangeExceeded => "Value range of parameter exceeded (only for write access)",
            AbortCode::ValueWrittenTooHigh => "Value of parameter written too high",
            AbortCode::ValueWrittenTooLow => "Value of parameter written too low",
            AbortCode::MaxValueLessThanMinValue => "Maximum value is less than minimum value",
            AbortCode::GeneralError => "General error",
            AbortCode::DataTransferOrStoreFailed => "Data cannot be transferred or stored to the application",
            AbortCode::DataTransferOrStoreFailedDueToLocalControl => "Data cannot be transferred or stored to the application because of local control",
            AbortCode::DataTransferOrStoreFailedDueToDeviceState => "Data cannot be transferred or stored to the application because of the present device state",
            AbortCode::Unknown(_) => "Unknown abort code",
        }
    }

    pub fn from_code(code: u32) -> Self {
        match code {
            0x0503_0000 => AbortCode::ToggleBitNotAlternated,
            0x0504_0000 => AbortCode::SdoProtocolTimedOut,
            0x0504_0001 => AbortCode::CommandSpecifierNotValidOrUnknown,
            0x0504_0005 => AbortCode::OutOfMemory,
            0x0601_0000 => AbortCode::UnsupportedAccessToObject,
            0x0601_0001 => AbortCode::AttemptToReadWriteOnlyObject,
            0x0601_0002 => AbortCode::AttemptToWriteReadOnlyObject,
            0x0602_0000 => AbortCode::ObjectDoesNotExistInObjectDictionary,
            0x0604_0043 => AbortCode::GeneralParameterIncompatibility,
            0x0604_0047 => AbortCode::GeneralInternalIncompatibility,
            0x0606_0000 => AbortCode::HardwareError,
            0x0607_0010 => AbortCode::DataTypeMismatchLengthMismatch,
            0x0607_0012 => AbortCode::DataTypeMismatchLengthTooHigh,
            0x0607_0013 => AbortCode::DataTypeMismatchLengthTooLow,
            0x0609_0011 => AbortCode::SubIndexDoesNotExist,
            0x0609_0030 => AbortCode::ValueRangeExceeded,
            0x0609_0031 => AbortCode::ValueWrittenTooHigh,
            0x0609_0032 => AbortCode::ValueWrittenTooLow,
            0x0609_0036 => AbortCode::MaxValueLessThanMinValue,
            0x0800_0000 => AbortCode::GeneralError,
            0x0800_0020 => AbortCode::DataTransferOrStoreFailed,
            0x0800_0021 => AbortCode::DataTransferOrStoreFailedDueToLocalControl,
            0x0800_0022 => AbortCode::DataTransferOrStoreFailedDueToDeviceState,
            other => AbortCode::Unknown(other),
        }
    }
}

impl Display for AbortCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x} ({})", self.code(), self.description())
    }
}
