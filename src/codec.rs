//! Object dictionary codec: maps `(ObjectAddress, value)` pairs onto the
//! 8-byte payload of an expedited SDO frame and back.

use core::fmt::{self, Display, Formatter};

use embedded_can::Frame;

use crate::cmd_header::SdoInitiateCmd;
use crate::error::ErrorCode;
use crate::util::{create_frame_with_padding, get_cob_id};

/// One entry of the drive's object dictionary.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ObjectAddress {
    pub index: u16,
    pub subindex: u8,
}

impl ObjectAddress {
    pub const fn new(index: u16, subindex: u8) -> Self {
        ObjectAddress { index, subindex }
    }
}

impl Display for ObjectAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}:{:02x}", self.index, self.subindex)
    }
}

/// A standard-id CAN frame that always carries 8 data bytes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SdoFrame {
    pub cob_id: u16,
    pub data: [u8; 8],
}

impl SdoFrame {
    pub fn new(cob_id: u16, data: [u8; 8]) -> Self {
        SdoFrame { cob_id, data }
    }

    pub fn command(&self) -> SdoInitiateCmd {
        SdoInitiateCmd::from(self.data[0])
    }

    pub fn address(&self) -> ObjectAddress {
        ObjectAddress::new(u16::from_le_bytes([self.data[1], self.data[2]]), self.data[3])
    }

    pub fn payload(&self) -> [u8; 4] {
        [self.data[4], self.data[5], self.data[6], self.data[7]]
    }

    pub fn to_can_frame<F: Frame>(&self) -> Result<F, ErrorCode> {
        create_frame_with_padding(self.cob_id, &self.data)
    }

    /// Returns `None` for extended (CAN 2.0B) frames. Short payloads are
    /// padded with zeros.
    pub fn from_can_frame<F: Frame>(frame: &F) -> Option<Self> {
        let cob_id = get_cob_id(frame)?;
        let mut data = [0u8; 8];
        let len = frame.data().len().min(8);
        data[..len].copy_from_slice(&frame.data()[..len]);
        Some(SdoFrame { cob_id, data })
    }
}

impl Display for SdoFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:03X} [8] {:02X?}", self.cob_id, self.data)
    }
}

fn sdo_bytes(cmd: u8, addr: ObjectAddress, payload: [u8; 4]) -> [u8; 8] {
    let index = addr.index.to_le_bytes();
    [
        cmd, index[0], index[1], addr.subindex,
        payload[0], payload[1], payload[2], payload[3],
    ]
}

/// Builds an expedited write of `value` into `addr`, `width` being 1, 2 or 4
/// bytes. The data field is always zero padded to 4 bytes.
pub fn encode_write(cob_id: u16, addr: ObjectAddress, value: u32, width: usize)
    -> Result<SdoFrame, ErrorCode> {
    let limit: u64 = match width {
        1 | 2 | 4 => 1 << (8 * width),
        _ => return Err(ErrorCode::InvalidWidth { width }),
    };
    if value as u64 >= limit {
        return Err(ErrorCode::ValueTooWide { value, width });
    }
    let cmd = SdoInitiateCmd::expedited_download(width)
        .ok_or(ErrorCode::InvalidWidth { width })?
        .into();
    Ok(SdoFrame::new(cob_id, sdo_bytes(cmd, addr, u32_to_bytes_le(value))))
}

pub fn encode_read(cob_id: u16, addr: ObjectAddress) -> SdoFrame {
    let cmd = SdoInitiateCmd::upload_request().into();
    SdoFrame::new(cob_id, sdo_bytes(cmd, addr, [0; 4]))
}

/// Extracts the address and data field, whatever the command byte says.
pub fn decode(frame: &SdoFrame) -> (ObjectAddress, [u8; 4]) {
    (frame.address(), frame.payload())
}

pub fn bytes_to_u32_le(data: [u8; 4]) -> u32 {
    u32::from_le_bytes(data)
}

pub fn u32_to_bytes_le(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

#[cfg(test)]
mod codec_tests {
    use super::*;
    use crate::constant::{DRIVE_REQUEST_COB_ID, REG_ACTUAL_POSITION, REG_TARGET_POSITION, REG_WORK_MODE};

    #[test]
    fn test_encode_target_position() {
        let frame = encode_write(DRIVE_REQUEST_COB_ID, REG_TARGET_POSITION, 500_000, 4).unwrap();
        assert_eq!(frame.cob_id, 0x601);
        assert_eq!(frame.data, [0x23, 0x7A, 0x60, 0x00, 0x20, 0xA1, 0x07, 0x00]);
    }

    #[test]
    fn test_encode_narrow_writes_are_padded() {
        let frame = encode_write(DRIVE_REQUEST_COB_ID, REG_WORK_MODE, 1, 1).unwrap();
        assert_eq!(frame.data, [0x2F, 0x60, 0x60, 0x00, 0x01, 0, 0, 0]);

        let frame = encode_write(DRIVE_REQUEST_COB_ID, ObjectAddress::new(0x6040, 0), 0x2F, 2).unwrap();
        assert_eq!(frame.data, [0x2B, 0x40, 0x60, 0x00, 0x2F, 0x00, 0, 0]);
    }

    #[test]
    fn test_encode_write_rejects_bad_width() {
        for width in [0usize, 3, 5, 8] {
            assert_eq!(
                encode_write(0x601, REG_WORK_MODE, 1, width),
                Err(ErrorCode::InvalidWidth { width })
            );
        }
    }

    #[test]
    fn test_encode_write_rejects_wide_values() {
        assert_eq!(
            encode_write(0x601, REG_WORK_MODE, 0x100, 1),
            Err(ErrorCode::ValueTooWide { value: 0x100, width: 1 })
        );
        assert_eq!(
            encode_write(0x601, REG_WORK_MODE, 0x1_0000, 2),
            Err(ErrorCode::ValueTooWide { value: 0x1_0000, width: 2 })
        );
        assert!(encode_write(0x601, REG_WORK_MODE, 0xFF, 1).is_ok());
        assert!(encode_write(0x601, REG_WORK_MODE, 0xFFFF, 2).is_ok());
        assert!(encode_write(0x601, REG_WORK_MODE, u32::MAX, 4).is_ok());
    }

    #[test]
    fn test_encode_read() {
        let frame = encode_read(0x601, REG_ACTUAL_POSITION);
        assert_eq!(frame.data, [0x40, 0x64, 0x60, 0x00, 0, 0, 0, 0]);
    }

    #[test]
    fn test_decode_ignores_command() {
        let addr = ObjectAddress::new(0x1234, 0x05);
        for value in [0u32, 1, 300_000, 0x8000_0000, u32::MAX] {
            let frame = encode_write(0x601, addr, value, 4).unwrap();
            assert_eq!(decode(&frame), (addr, u32_to_bytes_le(value)));
        }
        let abort = SdoFrame::new(0x581, [0x80, 0x34, 0x12, 0x05, 1, 2, 3, 4]);
        assert_eq!(decode(&abort), (addr, [1, 2, 3, 4]));
    }

    #[test]
    fn test_little_endian_conversion() {
        assert_eq!(u32_to_bytes_le(500_000), [0x20, 0xA1, 0x07, 0x00]);
        assert_eq!(bytes_to_u32_le([0x20, 0xA1, 0x07, 0x00]), 500_000);
        assert_eq!(u32_to_bytes_le(300_000), [0xE0, 0x93, 0x04, 0x00]);
        assert_eq!(bytes_to_u32_le([0xE0, 0x93, 0x04, 0x00]), 300_000);
        // Negative targets wrap around.
        assert_eq!(u32_to_bytes_le(-1i32 as u32), [0xFF; 4]);
    }

    #[test]
    fn test_address_display() {
        assert_eq!(ObjectAddress::new(0x607A, 0).to_string(), "0x607a:00");
    }
}
