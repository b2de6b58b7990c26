use embedded_can::{Frame, Id, StandardId};

use crate::error::ErrorCode;

pub fn get_cob_id<F: Frame>(frame: &F) -> Option<u16> {
    if let Id::Standard(sid) = frame.id() {
        return Some(sid.as_raw());
    }
    // No standard id. We only support CAN 2.0a in current version.
    None
}

pub fn create_frame_with_padding<F: Frame>(cob_id: u16, data: &[u8]) -> Result<F, ErrorCode> {
    let mut packet = [0u8; 8];
    let len = data.len().min(8);
    packet[..len].copy_from_slice(&data[..len]);

    F::new(StandardId::new(cob_id).ok_or(ErrorCode::InvalidStandardId { cob_id })?, &packet)
        .ok_or(ErrorCode::FrameCreationFailed { data: data.to_vec() })
}
