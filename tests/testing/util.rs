use lazy_static::lazy_static;
use servo_sdo::SdoFrame;

lazy_static! {
    static ref LOGGER: () = {
        let _ = env_logger::builder().is_test(true).try_init();
    };
}

pub fn init_logger() {
    lazy_static::initialize(&LOGGER);
}

pub fn frame_to_string(frame: &SdoFrame) -> String {
    let data_string = frame
        .data
        .iter()
        .fold(String::from(""), |a, b| format!("{} {:02x}", a, b));

    format!("{:X}  [8]{}", frame.cob_id, data_string)
}

/// Shorthand for building a frame in tests.
pub fn genf(cob_id: u16, data: &[u8]) -> SdoFrame {
    let mut bytes = [0u8; 8];
    bytes[..data.len()].copy_from_slice(data);
    SdoFrame::new(cob_id, bytes)
}
