use crate::codec::ObjectAddress;

/// Canopen Function code prefixes on COB_ID
pub const COB_FUNC_TRANSMIT_SDO: u16 = 0x580;
pub const COB_FUNC_RECEIVE_SDO: u16 = 0x600;
pub const COB_FUNC_MASK: u16 = 0xFF80;
/// Offset between a client request COB-ID and the confirmation the server sends back.
pub const SDO_CONFIRM_OFFSET: u16 = COB_FUNC_RECEIVE_SDO - COB_FUNC_TRANSMIT_SDO;

/// The servo drive answers on node 1.
pub const DRIVE_NODE_ID: u8 = 1;
pub const DRIVE_REQUEST_COB_ID: u16 = COB_FUNC_RECEIVE_SDO | DRIVE_NODE_ID as u16;
pub const DRIVE_CONFIRM_COB_ID: u16 = COB_FUNC_TRANSMIT_SDO | DRIVE_NODE_ID as u16;

/// CiA 402 registers used by the drive.
pub const REG_CONTROL_WORD: ObjectAddress = ObjectAddress::new(0x6040, 0);
pub const REG_WORK_MODE: ObjectAddress = ObjectAddress::new(0x6060, 0);
pub const REG_ACTUAL_POSITION: ObjectAddress = ObjectAddress::new(0x6064, 0);
pub const REG_TARGET_POSITION: ObjectAddress = ObjectAddress::new(0x607A, 0);
pub const REG_ACCELERATION: ObjectAddress = ObjectAddress::new(0x6083, 0);

/// Backlash of the drive, in position units.
pub const POSITION_TOLERANCE: u32 = 18;

/// Control word "2F": a new target position is executed immediately.
pub const CONTROL_WORD_EXECUTE_IMMEDIATELY: u16 = 0x2F;
