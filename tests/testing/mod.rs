#![allow(dead_code)]

pub mod mock_drive;
pub mod util;
