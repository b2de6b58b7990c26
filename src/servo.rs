//! Typed access to the servo drive's CiA 402 objects on top of [`SdoClient`].

use log::{debug, info};

use crate::constant::{
    CONTROL_WORD_EXECUTE_IMMEDIATELY, REG_ACCELERATION, REG_ACTUAL_POSITION, REG_CONTROL_WORD,
    REG_TARGET_POSITION, REG_WORK_MODE,
};
use crate::error::ErrorCode;
use crate::motion::CancellationToken;
use crate::position::has_reached;
use crate::sdo_client::SdoClient;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkMode {
    /// Absolute position mode.
    AbsolutePosition = 1,
    ProfileVelocity = 3,
    Homing = 6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Reached { position: i32 },
    Cancelled,
}

pub struct ServoDrive<T: Transport> {
    client: SdoClient<T>,
}

impl<T: Transport> ServoDrive<T> {
    pub fn new(client: SdoClient<T>) -> Self {
        ServoDrive { client }
    }

    pub fn client(&self) -> &SdoClient<T> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut SdoClient<T> {
        &mut self.client
    }

    pub fn into_client(self) -> SdoClient<T> {
        self.client
    }

    pub fn set_work_mode(&mut self, mode: WorkMode) -> Result<(), ErrorCode> {
        debug!("[servo] work mode = {:?}", mode);
        self.client.download(REG_WORK_MODE, mode as u32, 1)
    }

    pub fn set_control_word(&mut self, control_word: u16) -> Result<(), ErrorCode> {
        debug!("[servo] control word = {:#06x}", control_word);
        self.client.download(REG_CONTROL_WORD, control_word as u32, 2)
    }

    pub fn set_acceleration(&mut self, acceleration: u32) -> Result<(), ErrorCode> {
        debug!("[servo] acceleration = {}", acceleration);
        self.client.download(REG_ACCELERATION, acceleration, 4)
    }

    pub fn set_target_position(&mut self, target: i32) -> Result<(), ErrorCode> {
        debug!("[servo] target position = {}", target);
        self.client.download(REG_TARGET_POSITION, target as u32, 4)
    }

    pub fn actual_position(&mut self) -> Result<i32, ErrorCode> {
        self.client.upload_i32(REG_ACTUAL_POSITION)
    }

    pub fn is_at(&mut self, target: i32) -> Result<bool, ErrorCode> {
        Ok(has_reached(self.actual_position()? as i64, target as i64))
    }

    /// Absolute position mode, with new targets executed immediately.
    pub fn prepare(&mut self) -> Result<(), ErrorCode> {
        self.set_work_mode(WorkMode::AbsolutePosition)?;
        self.set_control_word(CONTROL_WORD_EXECUTE_IMMEDIATELY)
    }

    /// Keeps commanding `target` until the drive reports a position within
    /// backlash of it. `cancel` is only looked at between two transactions.
    pub fn move_to(&mut self, target: i32, cancel: &CancellationToken) -> Result<MoveOutcome, ErrorCode> {
        loop {
            if cancel.is_cancelled() {
                info!("[servo] move to {} cancelled", target);
                return Ok(MoveOutcome::Cancelled);
            }
            if let Some(position) = self.reached(target)? {
                return Ok(MoveOutcome::Reached { position });
            }
            if cancel.is_cancelled() {
                info!("[servo] move to {} cancelled", target);
                return Ok(MoveOutcome::Cancelled);
            }
            self.set_target_position(target)?;
        }
    }

    /// Like [`ServoDrive::move_to`] but cannot be cancelled. Used to bring the
    /// drive back to a known place on shutdown.
    pub fn drive_to(&mut self, target: i32) -> Result<i32, ErrorCode> {
        loop {
            if let Some(position) = self.reached(target)? {
                return Ok(position);
            }
            self.set_target_position(target)?;
        }
    }

    /// Reads the actual position and returns it once within backlash of `target`.
    fn reached(&mut self, target: i32) -> Result<Option<i32>, ErrorCode> {
        let position = self.actual_position()?;
        if has_reached(position as i64, target as i64) {
            info!("[servo] reached {} (actual {})", target, position);
            return Ok(Some(position));
        }
        debug!("[servo] actual {} -> send target {}", position, target);
        Ok(None)
    }
}
