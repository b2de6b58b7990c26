use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use servo_sdo::cmd_header::{SdoInitiateCmd, CCS_INITIATE_DOWNLOAD, CCS_INITIATE_UPLOAD, SCS_INITIATE_UPLOAD};
use servo_sdo::codec::{bytes_to_u32_le, u32_to_bytes_le};
use servo_sdo::constant::{
    CONTROL_WORD_EXECUTE_IMMEDIATELY, DRIVE_NODE_ID, REG_ACCELERATION, REG_ACTUAL_POSITION,
    REG_CONTROL_WORD, REG_TARGET_POSITION, REG_WORK_MODE,
};
use servo_sdo::sdo_client::{confirm_cob_id, request_cob_id};
use servo_sdo::{AbortCode, CancellationToken, ObjectAddress, SdoFrame, Transport, TransportError};

/// A servo drive answering SDO requests like the real one would, with
/// optional stray frames and lost replies on the bus.
pub struct MockDrive {
    node_id: u8,
    /// Value and width of every writable object.
    objects: HashMap<ObjectAddress, (u32, usize)>,
    actual: i64,
    /// How far the shaft travels between two reads of the actual position.
    pub speed: i64,
    /// Where the drive settles relative to the commanded target.
    pub settle_offset: i64,
    /// Every n-th receive returns a frame that is not the confirmation.
    pub noise_every: Option<usize>,
    /// Every n-th receive loses the confirmation.
    pub drop_every: Option<usize>,
    /// Cancels the token once the shaft passes the given position.
    pub cancel_beyond: Option<(i64, CancellationToken)>,
    pub received: Vec<SdoFrame>,
    pub target_writes: Vec<i32>,
    pub acceleration_writes: Vec<u32>,
    replies: VecDeque<SdoFrame>,
    recv_count: usize,
}

impl MockDrive {
    pub fn new() -> Self {
        let objects = [
            (REG_WORK_MODE, (0, 1)),
            (REG_CONTROL_WORD, (0, 2)),
            (REG_ACCELERATION, (0, 4)),
            (REG_TARGET_POSITION, (0, 4)),
        ]
        .into_iter()
        .collect();
        MockDrive {
            node_id: DRIVE_NODE_ID,
            objects,
            actual: 0,
            speed: 250_000,
            settle_offset: 0,
            noise_every: None,
            drop_every: None,
            cancel_beyond: None,
            received: Vec::new(),
            target_writes: Vec::new(),
            acceleration_writes: Vec::new(),
            replies: VecDeque::new(),
            recv_count: 0,
        }
    }

    pub fn with_actual(mut self, actual: i64) -> Self {
        self.actual = actual;
        self
    }

    pub fn actual(&self) -> i64 {
        self.actual
    }

    pub fn object(&self, address: ObjectAddress) -> Option<u32> {
        self.objects.get(&address).map(|(value, _)| *value)
    }


    fn motion_enabled(&self) -> bool {
        self.object(REG_WORK_MODE) == Some(1)
            && self.object(REG_CONTROL_WORD) == Some(CONTROL_WORD_EXECUTE_IMMEDIATELY as u32)
    }

    fn step(&mut self) {
        if !self.motion_enabled() {
            return;
        }
        let target = self.object(REG_TARGET_POSITION).unwrap_or(0) as i32 as i64;
        let goal = target + self.settle_offset;
        let delta = (goal - self.actual).clamp(-self.speed, self.speed);
        self.actual += delta;

        if let Some((threshold, token)) = &self.cancel_beyond {
            if self.actual >= *threshold {
                token.cancel();
            }
        }
    }

    fn frame(&self, cmd: u8, address: ObjectAddress, payload: [u8; 4]) -> SdoFrame {
        let index = address.index.to_le_bytes();
        SdoFrame::new(
            confirm_cob_id(self.node_id),
            [cmd, index[0], index[1], address.subindex, payload[0], payload[1], payload[2], payload[3]],
        )
    }

    fn abort(&self, address: ObjectAddress, abort: AbortCode) -> SdoFrame {
        self.frame(0x80, address, u32_to_bytes_le(abort.code()))
    }

    fn process(&mut self, request: &SdoFrame) -> Option<SdoFrame> {
        if request.cob_id != request_cob_id(self.node_id) {
            return None;
        }
        let cmd = request.command();
        let address = request.address();
        let reply = match cmd.cs() {
            CCS_INITIATE_DOWNLOAD => self.download(address, cmd.data_len(), request.payload()),
            CCS_INITIATE_UPLOAD => self.upload(address),
            _ => self.abort(address, AbortCode::CommandSpecifierNotValidOrUnknown),
        };
        Some(reply)
    }

    fn download(&mut self, address: ObjectAddress, width: usize, payload: [u8; 4]) -> SdoFrame {
        if address == REG_ACTUAL_POSITION {
            return self.abort(address, AbortCode::AttemptToWriteReadOnlyObject);
        }
        let Some(&(_, object_width)) = self.objects.get(&address) else {
            return self.abort(address, AbortCode::ObjectDoesNotExistInObjectDictionary);
        };
        if width != object_width {
            return self.abort(address, AbortCode::DataTypeMismatchLengthMismatch);
        }
        let mut bytes = [0u8; 4];
        bytes[..width].copy_from_slice(&payload[..width]);
        let value = bytes_to_u32_le(bytes);
        self.objects.insert(address, (value, width));

        if address == REG_TARGET_POSITION {
            self.target_writes.push(value as i32);
        } else if address == REG_ACCELERATION {
            self.acceleration_writes.push(value);
        }
        self.frame(0x60, address, [0; 4])
    }

    fn upload(&mut self, address: ObjectAddress) -> SdoFrame {
        let (value, width) = if address == REG_ACTUAL_POSITION {
            self.step();
            (self.actual as i32 as u32, 4)
        } else {
            match self.objects.get(&address) {
                Some(&entry) => entry,
                None => return self.abort(address, AbortCode::ObjectDoesNotExistInObjectDictionary),
            }
        };
        let cmd = SdoInitiateCmd::new()
            .with_cs(SCS_INITIATE_UPLOAD)
            .with_n((4 - width) as u8)
            .with_e(true)
            .with_s(true);
        self.frame(cmd.into(), address, u32_to_bytes_le(value))
    }

    /// Alternates between a frame from another node echoing the same address
    /// and a confirmation for an unrelated object.
    fn stray_frame(&self) -> SdoFrame {
        let last = self.received.last().map(|f| f.address()).unwrap_or(REG_WORK_MODE);
        let index = last.index.to_le_bytes();
        if self.recv_count % 2 == 0 {
            SdoFrame::new(0x582, [0x60, index[0], index[1], last.subindex, 0, 0, 0, 0])
        } else {
            self.frame(0x4B, ObjectAddress::new(0x1017, 0), [0xE8, 0x03, 0, 0])
        }
    }
}

impl Transport for MockDrive {
    fn send(&mut self, frame: &SdoFrame) -> Result<(), TransportError> {
        self.received.push(*frame);
        if let Some(reply) = self.process(frame) {
            // Only the latest request gets answered.
            self.replies.clear();
            self.replies.push_back(reply);
        }
        Ok(())
    }

    fn recv(&mut self, _timeout: Option<Duration>) -> Result<SdoFrame, TransportError> {
        self.recv_count += 1;
        if self.noise_every.map_or(false, |n| self.recv_count % n == 0) {
            return Ok(self.stray_frame());
        }
        if self.drop_every.map_or(false, |n| self.recv_count % n == 0) {
            self.replies.pop_front();
            return Err(TransportError::Timeout);
        }
        self.replies.pop_front().ok_or(TransportError::Timeout)
    }
}

/// Replays a fixed list of receive results and records what was sent.
#[derive(Default)]
pub struct ScriptedBus {
    pub sent: Vec<SdoFrame>,
    pub replies: VecDeque<Result<SdoFrame, TransportError>>,
}

impl ScriptedBus {
    pub fn new(replies: Vec<Result<SdoFrame, TransportError>>) -> Self {
        ScriptedBus { sent: Vec::new(), replies: replies.into() }
    }
}

impl Transport for ScriptedBus {
    fn send(&mut self, frame: &SdoFrame) -> Result<(), TransportError> {
        self.sent.push(*frame);
        Ok(())
    }

    fn recv(&mut self, _timeout: Option<Duration>) -> Result<SdoFrame, TransportError> {
        self.replies.pop_front().unwrap_or(Err(TransportError::Timeout))
    }
}
