use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::cmd_header::{SdoInitiateCmd, SCS_INITIATE_UPLOAD};
use crate::codec::{self, ObjectAddress, SdoFrame};
use crate::constant::{COB_FUNC_MASK, COB_FUNC_RECEIVE_SDO, COB_FUNC_TRANSMIT_SDO, DRIVE_NODE_ID, SDO_CONFIRM_OFFSET};
use crate::error::{AbortCode, ErrorCode};
use crate::transport::Transport;

/// One logical object dictionary access, ready to be put on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdoRequest {
    address: ObjectAddress,
    frame: SdoFrame,
    expected_cob_id: u16,
}

impl SdoRequest {
    pub fn write(cob_id: u16, address: ObjectAddress, value: u32, width: usize)
        -> Result<Self, ErrorCode> {
        Self::from_frame(codec::encode_write(cob_id, address, value, width)?)
    }

    pub fn read(cob_id: u16, address: ObjectAddress) -> Result<Self, ErrorCode> {
        Self::from_frame(codec::encode_read(cob_id, address))
    }

    /// A write addressed to the SDO server of `node_id`.
    pub fn write_to_node(node_id: u8, address: ObjectAddress, value: u32, width: usize)
        -> Result<Self, ErrorCode> {
        Self::write(request_cob_id(node_id), address, value, width)
    }

    /// A read addressed to the SDO server of `node_id`.
    pub fn read_from_node(node_id: u8, address: ObjectAddress) -> Result<Self, ErrorCode> {
        Self::read(request_cob_id(node_id), address)
    }

    /// The confirmation is expected on the request COB-ID minus 0x80 and must
    /// echo the requested address.
    pub fn from_frame(frame: SdoFrame) -> Result<Self, ErrorCode> {
        let cob_id = frame.cob_id;
        if cob_id & COB_FUNC_MASK != COB_FUNC_RECEIVE_SDO {
            return Err(ErrorCode::InvalidStandardId { cob_id });
        }
        Ok(SdoRequest {
            address: frame.address(),
            frame,
            expected_cob_id: cob_id - SDO_CONFIRM_OFFSET,
        })
    }

    pub fn address(&self) -> ObjectAddress {
        self.address
    }

    pub fn frame(&self) -> &SdoFrame {
        &self.frame
    }

    pub fn expected_cob_id(&self) -> u16 {
        self.expected_cob_id
    }

    /// True when `frame` is the confirmation of this request.
    pub fn is_matched_by(&self, frame: &SdoFrame) -> bool {
        frame.cob_id == self.expected_cob_id && frame.address() == self.address
    }
}

/// The confirmation frame that resolved a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdoReply {
    pub cob_id: u16,
    pub address: ObjectAddress,
    pub command: u8,
    pub data: [u8; 4],
}

impl SdoReply {
    fn from_frame(frame: &SdoFrame) -> Self {
        let (address, data) = codec::decode(frame);
        SdoReply { cob_id: frame.cob_id, address, command: frame.data[0], data }
    }

    pub fn abort_code(&self) -> Option<AbortCode> {
        SdoInitiateCmd::from(self.command)
            .is_abort()
            .then(|| AbortCode::from_code(codec::bytes_to_u32_le(self.data)))
    }

    /// The data bytes an expedited read confirmation declares valid.
    pub fn value_bytes(&self) -> &[u8] {
        &self.data[..SdoInitiateCmd::from(self.command).data_len()]
    }

    /// The valid data bytes as a little-endian integer. Bytes past the
    /// declared size are undefined on the wire and read as zero.
    pub fn as_u32(&self) -> u32 {
        let mut bytes = [0u8; 4];
        let valid = self.value_bytes();
        bytes[..valid.len()].copy_from_slice(valid);
        codec::bytes_to_u32_le(bytes)
    }

    fn check_abort(&self) -> Result<(), ErrorCode> {
        match self.abort_code() {
            Some(abort) => Err(ErrorCode::SdoAbort { address: self.address, abort }),
            None => Ok(()),
        }
    }
}

/// How hard `execute` tries before giving up.
///
/// The default never gives up, which fits a dedicated, wired drive that
/// always answers eventually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Upper bound on the number of times the request frame is sent.
    pub max_attempts: Option<u32>,
    /// Upper bound on the wall time of one transaction.
    pub deadline: Option<Duration>,
    /// Passed to every `Transport::recv`.
    pub recv_timeout: Option<Duration>,
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = Some(timeout);
        self
    }
}

/// Outcome of one send/receive round of a transaction.
enum Attempt {
    Matched(SdoFrame),
    /// Nothing usable came back; the request has to be sent again.
    NoReply,
}

/// An expedited SDO client bound to one transport.
///
/// Every transaction takes `&mut self`, so a client can never have two
/// requests in flight: replies carry no sequence number, and the only thing
/// telling two identical reads apart is that the second is sent after the
/// first one resolved. Share a client between threads behind a `Mutex`.
pub struct SdoClient<T: Transport> {
    transport: T,
    policy: RetryPolicy,
    node_id: u8,
}

impl<T: Transport> SdoClient<T> {
    pub fn new(transport: T) -> SdoClient<T> {
        SdoClient { transport, policy: RetryPolicy::default(), node_id: DRIVE_NODE_ID }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_node_id(mut self, node_id: u8) -> Self {
        self.node_id = node_id;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn node_id(&self) -> u8 {
        self.node_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Sends `request` and keeps resending it until a frame from the expected
    /// COB-ID echoing the requested address comes back. Anything else read in
    /// between is dropped.
    pub fn execute(&mut self, request: &SdoRequest) -> Result<SdoReply, ErrorCode> {
        let start = Instant::now();
        let mut attempts = 0u32;
        loop {
            if let Some(max) = self.policy.max_attempts {
                if attempts >= max {
                    warn!("[sdo client] giving up on {} after {} attempts", request.address(), attempts);
                    return Err(ErrorCode::TransactionTimeout { attempts });
                }
            }
            if let Some(deadline) = self.policy.deadline {
                if attempts > 0 && start.elapsed() >= deadline {
                    warn!("[sdo client] giving up on {} after {:?}", request.address(), deadline);
                    return Err(ErrorCode::TransactionTimeout { attempts });
                }
            }
            attempts += 1;

            match self.attempt(request)? {
                Attempt::Matched(frame) => {
                    debug!("[sdo client] got reply: {}", frame);
                    return Ok(SdoReply::from_frame(&frame));
                }
                Attempt::NoReply => continue,
            }
        }
    }

    fn attempt(&mut self, request: &SdoRequest) -> Result<Attempt, ErrorCode> {
        if let Err(err) = self.transport.send(request.frame()) {
            if err.is_fatal() {
                return Err(err.into());
            }
            warn!("[sdo client] failed to send {}: {}", request.frame(), err);
            return Ok(Attempt::NoReply);
        }
        debug!("[sdo client] sent a frame: {}", request.frame());

        let frame = match self.transport.recv(self.policy.recv_timeout) {
            Ok(frame) => frame,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                warn!("[sdo client] no reply for {}: {}", request.address(), err);
                return Ok(Attempt::NoReply);
            }
        };

        if request.is_matched_by(&frame) {
            Ok(Attempt::Matched(frame))
        } else {
            debug!("[sdo client] discard unmatched frame {} while waiting for {:03X} {}",
                frame, request.expected_cob_id(), request.address());
            Ok(Attempt::NoReply)
        }
    }

    /// Expedited write of `value` into `address` of this client's node.
    pub fn download(&mut self, address: ObjectAddress, value: u32, width: usize) -> Result<(), ErrorCode> {
        let request = SdoRequest::write_to_node(self.node_id, address, value, width)?;
        let reply = self.execute(&request)?;
        reply.check_abort()
    }

    /// Expedited read of `address` on this client's node. Returns the data
    /// bytes the confirmation declares valid.
    pub fn upload(&mut self, address: ObjectAddress) -> Result<Vec<u8>, ErrorCode> {
        let reply = self.upload_reply(address)?;
        Ok(reply.value_bytes().to_vec())
    }

    pub fn upload_u32(&mut self, address: ObjectAddress) -> Result<u32, ErrorCode> {
        Ok(self.upload_reply(address)?.as_u32())
    }

    /// Reads a two's complement 32-bit value such as a position.
    pub fn upload_i32(&mut self, address: ObjectAddress) -> Result<i32, ErrorCode> {
        Ok(self.upload_u32(address)? as i32)
    }

    fn upload_reply(&mut self, address: ObjectAddress) -> Result<SdoReply, ErrorCode> {
        let request = SdoRequest::read_from_node(self.node_id, address)?;
        let reply = self.execute(&request)?;
        reply.check_abort()?;
        if SdoInitiateCmd::from(reply.command).cs() != SCS_INITIATE_UPLOAD {
            return Err(ErrorCode::UnexpectedReply { address, command: reply.command });
        }
        Ok(reply)
    }
}

/// COB-ID a client sends requests to the SDO server of `node_id` on.
pub fn request_cob_id(node_id: u8) -> u16 {
    COB_FUNC_RECEIVE_SDO | node_id as u16
}

/// Confirmation COB-ID of the SDO server of `node_id`.
pub fn confirm_cob_id(node_id: u8) -> u16 {
    COB_FUNC_TRANSMIT_SDO | node_id as u16
}
