//! An expedited CANopen SDO client for a position-mode servo drive.
//!
//! The crate is layered leaves first:
//! - [`codec`] turns object dictionary accesses into 8-byte SDO frames and back;
//! - [`sdo_client`] runs one request/confirmation transaction over a
//!   [`transport::Transport`], resending until the matching reply shows up;
//! - [`position`] decides when the drive has reached a target;
//! - [`servo`] and [`motion`] drive the motor on top of all that.
//!
//! Only expedited (at most 4 data bytes) transfers are supported.

pub mod cmd_header;
pub mod codec;
pub mod constant;
pub mod error;
pub mod motion;
pub mod position;
pub mod sdo_client;
pub mod servo;
pub mod transport;
pub mod util;

pub use codec::{ObjectAddress, SdoFrame};
pub use error::{AbortCode, ErrorCode, TransportError};
pub use motion::{CancellationToken, MotionOutcome, MotionProfile, MotionSequencer};
pub use position::is_within_tolerance;
pub use sdo_client::{RetryPolicy, SdoClient, SdoReply, SdoRequest};
pub use servo::{MoveOutcome, ServoDrive, WorkMode};
pub use transport::{BlockingTransport, NbTransport, Transport};
