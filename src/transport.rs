//! The bus side of the SDO client.
//!
//! The engine only needs to push one 8-byte standard frame out and pull one
//! back. Any `embedded-can` device can be plugged in through
//! [`BlockingTransport`] or [`NbTransport`]; tests use an in-memory bus.

use std::time::{Duration, Instant};

use embedded_can::{Error, Frame};
use log::debug;

use crate::codec::SdoFrame;
use crate::error::TransportError;

pub trait Transport {
    fn send(&mut self, frame: &SdoFrame) -> Result<(), TransportError>;

    /// Blocks until a standard frame arrives, the timeout (if any) elapses,
    /// or the adapter reports an error.
    fn recv(&mut self, timeout: Option<Duration>) -> Result<SdoFrame, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, frame: &SdoFrame) -> Result<(), TransportError> {
        (**self).send(frame)
    }

    fn recv(&mut self, timeout: Option<Duration>) -> Result<SdoFrame, TransportError> {
        (**self).recv(timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, frame: &SdoFrame) -> Result<(), TransportError> {
        (**self).send(frame)
    }

    fn recv(&mut self, timeout: Option<Duration>) -> Result<SdoFrame, TransportError> {
        (**self).recv(timeout)
    }
}

fn to_device_frame<F: Frame>(frame: &SdoFrame) -> Result<F, TransportError> {
    frame.to_can_frame().map_err(|ec| TransportError::InvalidFrame(ec.to_string()))
}

fn from_device_frame<F: Frame + core::fmt::Debug>(frame: &F) -> Option<SdoFrame> {
    let sdo_frame = SdoFrame::from_can_frame(frame);
    if sdo_frame.is_none() {
        debug!("[sdo client] skip a non-standard frame: {:?}", frame);
    }
    sdo_frame
}

/// Adapter for devices implementing `embedded_can::blocking::Can`.
///
/// Such devices have no notion of a receive timeout, so `recv` ignores it and
/// blocks until the device yields a frame.
pub struct BlockingTransport<C> {
    can: C,
}

impl<C> BlockingTransport<C> {
    pub fn new(can: C) -> Self {
        BlockingTransport { can }
    }

    pub fn into_inner(self) -> C {
        self.can
    }
}

impl<C> Transport for BlockingTransport<C>
where
    C: embedded_can::blocking::Can,
    C::Frame: core::fmt::Debug,
{
    fn send(&mut self, frame: &SdoFrame) -> Result<(), TransportError> {
        let frame: C::Frame = to_device_frame(frame)?;
        self.can.transmit(&frame).map_err(|e| TransportError::Bus(e.kind()))
    }

    fn recv(&mut self, _timeout: Option<Duration>) -> Result<SdoFrame, TransportError> {
        loop {
            let frame = self.can.receive().map_err(|e| TransportError::Bus(e.kind()))?;
            if let Some(sdo_frame) = from_device_frame(&frame) {
                return Ok(sdo_frame);
            }
        }
    }
}

/// Adapter for devices implementing `embedded_can::nb::Can`. Receiving polls
/// the device until a frame shows up or the timeout elapses.
pub struct NbTransport<C> {
    can: C,
}

impl<C> NbTransport<C> {
    pub fn new(can: C) -> Self {
        NbTransport { can }
    }

    pub fn into_inner(self) -> C {
        self.can
    }
}

impl<C> Transport for NbTransport<C>
where
    C: embedded_can::nb::Can,
    C::Frame: core::fmt::Debug,
{
    fn send(&mut self, frame: &SdoFrame) -> Result<(), TransportError> {
        let frame: C::Frame = to_device_frame(frame)?;
        let replaced = nb::block!(self.can.transmit(&frame)).map_err(|e| TransportError::Bus(e.kind()))?;
        if let Some(replaced) = replaced {
            debug!("[sdo client] lower priority frame dropped from the mailbox: {:?}", replaced);
        }
        Ok(())
    }

    fn recv(&mut self, timeout: Option<Duration>) -> Result<SdoFrame, TransportError> {
        let start = Instant::now();
        loop {
            match self.can.receive() {
                Ok(frame) => {
                    if let Some(sdo_frame) = from_device_frame(&frame) {
                        return Ok(sdo_frame);
                    }
                }
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(e)) => return Err(TransportError::Bus(e.kind())),
            }
            if let Some(timeout) = timeout {
                if start.elapsed() >= timeout {
                    return Err(TransportError::Timeout);
                }
            }
            core::hint::spin_loop();
        }
    }
}
