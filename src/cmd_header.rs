use bitfield_struct::bitfield;

/// Client command specifier for an initiate download (write) request.
pub const CCS_INITIATE_DOWNLOAD: u8 = 1;
/// Client command specifier for an initiate upload (read) request.
pub const CCS_INITIATE_UPLOAD: u8 = 2;
/// Server command specifier for an initiate upload (read) confirmation.
pub const SCS_INITIATE_UPLOAD: u8 = 2;
/// Server command specifier for an initiate download (write) confirmation.
pub const SCS_INITIATE_DOWNLOAD: u8 = 3;
/// Command specifier shared by both sides to abort a transfer.
pub const CS_ABORT: u8 = 4;

/// Represents the command byte of an SDO initiate frame, on both the
/// download (write) and upload (read) side.
/// The bitfield representation is based on an `u8` (8-bit unsigned integer), with the most significant bit (MSB) ordering.
#[bitfield(u8, order = Msb)]
#[derive(PartialEq, Eq)]
pub struct SdoInitiateCmd {
    /// Command Specifier.
    #[bits(3)]
    pub cs: u8,

    /// Reserved bit, always 0.
    #[bits(1)]
    _reserved_0: u8,

    /// Number of bytes in the 4-byte data field that do not contain data.
    /// Only meaningful when `e` and `s` are both set.
    #[bits(2)]
    pub n: u8,

    /// Expedited Transfer flag.
    #[bits(1)]
    pub e: bool,

    /// Size indicator. When unset the `n` field must be ignored.
    #[bits(1)]
    pub s: bool,
}

impl SdoInitiateCmd {
    /// Command byte of an expedited write carrying `width` bytes. `None`
    /// unless `width` is in 1..=4.
    pub fn expedited_download(width: usize) -> Option<Self> {
        if !(1..=4).contains(&width) {
            return None;
        }
        Some(SdoInitiateCmd::new()
            .with_cs(CCS_INITIATE_DOWNLOAD)
            .with_n((4 - width) as u8)
            .with_e(true)
            .with_s(true))
    }

    pub fn upload_request() -> Self {
        SdoInitiateCmd::new().with_cs(CCS_INITIATE_UPLOAD)
    }

    pub fn is_abort(&self) -> bool {
        self.cs() == CS_ABORT
    }

    /// Number of valid bytes in the data field of an expedited frame.
    pub fn data_len(&self) -> usize {
        if self.e() && self.s() {
            4 - self.n() as usize
        } else {
            4
        }
    }
}
