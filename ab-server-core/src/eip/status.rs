//! EIP encapsulation status codes — `spec.md` §4.3, §7.

pub const SUCCESS: u32 = 0x0000;
pub const UNSUPPORTED: u32 = 0x0001;
pub const NO_RESOURCE: u32 = 0x0002;
pub const BAD_PAYLOAD: u32 = 0x0003;
pub const BAD_PARAM: u32 = 0x0064;
pub const OUT_OF_BOUNDS: u32 = 0x0065;
pub const BAD_VERSION: u32 = 0x0069;
pub const NOT_ALLOWED: u32 = 0x006A;
