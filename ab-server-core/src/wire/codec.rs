use super::{Window, WireError, WireResult};

/// Bounded, endian-explicit get/set primitives over a `Window` into a
/// buffer. Every read or write here is checked against the window's end
/// before it touches memory; there is no raw indexing anywhere else in the
/// codec stack.
pub struct Codec;

impl Codec {
    fn check(win: Window, offset: usize, width: usize) -> WireResult<(usize, usize)> {
        let start = win.begin.checked_add(offset).ok_or(WireError::ShortBuffer {
            needed: offset + width,
            available: win.len(),
        })?;
        let stop = start.checked_add(width).ok_or(WireError::ShortBuffer {
            needed: offset + width,
            available: win.len(),
        })?;
        if stop > win.end {
            return Err(WireError::ShortBuffer {
                needed: offset + width,
                available: win.len().saturating_sub(offset),
            });
        }
        Ok((start, stop))
    }

    pub fn get_u8(buf: &[u8], win: Window, offset: usize) -> WireResult<u8> {
        let (start, _) = Self::check(win, offset, 1)?;
        Ok(buf[start])
    }

    pub fn get_u16_le(buf: &[u8], win: Window, offset: usize) -> WireResult<u16> {
        let (start, stop) = Self::check(win, offset, 2)?;
        Ok(u16::from_le_bytes(buf[start..stop].try_into().unwrap()))
    }

    pub fn get_u32_le(buf: &[u8], win: Window, offset: usize) -> WireResult<u32> {
        let (start, stop) = Self::check(win, offset, 4)?;
        Ok(u32::from_le_bytes(buf[start..stop].try_into().unwrap()))
    }

    pub fn get_u64_le(buf: &[u8], win: Window, offset: usize) -> WireResult<u64> {
        let (start, stop) = Self::check(win, offset, 8)?;
        Ok(u64::from_le_bytes(buf[start..stop].try_into().unwrap()))
    }

    pub fn get_f32_le(buf: &[u8], win: Window, offset: usize) -> WireResult<f32> {
        Ok(f32::from_bits(Self::get_u32_le(buf, win, offset)?))
    }

    pub fn get_f64_le(buf: &[u8], win: Window, offset: usize) -> WireResult<f64> {
        Ok(f64::from_bits(Self::get_u64_le(buf, win, offset)?))
    }

    pub fn get_bytes<'a>(buf: &'a [u8], win: Window, offset: usize, len: usize) -> WireResult<&'a [u8]> {
        let (start, stop) = Self::check(win, offset, len)?;
        Ok(&buf[start..stop])
    }

    pub fn put_u8(buf: &mut [u8], win: Window, offset: usize, value: u8) -> WireResult<()> {
        let (start, _) = Self::check(win, offset, 1)?;
        buf[start] = value;
        Ok(())
    }

    pub fn put_u16_le(buf: &mut [u8], win: Window, offset: usize, value: u16) -> WireResult<()> {
        let (start, stop) = Self::check(win, offset, 2)?;
        buf[start..stop].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn put_u32_le(buf: &mut [u8], win: Window, offset: usize, value: u32) -> WireResult<()> {
        let (start, stop) = Self::check(win, offset, 4)?;
        buf[start..stop].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn put_u64_le(buf: &mut [u8], win: Window, offset: usize, value: u64) -> WireResult<()> {
        let (start, stop) = Self::check(win, offset, 8)?;
        buf[start..stop].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn put_f32_le(buf: &mut [u8], win: Window, offset: usize, value: f32) -> WireResult<()> {
        Self::put_u32_le(buf, win, offset, value.to_bits())
    }

    pub fn put_f64_le(buf: &mut [u8], win: Window, offset: usize, value: f64) -> WireResult<()> {
        Self::put_u64_le(buf, win, offset, value.to_bits())
    }

    pub fn put_bytes(buf: &mut [u8], win: Window, offset: usize, src: &[u8]) -> WireResult<()> {
        let (start, stop) = Self::check(win, offset, src.len())?;
        buf[start..stop].copy_from_slice(src);
        Ok(())
    }

    /// Rounds `offset` up to the next multiple of `align` (1, 2, 4 or 8).
    pub fn align_up(offset: usize, align: usize) -> usize {
        debug_assert!(align.is_power_of_two());
        (offset + (align - 1)) & !(align - 1)
    }

    /// Zero-pads `buf[win]` from `offset` up to the next multiple of
    /// `align`, returning the padded offset.
    pub fn pad_to(buf: &mut [u8], win: Window, offset: usize, align: usize) -> WireResult<usize> {
        let padded = Self::align_up(offset, align);
        if padded > offset {
            let (start, stop) = Self::check(win, offset, padded - offset)?;
            buf[start..stop].fill(0);
        }
        Ok(padded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_integer_width() {
        let mut buf = [0u8; 16];
        let win = Window::new(0, 16);
        Codec::put_u8(&mut buf, win, 0, 0xAB).unwrap();
        Codec::put_u16_le(&mut buf, win, 1, 0xBEEF).unwrap();
        Codec::put_u32_le(&mut buf, win, 3, 0xDEADBEEF).unwrap();
        Codec::put_u64_le(&mut buf, win, 7, 0x0102030405060708).unwrap();

        assert_eq!(Codec::get_u8(&buf, win, 0).unwrap(), 0xAB);
        assert_eq!(Codec::get_u16_le(&buf, win, 1).unwrap(), 0xBEEF);
        assert_eq!(Codec::get_u32_le(&buf, win, 3).unwrap(), 0xDEADBEEF);
        assert_eq!(Codec::get_u64_le(&buf, win, 7).unwrap(), 0x0102030405060708);
    }

    #[test]
    fn round_trips_floats() {
        let mut buf = [0u8; 12];
        let win = Window::new(0, 12);
        Codec::put_f32_le(&mut buf, win, 0, 1.5f32).unwrap();
        Codec::put_f64_le(&mut buf, win, 4, -2.25f64).unwrap();
        assert_eq!(Codec::get_f32_le(&buf, win, 0).unwrap(), 1.5f32);
        assert_eq!(Codec::get_f64_le(&buf, win, 4).unwrap(), -2.25f64);
    }

    #[test]
    fn rejects_reads_past_window_end() {
        let buf = [0u8; 4];
        let win = Window::new(0, 4);
        assert!(Codec::get_u32_le(&buf, win, 1).is_err());
        assert!(Codec::get_u8(&buf, win, 4).is_err());
    }

    #[test]
    fn split_and_truncate_preserve_containment() {
        let win = Window::new(10, 20);
        let (prefix, suffix) = win.split_at(4).unwrap();
        assert_eq!(prefix, Window::new(10, 14));
        assert_eq!(suffix, Window::new(14, 20));
        assert!(win.split_at(10).is_ok());
        assert!(win.split_at(11).is_err());
    }

    #[test]
    fn align_up_rounds_to_next_multiple() {
        assert_eq!(Codec::align_up(0, 2), 0);
        assert_eq!(Codec::align_up(1, 2), 2);
        assert_eq!(Codec::align_up(3, 4), 4);
        assert_eq!(Codec::align_up(8, 4), 8);
    }
}
