//! Network byte-order access at fixed offsets inside frame buffers.
//!
//! RIPC headers are read in place from the receive buffer and length fields
//! are back-patched in place once a frame is finished, so these helpers work
//! on `(slice, offset)` pairs rather than owned arrays. Every accessor returns
//! `None` instead of panicking when the field would run past the slice.

/// Read a big-endian `u16` starting at `offset`.
///
/// # Examples
///
/// ```
/// use ripcframe::byte_order::read_u16_at;
///
/// assert_eq!(read_u16_at(&[0xff, 0x12, 0x34], 1), Some(0x1234));
/// assert_eq!(read_u16_at(&[0x12], 0), None);
/// ```
#[must_use]
pub fn read_u16_at(bytes: &[u8], offset: usize) -> Option<u16> {
    let end = offset.checked_add(2)?;
    let field: [u8; 2] = bytes.get(offset..end)?.try_into().ok()?;
    #[expect(
        clippy::big_endian_bytes,
        reason = "RIPC length fields are carried in network byte order."
    )]
    let value = u16::from_be_bytes(field);
    Some(value)
}

/// Read a big-endian `u32` starting at `offset`.
///
/// # Examples
///
/// ```
/// use ripcframe::byte_order::read_u32_at;
///
/// assert_eq!(read_u32_at(&[0x00, 0x01, 0x02, 0x03], 0), Some(0x0001_0203));
/// ```
#[must_use]
pub fn read_u32_at(bytes: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let field: [u8; 4] = bytes.get(offset..end)?.try_into().ok()?;
    #[expect(
        clippy::big_endian_bytes,
        reason = "RIPC fragment totals are carried in network byte order."
    )]
    let value = u32::from_be_bytes(field);
    Some(value)
}

/// Overwrite the big-endian `u16` at `offset`.
///
/// Used to finalise length prefixes that were reserved before the size of
/// the data behind them was known.
///
/// # Examples
///
/// ```
/// use ripcframe::byte_order::patch_u16_at;
///
/// let mut frame = [0_u8; 4];
/// assert!(patch_u16_at(&mut frame, 2, 0x0a0b).is_some());
/// assert_eq!(frame, [0, 0, 0x0a, 0x0b]);
/// assert!(patch_u16_at(&mut frame, 3, 1).is_none());
/// ```
#[must_use]
pub fn patch_u16_at(bytes: &mut [u8], offset: usize, value: u16) -> Option<()> {
    let end = offset.checked_add(2)?;
    let field = bytes.get_mut(offset..end)?;
    #[expect(
        clippy::big_endian_bytes,
        reason = "RIPC length fields are carried in network byte order."
    )]
    let encoded = value.to_be_bytes();
    field.copy_from_slice(&encoded);
    Some(())
}

/// Expand a 64-bit shared secret into the eight key bytes used by the
/// obfuscation helper, most significant byte first.
#[must_use]
#[expect(
    clippy::big_endian_bytes,
    reason = "The key schedule starts from the most significant byte."
)]
pub fn secret_key_bytes(secret: u64) -> [u8; 8] { secret.to_be_bytes() }
