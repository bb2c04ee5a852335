//! Keyed obfuscation of message bodies.
//!
//! **This is obfuscation, not security.** The scheme XORs the block with a
//! keystream that is derived from the ciphertext itself, so anyone who
//! knows the algorithm and a few plaintext bytes can recover the rest. It
//! exists for wire compatibility with peers that expect it. Use TLS for
//! confidentiality.
//!
//! Block layout before scrambling:
//!
//! ```text
//! 0..4       random head
//! 4..8       payload length XOR head (big-endian)
//! 8..8+n     payload
//! 8+n..12+n  footer tag
//! 12+n..     random padding up to `calculate_encrypted_size(n)`
//! ```
//!
//! The block is then scrambled in 8-byte chunks. The key starts as the
//! shared secret, most significant byte first; after each byte is XORed
//! with key byte `j`, that key byte becomes the two's complement of the
//! ciphertext byte just written.

mod error;

pub use error::CipherError;
use rand::RngCore;

use crate::byte_order::{read_u32_at, secret_key_bytes};

const HEAD_LEN: usize = 4;
const LENGTH_LEN: usize = 4;
const FOOTER_LEN: usize = 4;
const FRAMING_LEN: usize = HEAD_LEN + LENGTH_LEN + FOOTER_LEN;
const SIZE_SLACK: usize = 19;
const KEY_LEN: usize = 8;

/// Fixed tag closing every block.
pub const FOOTER_TAG: u32 = 0x1d2c_3b4a;

/// Size of the block produced for a payload of `len` bytes: `len` rounded
/// up to a multiple of eight, plus nineteen.
///
/// # Examples
///
/// ```
/// use ripcframe::cipher::calculate_encrypted_size;
///
/// assert_eq!(calculate_encrypted_size(1), 27);
/// assert_eq!(calculate_encrypted_size(8), 27);
/// assert_eq!(calculate_encrypted_size(9), 35);
/// ```
#[must_use]
pub const fn calculate_encrypted_size(len: usize) -> usize { len.next_multiple_of(8) + SIZE_SLACK }

fn scramble(key: &mut [u8; KEY_LEN], block: &mut [u8]) {
    for chunk in block.chunks_mut(KEY_LEN) {
        for (slot, byte) in key.iter_mut().zip(chunk.iter_mut()) {
            *byte ^= *slot;
            *slot = (!*byte).wrapping_add(1);
        }
    }
}

fn unscramble(key: &mut [u8; KEY_LEN], block: &mut [u8]) {
    for chunk in block.chunks_mut(KEY_LEN) {
        for (slot, byte) in key.iter_mut().zip(chunk.iter_mut()) {
            let cipher = *byte;
            *byte ^= *slot;
            *slot = (!cipher).wrapping_add(1);
        }
    }
}

fn key_for(secret: u64) -> Result<[u8; KEY_LEN], CipherError> {
    if secret == 0 {
        return Err(CipherError::NoKey);
    }
    Ok(secret_key_bytes(secret))
}

/// Obfuscate `plain` into the front of `out` with `secret`.
///
/// Returns the number of bytes written, always
/// [`calculate_encrypted_size`]`(plain.len())`.
///
/// # Errors
///
/// Returns [`CipherError::NoKey`] for a zero secret,
/// [`CipherError::EmptyInput`] for an empty payload,
/// [`CipherError::InputTooLarge`] when the length does not fit the 32-bit
/// length field, and [`CipherError::BufferTooSmall`] when `out` cannot hold
/// the block.
pub fn encrypt(secret: u64, plain: &[u8], out: &mut [u8]) -> Result<usize, CipherError> {
    let mut key = key_for(secret)?;
    if plain.is_empty() {
        return Err(CipherError::EmptyInput);
    }
    let len = u32::try_from(plain.len()).map_err(|_| CipherError::InputTooLarge { len: plain.len() })?;
    let size = calculate_encrypted_size(plain.len());
    let available = out.len();
    let block = out.get_mut(..size).ok_or(CipherError::BufferTooSmall {
        needed: size,
        available,
    })?;

    let mut rng = rand::thread_rng();
    let head = rng.next_u32();
    let payload_end = HEAD_LEN + LENGTH_LEN + plain.len();
    #[expect(
        clippy::big_endian_bytes,
        reason = "block fields are carried in network byte order."
    )]
    let (head_bytes, length_bytes, footer_bytes) = (
        head.to_be_bytes(),
        (len ^ head).to_be_bytes(),
        FOOTER_TAG.to_be_bytes(),
    );
    block[..HEAD_LEN].copy_from_slice(&head_bytes);
    block[HEAD_LEN..HEAD_LEN + LENGTH_LEN].copy_from_slice(&length_bytes);
    block[HEAD_LEN + LENGTH_LEN..payload_end].copy_from_slice(plain);
    block[payload_end..payload_end + FOOTER_LEN].copy_from_slice(&footer_bytes);
    rng.fill_bytes(&mut block[payload_end + FOOTER_LEN..]);

    scramble(&mut key, block);
    Ok(size)
}

/// Recover the payload of a block produced by [`encrypt`] into the front of
/// `out`, returning its length.
///
/// # Errors
///
/// Returns [`CipherError::NoKey`] for a zero secret,
/// [`CipherError::EmptyInput`] for an empty block,
/// [`CipherError::InvalidCiphertext`] when the length field or footer do not
/// match the block (typically a wrong secret), and
/// [`CipherError::BufferTooSmall`] when `out` cannot hold the payload.
pub fn decrypt(secret: u64, cipher: &[u8], out: &mut [u8]) -> Result<usize, CipherError> {
    let mut key = key_for(secret)?;
    if cipher.is_empty() {
        return Err(CipherError::EmptyInput);
    }
    if cipher.len() < FRAMING_LEN {
        return Err(CipherError::InvalidCiphertext { len: cipher.len() });
    }
    let mut block = cipher.to_vec();
    unscramble(&mut key, &mut block);

    let invalid = CipherError::InvalidCiphertext { len: cipher.len() };
    let head = read_u32_at(&block, 0).ok_or(invalid)?;
    let len = read_u32_at(&block, HEAD_LEN).ok_or(invalid)? ^ head;
    let len = usize::try_from(len).map_err(|_| invalid)?;
    if len == 0 || calculate_encrypted_size(len) > block.len() {
        return Err(invalid);
    }
    let payload_end = HEAD_LEN + LENGTH_LEN + len;
    if read_u32_at(&block, payload_end) != Some(FOOTER_TAG) {
        return Err(invalid);
    }
    let available = out.len();
    let target = out.get_mut(..len).ok_or(CipherError::BufferTooSmall {
        needed: len,
        available,
    })?;
    target.copy_from_slice(&block[HEAD_LEN + LENGTH_LEN..payload_end]);
    Ok(len)
}
