//! XChaCha20-Poly1305 over raw bytes. Callers own nonce handling and framing.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 24;

/// Length of the authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Fill an array from the OS-seeded thread RNG.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

fn xchacha(key: &[u8; 32]) -> XChaCha20Poly1305 {
    XChaCha20Poly1305::new(Key::from_slice(key))
}

/// Encrypt `plaintext`, binding `aad`. The tag is appended to the output.
pub fn encrypt(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    let payload = Payload {
        msg: plaintext,
        aad,
    };
    xchacha(key)
        .encrypt(XNonce::from_slice(nonce), payload)
        .map_err(|_| CryptoError::Encryption("XChaCha20-Poly1305 encryption failed".into()))
}

/// Decrypt and verify. Fails on a wrong key, altered ciphertext, or an
/// `aad` other than the one bound at encryption.
pub fn decrypt(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    if ciphertext.len() < TAG_LEN {
        return Err(CryptoError::Decryption(format!(
            "ciphertext shorter than the {}-byte tag",
            TAG_LEN
        )));
    }
    let payload = Payload {
        msg: ciphertext,
        aad,
    };
    xchacha(key)
        .decrypt(XNonce::from_slice(nonce), payload)
        .map_err(|_| CryptoError::Decryption("XChaCha20-Poly1305 decryption failed".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [42u8; 32];
    const NONCE: [u8; NONCE_LEN] = [1u8; NONCE_LEN];

    /// draft-irtf-cfrg-xchacha-03, appendix A.3.1.
    #[test]
    fn test_xchacha_known_answer() {
        let key: [u8; 32] = hex::decode(
            "808182838485868788898a8b8c8d8e8f909192939495969798999a9b9c9d9e9f",
        )
        .unwrap()
        .try_into()
        .unwrap();
        let nonce: [u8; NONCE_LEN] = hex::decode("404142434445464748494a4b4c4d4e4f5051525354555657")
            .unwrap()
            .try_into()
            .unwrap();
        let aad = hex::decode("50515253c0c1c2c3c4c5c6c7").unwrap();
        let plaintext: &[u8] = b"Ladies and Gentlemen of the class of '99: If I could offer you \
            only one tip for the future, sunscreen would be it.";
        let expected = concat!(
            "bd6d179d3e83d43b9576579493c0e939572a1700252bfaccbed2902c21396cbb",
            "731c7f1b0b4aa6440bf3a82f4eda7e39ae64c6708c54c216cb96b72e1213b452",
            "2f8c9ba40db5d945b11b69b982c1bb9e3f3fac2bc369488f76b2383565d3fff9",
            "21f9664c97637da9768812f615c68b13b52e",
            "c0875924c1c7987947deafd8780acf49",
        );

        let sealed = encrypt(&key, &nonce, plaintext, &aad).unwrap();
        assert_eq!(hex::encode(&sealed), expected);
        assert_eq!(decrypt(&key, &nonce, &sealed, &aad).unwrap(), plaintext);
    }

    #[test]
    fn test_random_bytes_differ() {
        let a: [u8; NONCE_LEN] = random_bytes();
        let b: [u8; NONCE_LEN] = random_bytes();
        assert_ne!(a, b);
    }

    #[test]
    fn test_ciphertext_carries_tag() {
        let sealed = encrypt(&KEY, &NONCE, b"note body", b"aad").unwrap();
        assert_eq!(sealed.len(), b"note body".len() + TAG_LEN);
        assert_eq!(decrypt(&KEY, &NONCE, &sealed, b"aad").unwrap(), b"note body");
    }

    #[test]
    fn test_wrong_key_rejected() {
        let sealed = encrypt(&KEY, &NONCE, b"secret", b"").unwrap();
        let result = decrypt(&[99u8; 32], &NONCE, &sealed, b"");
        assert!(matches!(result, Err(CryptoError::Decryption(_))));
    }

    #[test]
    fn test_other_aad_rejected() {
        let sealed = encrypt(&KEY, &NONCE, b"secret", b"item-a").unwrap();
        let result = decrypt(&KEY, &NONCE, &sealed, b"item-b");
        assert!(matches!(result, Err(CryptoError::Decryption(_))));
    }

    #[test]
    fn test_flipped_bit_rejected() {
        let mut sealed = encrypt(&KEY, &NONCE, b"secret", b"").unwrap();
        sealed[0] ^= 0x01;
        assert!(decrypt(&KEY, &NONCE, &sealed, b"").is_err());
    }

    #[test]
    fn test_truncated_ciphertext_rejected() {
        let result = decrypt(&KEY, &NONCE, &[0u8; 4], b"");
        assert!(matches!(result, Err(CryptoError::Decryption(m)) if m.contains("tag")));
    }
}
