//! Fuzz target for key exchange record decoding
//!
//! # Strategy
//!
//! - Random bytes: arbitrary CBOR into both record decoders
//! - Deeply nested: arrays nested to arbitrary depth
//! - Huge lengths: byte strings claiming lengths far past the input
//! - Scheme confusion: a valid map whose `scheme` tag names another variant
//!
//! # Invariants
//!
//! - Decoding never panics and never allocates the claimed length
//! - Anything that decodes re-encodes to a record that decodes identically

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use wardline_core::{KeyRequestData, KeyResponseData};

#[derive(Debug, Clone, Arbitrary)]
enum CborAttack {
    RandomBytes { bytes: Vec<u8> },
    DeeplyNested { depth: u8 },
    HugeLength { claimed_len_exponent: u8 },
    SchemeConfusion { scheme: u8, key_id: String },
}

fuzz_target!(|attack: CborAttack| {
    let bytes = match attack {
        CborAttack::RandomBytes { bytes } => bytes,
        CborAttack::DeeplyNested { depth } => {
            let mut bytes = vec![0x81; usize::from(depth % 64)];
            bytes.push(0x01);
            bytes
        },
        CborAttack::HugeLength { claimed_len_exponent } => {
            let exponent = u32::from(claimed_len_exponent % 32);
            let mut bytes = vec![0x5A];
            bytes.extend_from_slice(&(1u32 << exponent).to_be_bytes());
            bytes.extend_from_slice(&[0xAA; 8]);
            bytes
        },
        CborAttack::SchemeConfusion { scheme, key_id } => {
            let name: &[u8] = match scheme % 4 {
                0 => b"DIFFIE_HELLMAN",
                1 => b"ASYMMETRIC_WRAPPED",
                2 => b"SYMMETRIC_WRAPPED",
                _ => b"UNKNOWN",
            };
            let mut bytes = vec![0xA2, 0x66];
            bytes.extend_from_slice(b"scheme");
            bytes.push(0x60 | name.len() as u8);
            bytes.extend_from_slice(name);
            bytes.push(0x66);
            bytes.extend_from_slice(b"key_id");
            let key_id = key_id.as_bytes();
            bytes.push(0x78);
            bytes.push(key_id.len().min(255) as u8);
            bytes.extend_from_slice(&key_id[..key_id.len().min(255)]);
            bytes
        },
    };

    if let Ok(request) = KeyRequestData::from_cbor(&bytes) {
        let encoded = request.to_cbor().expect("decoded request re-encodes");
        assert_eq!(KeyRequestData::from_cbor(&encoded).ok(), Some(request));
    }

    if let Ok(response) = KeyResponseData::from_cbor(&bytes) {
        let encoded = response.to_cbor().expect("decoded response re-encodes");
        assert_eq!(KeyResponseData::from_cbor(&encoded).ok(), Some(response));
    }
});
