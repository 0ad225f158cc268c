//! Fuzz target for responder offer handling
//!
//! Feeds arbitrary offer lists to a responder backed by a pre-shared key and
//! an X25519 parameter set.
//!
//! # Invariants
//!
//! - The responder never panics, whatever the offers contain
//! - A response always answers an offer of the most preferred scheme present
//! - A response echoes the answered request's nonce
//! - An identical offer list is never answered twice

#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use wardline_core::{
    KeyExchangeContext, KeyExchangeError, KeyExchangeResponder, KeyExchangeScheme, KeyRequestData,
    keyx::{DhGroup, MemoryKeyStore, Mechanism, PresharedKey},
};
use wardline_harness::SimEnv;

#[derive(Debug, Clone, Arbitrary)]
enum Offer {
    DiffieHellman { known_params: bool, public_value: Vec<u8> },
    AsymmetricWrapped { public_key: Vec<u8>, nonce: Vec<u8> },
    SymmetricWrapped { known_key: bool, nonce: Vec<u8> },
}

impl Offer {
    fn into_request(self) -> KeyRequestData {
        match self {
            Self::DiffieHellman { known_params, public_value } => KeyRequestData::DiffieHellman {
                parameters_id: if known_params { "1" } else { "2" }.to_string(),
                public_value,
            },
            Self::AsymmetricWrapped { public_key, nonce } => KeyRequestData::AsymmetricWrapped {
                key_pair_id: "rsaKeypairId".to_string(),
                mechanism: Mechanism::Rsa,
                public_key,
                nonce,
            },
            Self::SymmetricWrapped { known_key, nonce } => KeyRequestData::SymmetricWrapped {
                key_id: if known_key { "PSK" } else { "OTHER" }.to_string(),
                nonce,
            },
        }
    }
}

#[derive(Debug, Arbitrary)]
struct Input {
    seed: u64,
    dh_first: bool,
    offers: Vec<Offer>,
}

fuzz_target!(|input: Input| {
    let env = SimEnv::with_seed(input.seed);
    let Ok(psk) = PresharedKey::generate(&env) else {
        return;
    };
    let store = MemoryKeyStore::new().with_preshared_key("PSK", psk).with_dh_parameters("1", DhGroup::X25519);
    let ctx = KeyExchangeContext::new(env, Arc::new(store));

    let preference = if input.dh_first {
        vec![KeyExchangeScheme::DiffieHellman, KeyExchangeScheme::SymmetricWrapped]
    } else {
        vec![KeyExchangeScheme::SymmetricWrapped, KeyExchangeScheme::DiffieHellman]
    };
    let mut responder = KeyExchangeResponder::new(ctx, preference.clone());

    let offers: Vec<_> = input.offers.into_iter().map(Offer::into_request).collect();
    let runtime = tokio::runtime::Builder::new_current_thread().build().expect("runtime");

    let first = runtime.block_on(responder.respond(&offers));
    if let Ok(Some(response)) = &first {
        let expected = preference
            .iter()
            .find(|scheme| offers.iter().any(|offer| offer.scheme() == **scheme))
            .expect("a scheme was answered");
        assert_eq!(response.data.scheme(), *expected);
        let answered = offers.iter().find(|offer| offer.scheme() == *expected).expect("answered offer");
        assert_eq!(response.data.nonce(), answered.nonce());

        let second = runtime.block_on(responder.respond(&offers));
        assert!(matches!(second, Err(KeyExchangeError::Replayed { .. })));
    }
});
