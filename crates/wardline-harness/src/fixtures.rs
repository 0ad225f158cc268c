//! Ready-made key exchange contexts.

use std::sync::Arc;

use wardline_core::{
    KeyExchangeContext,
    config::{DEFAULT_DH_PARAMETERS_ID, DEFAULT_KEY_PAIR_ID, DEFAULT_PSK_ID},
    keyx::{DhGroup, MemoryKeyStore, PresharedKey},
};
use wardline_crypto::{AsymmetricKeyPair, CryptoError};

use crate::SimEnv;

/// RSA modulus for test key pairs. Production uses
/// [`AsymmetricKeyPair::DEFAULT_BITS`].
pub const TEST_RSA_BITS: usize = 1024;

/// Key store holding the default credentials: the pre-shared key, the RSA
/// key pair and the X25519 parameter set, under their default IDs.
pub fn default_key_store(env: &SimEnv) -> Result<MemoryKeyStore, CryptoError> {
    Ok(MemoryKeyStore::new()
        .with_preshared_key(DEFAULT_PSK_ID, PresharedKey::generate(env)?)
        .with_key_pair(DEFAULT_KEY_PAIR_ID, AsymmetricKeyPair::generate(env, TEST_RSA_BITS)?)
        .with_dh_parameters(DEFAULT_DH_PARAMETERS_ID, DhGroup::X25519))
}

/// Key exchange context over [`default_key_store`].
pub fn key_exchange_context(env: SimEnv) -> Result<KeyExchangeContext<SimEnv>, CryptoError> {
    let store = default_key_store(&env)?;
    Ok(KeyExchangeContext::new(env, Arc::new(store)))
}

/// Initiator and responder contexts sharing one key store, each with its own
/// random stream.
pub fn peers(seed: u64) -> Result<(KeyExchangeContext<SimEnv>, KeyExchangeContext<SimEnv>), CryptoError> {
    let store = Arc::new(default_key_store(&SimEnv::with_seed(seed))?);
    Ok((
        KeyExchangeContext::new(SimEnv::with_seed(seed.wrapping_add(1)), store.clone()),
        KeyExchangeContext::new(SimEnv::with_seed(seed.wrapping_add(2)), store),
    ))
}
