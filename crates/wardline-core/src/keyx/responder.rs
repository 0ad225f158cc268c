//! Responder-side offer selection.

use std::collections::{HashSet, VecDeque};

use sha2::{Digest, Sha256};
use wardline_crypto::Environment;

use super::{
    KeyExchange, KeyExchangeContext, KeyExchangeError, KeyExchangeResponse, KeyExchangeScheme,
    KeyRequestData,
};
use crate::config::{DEFAULT_REPLAY_WINDOW, KeyExchangeConfig};

/// Answers at most one key request offer per message.
///
/// The answered offer is the first offer, in message order, of the most
/// preferred scheme present. The preference order is deployment
/// configuration, never negotiated in-band; all other offers are dropped.
///
/// Each request is answered at most once per responder. A request is
/// recognized by its scheme, identifier and freshness bytes (nonce or
/// ephemeral public value), so a new request for the same key is answered
/// while a replayed one fails with [`KeyExchangeError::Replayed`]. The
/// responder remembers the most recent `replay_window` answered requests;
/// older ones are forgotten first.
pub struct KeyExchangeResponder<E: Environment> {
    ctx: KeyExchangeContext<E>,
    preference: Vec<KeyExchangeScheme>,
    replay_window: usize,
    answered: HashSet<[u8; 32]>,
    answered_order: VecDeque<[u8; 32]>,
}

impl<E: Environment> KeyExchangeResponder<E> {
    /// Create a responder accepting `preference` schemes, most preferred
    /// first.
    pub fn new(ctx: KeyExchangeContext<E>, preference: Vec<KeyExchangeScheme>) -> Self {
        Self {
            ctx,
            preference,
            replay_window: DEFAULT_REPLAY_WINDOW,
            answered: HashSet::new(),
            answered_order: VecDeque::new(),
        }
    }

    /// Create a responder with the preference order and replay window of
    /// `config`.
    pub fn from_config(ctx: KeyExchangeContext<E>, config: &KeyExchangeConfig) -> Self {
        Self::new(ctx, config.preference.clone()).with_replay_window(config.replay_window)
    }

    /// Remember at most `replay_window` answered requests (at least one).
    #[must_use]
    pub fn with_replay_window(mut self, replay_window: usize) -> Self {
        self.replay_window = replay_window.max(1);
        self.forget_oldest();
        self
    }

    /// Number of answered requests currently remembered.
    pub fn remembered(&self) -> usize {
        self.answered.len()
    }

    /// Scheme preference order.
    pub fn preference(&self) -> &[KeyExchangeScheme] {
        &self.preference
    }

    /// The offer this responder would answer.
    ///
    /// Returns `Ok(None)` if there are no offers.
    pub fn select<'a>(
        &self,
        offers: &'a [KeyRequestData],
    ) -> Result<Option<&'a KeyRequestData>, KeyExchangeError> {
        if offers.is_empty() {
            return Ok(None);
        }

        self.preference
            .iter()
            .find_map(|scheme| offers.iter().find(|offer| offer.scheme() == *scheme))
            .map(Some)
            .ok_or_else(|| KeyExchangeError::NoSupportedScheme {
                offered: offers.iter().map(KeyRequestData::scheme).collect(),
            })
    }

    /// Answer the preferred offer.
    ///
    /// # Errors
    ///
    /// - `KeyExchangeError::NoSupportedScheme` if no offer uses an accepted
    ///   scheme
    /// - `KeyExchangeError::Replayed` if the selected offer was answered
    ///   before
    /// - Any error from answering the selected offer; other offers are not
    ///   tried
    pub async fn respond(
        &mut self,
        offers: &[KeyRequestData],
    ) -> Result<Option<KeyExchangeResponse<E>>, KeyExchangeError> {
        let Some(selected) = self.select(offers)? else {
            return Ok(None);
        };

        let fingerprint = fingerprint(selected);
        if self.answered.contains(&fingerprint) {
            tracing::warn!(
                scheme = %selected.scheme(),
                identifier = selected.identifier(),
                "rejecting replayed key request"
            );
            return Err(KeyExchangeError::Replayed {
                scheme: selected.scheme(),
                identifier: selected.identifier().to_string(),
            });
        }

        let response = KeyExchange::respond_to_request(&self.ctx, selected).await.inspect_err(|e| {
            tracing::warn!(
                scheme = %selected.scheme(),
                identifier = selected.identifier(),
                error = %e,
                "key request rejected"
            );
        })?;

        self.remember(fingerprint);

        tracing::info!(
            scheme = %selected.scheme(),
            identifier = selected.identifier(),
            dropped = offers.len() - 1,
            "answered key request"
        );

        Ok(Some(response))
    }
}

impl<E: Environment> KeyExchangeResponder<E> {
    fn remember(&mut self, fingerprint: [u8; 32]) {
        if self.answered.insert(fingerprint) {
            self.answered_order.push_back(fingerprint);
        }
        self.forget_oldest();
    }

    fn forget_oldest(&mut self) {
        while self.answered_order.len() > self.replay_window {
            if let Some(oldest) = self.answered_order.pop_front() {
                self.answered.remove(&oldest);
            }
        }
    }
}

/// `SHA-256(scheme || 0x00 || identifier || 0x00 || freshness)`
fn fingerprint(request: &KeyRequestData) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(request.scheme().name().as_bytes());
    hasher.update([0]);
    hasher.update(request.identifier().as_bytes());
    hasher.update([0]);
    hasher.update(request.freshness());
    hasher.finalize().into()
}

impl<E: Environment> std::fmt::Debug for KeyExchangeResponder<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyExchangeResponder")
            .field("preference", &self.preference)
            .field("replay_window", &self.replay_window)
            .field("answered", &self.answered.len())
            .finish_non_exhaustive()
    }
}
