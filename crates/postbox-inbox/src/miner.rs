//! Inbox key derivation and neighborhood mining
//!
//! The inbox signing key is a pure function of the public coordinates
//! `(target_overlay, base_identifier, proximity)`. Mining is the one-time
//! search the recipient performs for a base identifier whose slot 0 lands
//! within `proximity` bits of the target overlay; afterwards any party can
//! recompute the same key without searching.

use crate::error::{InboxError, Result};
use crate::params::{validate_proximity, InboxParams};
use postbox_crypto::{keccak256_concat, KeyPair, PublicKey, SecretKey};
use postbox_protocol::{
    indexed_identifier, soc_address, EthAddress, Identifier, Overlay, SingleOwnerChunk,
    SwarmAddress,
};
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

const KEY_DOMAIN: &[u8] = b"postbox/inbox-key/v1";

/// Default bound on mining trials
pub const DEFAULT_MAX_TRIALS: u64 = 4_000_000;

/// Signing key shared by every writer of one inbox
#[derive(Debug, Clone)]
pub struct InboxKey {
    keypair: KeyPair,
    owner: EthAddress,
}

impl InboxKey {
    fn new(keypair: KeyPair) -> Self {
        let owner = EthAddress::from_public_key(keypair.public_key());
        InboxKey { keypair, owner }
    }

    /// Owner address all slots are published under
    pub fn owner(&self) -> &EthAddress {
        &self.owner
    }

    pub fn secret_key(&self) -> &SecretKey {
        self.keypair.secret_key()
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        self.keypair.secret_bytes()
    }

    /// Network address of slot `index`
    pub fn slot_address(&self, base: &Identifier, index: u64) -> SwarmAddress {
        soc_address(&indexed_identifier(base, index), &self.owner)
    }

    /// Sign a record payload for slot `index`
    pub fn sign_slot(
        &self,
        base: &Identifier,
        index: u64,
        payload: Vec<u8>,
    ) -> Result<SingleOwnerChunk> {
        let identifier = indexed_identifier(base, index);
        Ok(SingleOwnerChunk::sign(self.secret_key(), identifier, payload)?)
    }
}

/// Re-derive the inbox key from published parameters
///
/// Pure: the same parameters always give the same key. The recipient public
/// key does not take part.
pub fn derive_inbox_key(params: &InboxParams) -> Result<InboxKey> {
    params.validate()?;
    derive_from_parts(
        &params.target_overlay,
        &params.base_identifier,
        params.proximity,
    )
}

fn derive_from_parts(overlay: &Overlay, base: &Identifier, proximity: u8) -> Result<InboxKey> {
    // A counter byte is appended so the rare hash outside the curve order
    // still yields a key.
    for counter in 0..=u8::MAX {
        let candidate = keccak256_concat(&[
            KEY_DOMAIN,
            overlay.as_bytes(),
            base.as_bytes(),
            &[proximity],
            &[counter],
        ]);
        if let Ok(keypair) = KeyPair::from_secret_bytes(&candidate) {
            return Ok(InboxKey::new(keypair));
        }
    }

    Err(InboxError::InvalidParams(
        "parameters do not yield a valid key".to_string(),
    ))
}

/// Result of a successful mining run
#[derive(Debug, Clone)]
pub struct MinedInbox {
    pub key: InboxKey,
    pub params: InboxParams,
    /// Number of candidates tested
    pub trials: u64,
}

/// Searches for inbox parameters that land in a target neighborhood
#[derive(Debug, Clone)]
pub struct NeighborhoodMiner {
    max_trials: u64,
    cancel: Option<Arc<AtomicBool>>,
}

impl NeighborhoodMiner {
    pub fn new(max_trials: u64) -> Self {
        NeighborhoodMiner {
            max_trials,
            cancel: None,
        }
    }

    /// Stop between trials once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn max_trials(&self) -> u64 {
        self.max_trials
    }

    /// Mine with fresh random base identifiers
    pub fn mine(
        &self,
        target: Overlay,
        proximity: u8,
        recipient: Option<PublicKey>,
    ) -> Result<MinedInbox> {
        self.mine_with_rng(target, proximity, recipient, &mut OsRng)
    }

    /// Mine drawing candidates from `rng`
    pub fn mine_with_rng<R: RngCore>(
        &self,
        target: Overlay,
        proximity: u8,
        recipient: Option<PublicKey>,
        rng: &mut R,
    ) -> Result<MinedInbox> {
        validate_proximity(proximity)?;
        debug!(%target, proximity, max_trials = self.max_trials, "mining inbox key");

        for trial in 1..=self.max_trials {
            if self.is_cancelled() {
                return Err(InboxError::Cancelled);
            }

            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            let base = Identifier::from_bytes(bytes);

            let key = derive_from_parts(&target, &base, proximity)?;
            if key.slot_address(&base, 0).proximity(&target) >= proximity {
                info!(trials = trial, proximity, owner = %key.owner(), "mined inbox key");
                return Ok(MinedInbox {
                    key,
                    params: InboxParams {
                        target_overlay: target,
                        base_identifier: base,
                        proximity,
                        recipient_public_key: recipient,
                    },
                    trials: trial,
                });
            }
        }

        Err(InboxError::MiningExhausted {
            trials: self.max_trials,
            proximity,
        })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

impl Default for NeighborhoodMiner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRIALS)
    }
}
