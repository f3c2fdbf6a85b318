//! Postbox Protocol Module
//!
//! Wire-level definitions shared by inbox writers and readers:
//! - Identifiers, network addresses and owner addresses
//! - Slot identifier derivation
//! - Single-owner chunk addressing and signatures
//! - The JSON record stored in each inbox slot

pub mod error;
pub mod identifier;
pub mod record;
pub mod soc;
pub mod types;

pub use error::{ProtocolError, Result};
pub use identifier::indexed_identifier;
pub use record::{EncryptedRecord, SenderMeta, RECORD_VERSION};
pub use soc::{soc_address, SingleOwnerChunk, MAX_PAYLOAD_SIZE};
pub use types::{proximity, EthAddress, Identifier, Overlay, SwarmAddress, MAX_PO};
