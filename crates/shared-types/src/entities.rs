//! # Core Chain Entities
//!
//! Transaction and account shapes exchanged between the network receiver,
//! the transaction pool, and the block producer.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// Stable string identifier of a transaction, unique per transaction.
pub type TransactionId = String;

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// Small-integer transaction type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransactionType {
    /// Plain balance transfer.
    Transfer = 0,
    /// Second-signature registration.
    SecondSignature = 1,
    /// Delegate registration.
    DelegateRegistration = 2,
    /// Delegate vote.
    Vote = 3,
    /// Multisignature-group registration.
    MultisigRegistration = 4,
}

/// Asset payload of a multisignature-group registration.
///
/// Present iff the transaction type is
/// [`TransactionType::MultisigRegistration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisignatureAsset {
    /// Minimum number of co-signers required to act for the group.
    pub min: u8,
    /// Hours the registration stays open for signature collection.
    pub lifetime: u32,
    /// Public keys of the group members, hex-encoded with a `+`/`-`
    /// membership prefix.
    pub keysgroup: Vec<String>,
}

/// A transaction as received from the network or a local client.
///
/// The pool treats most fields as opaque; only the identifier, the type tag,
/// the sender/requester keys, the signature list, and the multisignature
/// asset influence routing and expiry.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier.
    pub id: TransactionId,
    /// Type tag deciding which logic handler interprets the asset.
    pub tx_type: TransactionType,
    /// Transferred amount in base units.
    pub amount: u64,
    /// Fee in base units.
    pub fee: u64,
    /// Public key of the originating account.
    pub sender_public_key: PublicKey,
    /// Public key of the group member acting for a multisignature account.
    pub requester_public_key: Option<PublicKey>,
    /// Recipient address, absent for registrations and votes.
    pub recipient_id: Option<String>,
    /// Primary signature.
    #[serde_as(as = "Option<Bytes>")]
    pub signature: Option<Signature>,
    /// Collected co-signatures. Presence of the field marks the payload as
    /// multisignature-bearing even while the list is still empty.
    #[serde_as(as = "Option<Vec<Bytes>>")]
    pub signatures: Option<Vec<Signature>>,
    /// Multisignature-registration asset, present iff
    /// [`TransactionType::MultisigRegistration`].
    pub asset: Option<MultisignatureAsset>,
    /// Set by the receiver when the transaction should be verified in bulk
    /// on the next bundle tick instead of inline.
    #[serde(default)]
    pub bundled: bool,
    /// Set by the signature collector once a multisignature transaction has
    /// gathered enough co-signatures to forge.
    #[serde(default)]
    pub ready: bool,
}

impl Transaction {
    /// True when the payload carries a co-signature list. Presence of the
    /// field counts, even when the list is empty.
    pub fn has_signature_list(&self) -> bool {
        self.signatures.is_some()
    }

    /// Hex rendering of the sender public key, for diagnostics.
    pub fn sender_hex(&self) -> String {
        hex::encode(self.sender_public_key)
    }
}

/// Snapshot of an account as read by the verification pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Chain address derived from the public key.
    pub address: String,
    /// The account's public key.
    pub public_key: PublicKey,
    /// Confirmed balance in base units.
    pub balance: u64,
    /// Second signing key, when registered.
    pub second_public_key: Option<PublicKey>,
    /// Public keys of the account's multisignature group; empty when the
    /// account is not a multisignature account.
    pub multisignatures: Vec<PublicKey>,
    /// Minimum co-signers required by the group.
    pub multimin: u8,
}

impl Account {
    /// True when the account is governed by a multisignature group.
    pub fn is_multisignature(&self) -> bool {
        !self.multisignatures.is_empty()
    }
}
