//! # Shared Types
//!
//! Chain-wide entity definitions shared by the node's subsystems.
//!
//! ## Clusters
//!
//! - **Transactions**: [`Transaction`], [`TransactionType`],
//!   [`MultisignatureAsset`]
//! - **Accounts**: [`Account`]
//! - **Primitives**: [`TransactionId`], [`PublicKey`], [`Signature`]
//!
//! These types are storage- and transport-agnostic: the transaction pool
//! holds them verbatim, while interpretation of amounts, fees, and assets
//! belongs to the transaction-logic layer.

pub mod entities;

pub use entities::{
    Account, MultisignatureAsset, PublicKey, Signature, Transaction, TransactionId,
    TransactionType,
};
