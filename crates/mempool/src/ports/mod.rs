//! Ports layer of the transaction pool.
//!
//! Hexagonal port traits:
//! - Inbound (driving): the ingress and block-producer surfaces
//! - Outbound (driven): accounts, transaction logic, the unconfirmed
//!   ledger, chain sync status, and time

pub mod inbound;
pub mod outbound;
