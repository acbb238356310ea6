//! Domain layer: negotiation records, payment validation and ratio building,
//! plus the storage ports the application layer depends on.

pub mod item;
pub mod money;
pub mod party;
pub mod ports;
pub mod proposal;
pub mod ratios;
pub mod validation;
