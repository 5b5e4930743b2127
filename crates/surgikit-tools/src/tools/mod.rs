//! Individual tool implementations.
//!
//! One file per workflow tool. Each is a thin adapter over the
//! [`KitResolver`](surgikit_inventory::KitResolver): parse arguments, call
//! the domain function, render text for the model.

pub mod historical_kit;
pub mod identify;
pub mod inventory;
pub mod update_history;
