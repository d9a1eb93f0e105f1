//! Banked, paged RAM/ROM devices for digital-logic simulation.

#![warn(missing_docs)]

pub mod device;
pub mod edit;
pub mod error;
pub mod image;
pub mod mem;
