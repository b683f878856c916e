//! Message text handling: legacy color codes and structured components.

pub mod color;
pub mod component;

pub use component::{Component, Node};
