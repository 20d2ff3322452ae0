//! Service construction.

mod builder;

pub use builder::{Logica, LogicaBuilder};
