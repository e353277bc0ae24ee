//! Coordinate files.

mod gro;

pub use gro::{BoxVectors, GroAtom, GroFile, GroLineError, parse_gro, read_gro};
