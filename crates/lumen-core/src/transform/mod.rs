//! Develop transform — parameter definitions, color helpers, curve LUT and
//! the CPU evaluation of the adjustment chain.

pub mod color;
pub mod evaluate;
pub mod lut;
pub mod params;
