//! Texture vocabulary handed to MTEX: orientations, ideal components and
//! fibres.  All orientation math happens inside MTEX.

pub mod components;
pub mod fibre;
pub mod orientation;
