// Converts legacy model assets (mesh + undocumented `.bin` descriptor +
// painted textures) into a normalized VMDL/VMAT asset set.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod geometry;
pub mod kv3;
pub mod locator;
pub mod pipeline;
pub mod texture_pipeline;
