//! Quake III `IBSP` levels: loading, PVS-driven face selection and swept
//! collision.

pub mod bsp;
pub mod config;
pub mod renderer;
pub mod sim;
pub mod world;
