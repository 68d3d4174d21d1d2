pub mod app;
pub mod audio;
pub mod config;
pub mod render;
pub mod sampler;
pub mod state;
pub mod surface;
pub mod terminal;
pub mod visual;
