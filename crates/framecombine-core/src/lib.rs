pub mod combine;
pub mod config;
pub mod consts;
pub mod error;
pub mod io;
pub mod normalize;
pub mod stack;
