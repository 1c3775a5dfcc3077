#![warn(clippy::pedantic)]
#![warn(clippy::style)]
#![warn(clippy::nursery)]
// Just let me cast in peace
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]

pub mod agent;
pub mod config;
pub mod env;
pub mod trainer;

