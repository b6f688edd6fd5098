//! SpriteFrame CLI library.
//!
//! Configuration loading and the command implementations behind the
//! `spriteframe` binary.

pub mod commands;
pub mod input;
