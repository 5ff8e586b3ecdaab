// src/utils/mod.rs

pub mod extract;
pub mod jwt;
pub mod token;
