// src/utils/mod.rs

pub mod hash;
pub mod http;
pub mod jwt;
pub mod sanitize;
pub mod seed;
