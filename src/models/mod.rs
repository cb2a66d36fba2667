// src/models/mod.rs

pub mod activity;
pub mod admin;
pub mod assessment;
pub mod certification;
pub mod lesson;
pub mod level;
pub mod ranking;
pub mod session;
pub mod user;
