#![no_std]

pub mod hardware;
pub mod network;
pub mod sntp;
pub mod storage;
