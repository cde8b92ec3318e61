mod bridge;
mod config;
mod helpers;
