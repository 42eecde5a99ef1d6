//! Headless observers that follow viewer channels.

pub mod info;

pub use info::{ChannelInfo, InfoPanel};
