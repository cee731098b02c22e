//! Configuration Module
//!
//! Typed settings for the engine, loaded from environment variables.

mod settings;

pub use settings::{
    ChannelSettings, ComputeSettings, ConfigError, EngineConfig, FeedSettings, ServerSettings,
};
