//! 命令定义和实现

pub mod config;
pub mod cyclic;
pub mod debug_streaming;
pub mod glove;
pub mod kapandji;
pub mod ping;
pub mod test_hand;
pub mod udcap;

pub use config::ConfigCommand;
pub use cyclic::CyclicCommand;
pub use debug_streaming::DebugStreamingCommand;
pub use glove::GloveCommand;
pub use kapandji::KapandjiCommand;
pub use ping::PingCommand;
pub use test_hand::TestHandCommand;
pub use udcap::UdcapCommand;
