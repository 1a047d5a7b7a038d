//! Type State Pattern 状态机
//!
//! ```text
//! Hand<Standby> ──enable_streaming──▶ Hand<Streaming> ──park──▶ Hand<Standby>
//! ```

pub mod machine;

pub use machine::{Hand, Standby, Streaming, StreamingOutcome};
