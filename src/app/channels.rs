//! Console → control loop command hand-off.
//!
//! A bounded `embassy-sync` channel shared as a static, so the console
//! thread and the control loop need no allocation or ownership plumbing.
//!
//! ```text
//! ┌──────────────┐  PhCommand  ┌──────────────┐
//! │   Console    │────────────▶│ Control Loop │
//! │  (thread)    │             │   (main)     │
//! └──────────────┘             └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use super::commands::PhCommand;

/// Commands that can wait for the next loop pass.
pub const CMD_DEPTH: usize = 8;

pub type CommandChannel = Channel<CriticalSectionRawMutex, PhCommand, CMD_DEPTH>;

/// Inbound command channel: console thread → control loop.
pub static CMD_CHANNEL: CommandChannel = Channel::new();
