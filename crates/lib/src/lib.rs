//! SmartNutri core library — config, Telegram channel, agent seam, session
//! dispatch, and the event router used by the CLI.

pub mod agent;
pub mod channels;
pub mod config;
pub mod dispatch;
pub mod llm;
pub mod router;
pub mod session;
pub mod storage;
