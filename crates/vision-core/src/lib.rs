//! Coordination core of the realtime vision console.
//!
//! Owns one realtime session at a time: the controller negotiates the
//! transport through the port traits, the dispatcher funnels every outbound
//! message (queueing until the channel opens), and the reducer folds inbound
//! traffic into the event log, answering function calls and caption updates.

pub mod ports;
pub mod notice_bus;
pub mod queue;
pub mod event_log;
pub mod session;
pub mod dispatcher;
pub mod functions;
pub mod context;
pub mod reducer;
pub mod captions;
pub mod controller;
