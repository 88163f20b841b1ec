//! # ql-api
//!
//! The service façade: the two entry points collaborators call, translating
//! external requests into engine calls and engine results into external
//! responses.
//!
//! - [`messaging::handle_message`] — decides the reply for one inbound chat
//!   message. Never fails; engine faults are logged and answered with a
//!   generic fallback reply.
//! - [`register::handle_register_bind`] — the registration/bind API,
//!   mapping each failure kind to a distinct HTTP-style status code.
//!
//! Transport concerns (webhook verification, reply delivery, HTTP serving)
//! stay with the collaborators; nothing here touches the network.

pub mod messaging;
pub mod register;
