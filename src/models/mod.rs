//! Kayako resources.
//!
//! Every resource implements [`Resource`](crate::entity::Resource) and is
//! handled through [`Entity`](crate::entity::Entity). Ticket counts and
//! custom field groups are read-only helpers with their own parsers.

mod comment;
mod common;
mod custom_field;
mod department;
mod knowledgebase;
mod post;
mod staff;
mod statistics;
mod ticket;
mod ticket_lookup;
mod ticket_note;
mod time_track;
mod troubleshooter;
mod user;

pub use comment::*;
pub use common::*;
pub use custom_field::*;
pub use department::*;
pub use knowledgebase::*;
pub use post::*;
pub use staff::*;
pub use statistics::*;
pub use ticket::*;
pub use ticket_lookup::*;
pub use ticket_note::*;
pub use time_track::*;
pub use troubleshooter::*;
pub use user::*;
