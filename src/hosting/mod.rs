//! HTTP/WebSocket gateway and the room registry.
//!
//! - [`Server`] — actix-web app: room creation, health, WebSocket entry
//! - [`Saloon`] — registry of live rooms and their lifecycles
//! - [`RoomHandle`] — channel endpoint into one room's serialization point

mod handle;
mod saloon;
mod server;

pub use handle::*;
pub use saloon::*;
pub use server::*;
