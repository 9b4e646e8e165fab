//! API Server Module
//!
//! This module exposes the tracker's operations over HTTP.
//! Identity arrives pre-resolved in request headers; the handlers translate
//! core errors into status codes and nothing more.

mod server;
pub use server::Server;
