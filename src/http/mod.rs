//! # Typed HTTP dispatch.
//!
//! An [`App`] binds method + path to handlers typed over a request payload `REQ`
//! and a response payload `RES`. Body decoding, body encoding, status resolution
//! and error translation happen once here so handlers only implement domain logic.
//!
//! ## Per-request flow
//! ```text
//! request ──► REQ::default()
//!               ├─ GET / HEAD / REQ = NoBody → skip decode
//!               └─ otherwise read body → Encoding::decode ──(err)──┐
//!          ──► handler(Request<REQ>)                               │
//!               ├─ Ok(Response<RES>) → write_response(200)         │
//!               └─ Err(e) ────────────────────────────────────────►┤
//!                                                                  ▼
//!                                     error handler? → write_response(body, 500)
//!                                     none           → 500 "An unexpected error occurred."
//!
//! write_response(fallback):
//!   status = body.status_code() ▸ response.status ▸ fallback
//!   status == 204 or body is NoBody or absent → status line only
//!   otherwise Content-Type from Encoding, Encoding::encode(body)
//! ```
//!
//! ## Contents
//! - [`App`] dispatch scope (encoding, error handler, logger, route sub-tree)
//! - [`Request`] / [`Response`] typed wrappers
//! - [`Payload`] capability trait, [`NoBody`] marker
//! - [`Handler`] typed handler contract

mod app;
mod payload;
mod request;
mod response;

pub use app::{App, Handler};
pub use payload::{NoBody, Payload};
pub use request::Request;
pub use response::Response;
