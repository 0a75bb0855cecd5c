//! An abstraction for the `컴시간학생` school timetable service.
//!
//! The service has no API. What it has is a root page holding a single `frame`, and a
//! framed document (EUC-KR) whose inline script carries everything else:
//!
//! - the address prefix for school searches (`school_ra`),
//! - the constants a timetable data request is built from (`sc_data`),
//! - and a renderer turning the compact data blob into an HTML table per class.
//!
//! All of these change per deployment. [`Client::init()`] reads them once into a
//! [`Session`]; the session then searches schools and fetches timetables, running
//! the upstream's own renderer in a sandboxed JavaScript engine.

pub mod api;
pub mod client;
pub mod errors;

mod discovery;
mod markers;
mod school;
mod script;
mod session;
mod table;
mod timetable;

pub use client::{Client, ClientBuilder};
pub use discovery::{Discovery, ProtocolConstants};
pub use school::SchoolRecord;
pub use session::{Options, Session};
pub use timetable::{ClassTimeInfo, PeriodEntry, Timetable, Week};
