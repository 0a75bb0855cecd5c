//! Supported timetable platforms.

pub mod comcigan;
