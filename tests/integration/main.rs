//! End-to-end tests through the public library API.

mod scripted_source;
mod simulation;
