// Library root
// -----------
// This crate exposes a small library surface for the CLI binary.
//
// Module responsibilities:
// - `api`: Encapsulates HTTP interactions with the Chirp backend (auth,
//   users, posts, notifications) over a blocking reqwest client.
// - `cli`: The clap command tree, interactive prompting for omitted flag
//   values, and rendering of server replies as human-readable text.
// - `token`: File-backed persistence of the session token between
//   invocations.
//
// Keeping this separation makes the request/reply logic testable without
// going through argument parsing.
pub mod api;
pub mod cli;
pub mod token;
