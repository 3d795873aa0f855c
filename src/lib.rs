// Library surface for headless/integration tests and reuse.
// The binary only adds argument parsing, logging setup and the terminal loop.
pub mod audio;
pub mod code_table;
pub mod config;
pub mod error;
pub mod game;
pub mod runtime;
pub mod scoring;
pub mod sequencer;
pub mod session;
pub mod signal;
pub mod surface;
pub mod timer;
pub mod ui;
