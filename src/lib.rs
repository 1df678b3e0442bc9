//! # OTP-verified account signup, for PC.
//!
//! This crate implements the client side of a three-step account registration:
//! - capture identity details (full name, mobile, email) and ask the account service
//!   to send a one-time passcode to the email
//! - have the service verify the passcode the user typed in
//! - create the account with a password
//!
//! Each step may only run once its predecessor has succeeded, and the remote service,
//! never the client, decides whether a passcode is valid.
//!
//! The [`registration::RegistrationFlow`] controller owns the flow. It talks to the remote side
//! exclusively through the [`service::AccountService`] capability, and reports the outcome of
//! every action as a [`notice::StatusNotice`] on an event stream. Both seams exist so the
//! controller carries no transport or display concerns:
//! - [`platform`] provides the real implementations for a PC: an HTTP client for the
//!   account service, and a notice printer for the terminal
//! - tests substitute a fake service and simply drain the notice stream
//!
//! Outside of the controller's domain is the "runner" ([`cli`], [`prompt`] and the binary),
//! which parses arguments, prompts the user and wires the components together.

/// Application-level errors (CLI, I/O, setup) are untyped and use `anyhow`.
/// Errors the controller or its collaborators need to reason about are `thiserror` enums.
pub use anyhow::Result;

pub mod cli;
pub mod notice;
pub mod platform;
pub mod prompt;
pub mod registration;
pub mod service;
