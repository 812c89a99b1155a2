//! # aura-verifier
//!
//! Client-side verification of Aura presentations: holders scan a QR code
//! that wraps a small signed payload attesting ownership of one or more
//! on-chain Verifiable Credentials and disclosing a chosen subset of their
//! attributes. This crate decides, offline or online, whether such a
//! presentation is authentic, fresh, unrevoked, and satisfies a verifier's
//! policy.
//!
//! The crate is organized as five cooperating components, leaves-first:
//!
//! - [`crypto`] — Ed25519/secp256k1 signature verification, hashing and
//!   canonical JSON, hex/base64 codecs, and (behind `encryption`)
//!   AES-256-GCM and PBKDF2 for the offline cache's at-rest encryption.
//! - [`presentation`] — the `aura://verify?data=<token>` wire codec and
//!   schema/freshness validation.
//! - [`nonce`] — the bounded, time-windowed replay tracker.
//! - [`cache`] — the offline credential/revocation cache and its
//!   registry-backed synchronizer.
//! - [`verifier`] — the orchestrator that drives a presentation through the
//!   full pipeline and the convenience entry points built on top of it.
//!
//! [`registry::RegistryClient`] and [`events::EventSink`] are the two
//! capabilities the core consumes/produces rather than implements; hosts
//! supply both. [`error::Error`] is the single root error type raised by
//! construction and configuration; per-verification failures are instead
//! captured into a [`verifier::VerificationResult`].

#![forbid(unsafe_code)]

pub mod cache;
pub mod crypto;
pub mod error;
pub mod events;
pub mod nonce;
pub mod presentation;
pub mod registry;
pub mod vc;
pub mod verifier;

pub use error::{Error, Result};
pub use events::{Event, EventSink};
pub use presentation::{parse, parse_safe, ParseOptions, Presentation};
pub use registry::RegistryClient;
pub use verifier::{VerificationResult, Verifier, VerifierConfig, VerifierConfigBuilder, VerifyRequest};
