//! # voxhome-domain
//!
//! Pure domain model for the voxhome voice-controlled home system.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Device records** (what discovery learned about a device and how to reach it)
//! - Define **Commands** and the protocol **Primitives** they translate to
//! - Define **Scenes** (named, ordered lists of device actions) and the scene catalog
//! - Define **Intents** (the structured meaning of one user utterance)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod command;
pub mod device;
pub mod intent;
pub mod scene;
