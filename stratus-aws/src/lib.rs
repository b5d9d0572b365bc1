//! stratus-aws: AWS resource kinds for the stratus provider engine
//!
//! Implements the operations contract for a first set of AWS resource
//! kinds (S3 buckets, IAM groups) against a narrow cloud-API boundary.
//! The boundary traits in [`client`] are the only place concrete SDK
//! wiring would attach; [`local`] provides an in-process emulator with
//! configurable propagation delay for development and tests.

pub mod client;
pub mod iam;
pub mod local;
pub mod s3;
