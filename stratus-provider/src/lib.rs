//! stratus-provider: resource provider lifecycle and convergence engine
//!
//! The runtime core of the stratus orchestrator. A desired-state payload
//! arrives over the RPC surface, is unmarshaled into a typed resource
//! object plus a generic property map, and is driven through the
//! Check / Create / Get / InspectChange / Update / Delete lifecycle by a
//! generic [`adapter::ResourceProvider`] that delegates all cloud-API
//! calls to a per-kind [`ops::ResourceOps`] implementation.

pub mod adapter;
pub mod diff;
pub mod error;
pub mod ident;
pub mod ops;
pub mod property;
pub mod retry;
pub mod rpc;
