//! # voltage_iec104_server
//!
//! IEC 60870-5-104 outstation (server) implementation for Rust.
//!
//! This crate implements the field-device side of the IEC 60870-5-104
//! telecontrol protocol: the framed, sequenced, timer-driven link an
//! outstation maintains with one or more controlling stations, plus the
//! typed ASDU model carried over it. Station-specific behavior (what an
//! interrogation returns, whether a command executes) stays in the
//! application, plugged in through a handler trait.
//!
//! ## Features
//!
//! - **Full link layer**: I/S/U frames, STARTDT/STOPDT lifecycle,
//!   T1/T2/T3 timers, k/w sliding window, sequence wraparound
//! - **Typed ASDUs**: one sum-type variant per supported type
//!   identification, exact encode/decode round trips
//! - **Redundancy groups**: one shared event queue, or one private queue
//!   per connection
//! - **Transport-agnostic**: attach any authenticated duplex byte stream
//!   (plain TCP or TLS-wrapped), or use the built-in accept loop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use voltage_iec104_server::{
//!     Asdu, AsduHeader, Cot, InformationObject, MeasuredQuality, Outstation,
//!     OutstationHandler, Replies, ServerConfig, TypeId,
//! };
//!
//! struct Station;
//!
//! impl OutstationHandler for Station {
//!     fn interrogation(
//!         &self,
//!         _peer: std::net::SocketAddr,
//!         qoi: u8,
//!         replies: &mut Replies,
//!     ) -> bool {
//!         if qoi != 20 {
//!             return false;
//!         }
//!         let mut asdu = Asdu::new(AsduHeader::new(
//!             TypeId::MeasuredScaled,
//!             Cot::InterrogatedByStation,
//!             1,
//!         ));
//!         asdu.add_object(InformationObject::measured_scaled(
//!             100,
//!             23,
//!             MeasuredQuality::new(),
//!         ));
//!         replies.push(asdu);
//!         true
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> voltage_iec104_server::Result<()> {
//!     let server = Outstation::new(ServerConfig::new(), Station);
//!
//!     // spontaneous telemetry from anywhere in the application
//!     let producer = server.clone();
//!     tokio::spawn(async move {
//!         loop {
//!             tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//!             let mut asdu = Asdu::new(AsduHeader::new(
//!                 TypeId::MeasuredScaled,
//!                 Cot::Periodic,
//!                 1,
//!             ));
//!             asdu.add_object(InformationObject::measured_scaled(
//!                 110,
//!                 42,
//!                 MeasuredQuality::new(),
//!             ));
//!             let _ = producer.enqueue(asdu);
//!         }
//!     });
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:2404").await?;
//!     server.serve(listener).await
//! }
//! ```
//!
//! ## Protocol Overview
//!
//! IEC 60870-5-104 runs over TCP/IP (default port 2404) with three frame
//! types:
//!
//! - **I-frame**: numbered information transfer (contains an ASDU)
//! - **S-frame**: supervisory acknowledgment
//! - **U-frame**: unnumbered control (STARTDT, STOPDT, TESTFR)
//!
//! ### APDU Structure
//!
//! ```text
//! APCI (6 bytes):
//! +--------+--------+--------+--------+--------+--------+
//! | 0x68   | Length | Control Field (4 bytes)           |
//! +--------+--------+--------+--------+--------+--------+
//! ```
//!
//! A connection starts in the stopped state; only after the controlling
//! station's STARTDT act/con exchange may I-frames flow. At most `k`
//! sent I-frames may be unacknowledged, received I-frames are
//! acknowledged at the latest every `w` frames or after `t2`, and an
//! idle link is probed with TESTFR after `t3`.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod codec;
pub mod connection;
pub mod error;
pub mod handler;
pub mod queue;
pub mod server;
pub mod types;

// Re-export main types
pub use codec::{Apdu, Iec104Codec};
pub use connection::{
    ConnectionConfig, LinkState, StopBehavior, DEFAULT_K, DEFAULT_T1_TIMEOUT, DEFAULT_T2_TIMEOUT,
    DEFAULT_T3_TIMEOUT, DEFAULT_W,
};
pub use error::{Iec104Error, Result};
pub use handler::{OutstationHandler, Replies};
pub use queue::{AsduQueue, OverflowPolicy};
pub use server::{
    ConnectionId, Outstation, ServerConfig, ServerMode, DEFAULT_PORT, DEFAULT_QUEUE_CAPACITY,
};
pub use types::*;
