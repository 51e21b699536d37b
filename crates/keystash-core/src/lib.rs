//! keystash core library
//!
//! A typed accessor over a synchronous, string-keyed, string-valued storage
//! medium. Values of any serde type are stored as bare JSON text under
//! caller-chosen keys.
//!
//! # Architecture
//!
//! - **Storage**: the medium contract (`get_item`/`set_item`) plus memory and
//!   file-backed media
//! - **Codec**: value ⇄ persisted text, the only place a read can fail
//! - **Accessor**: has/get/get_or/set/append_to_array/modify; reads fall
//!   back to defaults, writes return errors
//!
//! # Quick Start
//!
//! ```text
//! let ls = Accessor::builder(FileStorage::from_config(&config)?)
//!     .on_decode_failure(|f| eprintln!("bad entry {}: {}", f.key, f.error))
//!     .build();
//!
//! ls.set("count", 1)?;
//! ls.modify("count", 0, |n: i64| n + 1)?;
//! let tags: Vec<String> = ls.append_to_array("tags", vec!["rust".into()])?;
//! ```
//!
//! # Modules
//!
//! - `accessor`: the typed facade (main entry point)
//! - `codec`: encoding and decoding of persisted text
//! - `reporter`: optional decode-failure callback
//! - `schema`: compile-time key/type declarations
//! - `binding`: cached, observable handle over one key
//! - `storage`: medium trait and implementations
//! - `config`: application configuration

pub mod accessor;
pub mod binding;
pub mod codec;
pub mod config;
pub mod error;
pub mod reporter;
pub mod schema;
pub mod storage;

pub use accessor::{Accessor, AccessorBuilder};
pub use binding::Binding;
pub use codec::{Codec, DecodeError, EncodeError, JsonCodec};
pub use config::Config;
pub use error::{AccessError, AccessResult};
pub use reporter::{DecodeFailure, FailureReporter};
pub use schema::SchemaKey;
pub use storage::{FileStorage, MemoryStorage, StorageError, StorageInstance, StorageResult};
