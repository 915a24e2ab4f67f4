//! Common utilities and shared types for sitecraft.
//!
//! This crate provides foundational components used across all sitecraft crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based identifiers and order codes via [`IdGenerator`]
//! - **Archives**: Zip packing and safe unpacking of website bundles
//! - **Artifacts**: Per-order bundle storage via [`ArtifactStore`]
//! - **Storage**: Catalog asset backends (local filesystem)
//!
//! # Example
//!
//! ```no_run
//! use sitecraft_common::{AppResult, Config, IdGenerator, OrderCodePrefix};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let code = id_gen.generate_order_code(OrderCodePrefix::Custom);
//!     println!("{} listening on port {}", code, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod artifact;
pub mod config;
pub mod error;
pub mod id;
pub mod storage;

pub use archive::BundleFile;
pub use artifact::{ArtifactStore, LocalArtifactStore};
pub use config::{
    AdminBootstrapConfig, Config, DatabaseConfig, QuestionnaireConfig, ServerConfig,
    StorageConfig,
};
pub use error::{AppError, AppResult};
pub use id::{IdGenerator, OrderCodePrefix};
pub use storage::{LocalStorage, StorageBackend, UploadedFile, generate_storage_key};
