//! # teonet-bintray
//!
//! Release publisher for Teonet build artifacts.
//!
//! This crate provides:
//! - Package filename classification (Debian family, RPM family, archives)
//! - Version series rules (release vs. testing paths and components)
//! - A Bintray REST client with Basic authentication
//! - Batch publishing of an artifact directory
//! - Retention of the newest N files per package group

pub mod api;
pub mod classify;
pub mod config;
pub mod error;
pub mod publish;
pub mod report;
pub mod retention;
pub mod version;

pub use api::{BintrayClient, RemoteFile, UploadStatus, VersionStatus};
pub use classify::{classify, Artifact, Classification, Family, RepoKind};
pub use config::{BintrayConfig, ConfigError};
pub use error::{ClassificationError, PublishError};
pub use publish::{collect_artifacts, plan_uploads, PlannedUpload, PublishSummary, Publisher, UploadPlan};
pub use retention::{RetentionKey, RetentionPlan};
pub use version::{Series, VersionInfo};
