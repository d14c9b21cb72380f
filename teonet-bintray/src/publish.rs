//! Single-file upload, batch publish and prune.

use crate::api::{BintrayClient, RemoteFile, UploadStatus, VersionStatus};
use crate::classify::{classify, Classification, RepoKind};
use crate::config::BintrayConfig;
use crate::error::{ClassificationError, PublishError};
use crate::report;
use crate::retention::{self, RetentionPlan};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A package artifact ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpload {
    pub local: PathBuf,
    pub repo: String,
    pub version: String,
    /// API path including matrix parameters and the publish flag.
    pub remote_path: String,
}

/// Classification of an artifact directory.
#[derive(Debug, Default)]
pub struct UploadPlan {
    pub uploads: Vec<PlannedUpload>,
    pub archives: Vec<PathBuf>,
    pub rejected: Vec<(PathBuf, ClassificationError)>,
}

/// What a batch publish did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishSummary {
    /// `(repo, version)` pairs in creation order.
    pub versions: Vec<(String, String)>,
    pub uploaded: Vec<PathBuf>,
    pub conflicts: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// Lists all regular files below `dir`, sorted by path.
pub fn collect_artifacts(dir: &Path) -> Result<Vec<PathBuf>, PublishError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            PublishError::io(path, e.into())
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Classifies `files` and computes their upload targets.
pub fn plan_uploads(files: &[PathBuf], hint: Option<RepoKind>, config: &BintrayConfig) -> UploadPlan {
    let mut plan = UploadPlan::default();

    for file in files {
        let artifact = match classify(&file.to_string_lossy(), hint) {
            Ok(Classification::Package(artifact)) => artifact,
            Ok(Classification::Archive { .. }) => {
                plan.archives.push(file.clone());
                continue;
            }
            Err(e) => {
                plan.rejected.push((file.clone(), e));
                continue;
            }
        };

        let repo = config.repo_for(artifact.kind);
        let remote_path = format!(
            "/content/{}/{}/{}/{}/{}/{}{};publish={}",
            config.org(),
            repo,
            config.package,
            artifact.version,
            artifact.remote_dir(&config.package),
            artifact.basename,
            artifact.matrix_params(config.component.as_deref()),
            u8::from(artifact.publish_flag())
        );

        plan.uploads.push(PlannedUpload {
            local: file.clone(),
            repo,
            version: artifact.version,
            remote_path,
        });
    }

    plan
}

/// Publisher bound to one configuration.
pub struct Publisher {
    client: BintrayClient,
    config: BintrayConfig,
}

impl Publisher {
    /// Creates a publisher. Fails on missing credentials.
    pub fn new(config: BintrayConfig) -> Result<Self, PublishError> {
        let client = BintrayClient::new(&config)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BintrayConfig {
        &self.config
    }

    /// Uploads one file to an explicit API path.
    pub async fn upload(
        &self,
        remote_path: &str,
        local_file: &Path,
    ) -> Result<UploadStatus, PublishError> {
        let data = tokio::fs::read(local_file)
            .await
            .map_err(|e| PublishError::io(local_file, e))?;

        let status = self.client.upload_file(remote_path, data).await?;
        match status {
            UploadStatus::Uploaded => {
                report::info(format!("File {}: uploaded", local_file.display()))
            }
            UploadStatus::Conflict => report::warning(format!(
                "HTTP WARNING \"{}\" 409 Conflict",
                self.client.url(remote_path)
            )),
        }
        Ok(status)
    }

    /// Publishes every package artifact below `dir`.
    ///
    /// Files that cannot be classified are reported and skipped. The first
    /// HTTP failure other than 409 aborts the batch.
    pub async fn publish(
        &self,
        dir: &Path,
        hint: Option<RepoKind>,
    ) -> Result<PublishSummary, PublishError> {
        let files = collect_artifacts(dir)?;
        tracing::debug!("Found {} files in {}", files.len(), dir.display());

        let plan = plan_uploads(&files, hint, &self.config);
        let mut summary = PublishSummary::default();

        for (file, e) in plan.rejected {
            report::warning(format!("skipping {}: {}", file.display(), e));
            summary.skipped.push(file);
        }
        for file in plan.archives {
            tracing::debug!("Skipping archive {}", file.display());
            summary.skipped.push(file);
        }

        if plan.uploads.is_empty() {
            return Err(PublishError::NothingToPublish(dir.to_path_buf()));
        }

        for upload in plan.uploads {
            let release = (upload.repo.clone(), upload.version.clone());
            if !summary.versions.contains(&release) {
                self.create_version(&upload.repo, &upload.version).await?;
                summary.versions.push(release);
            }

            let data = tokio::fs::read(&upload.local)
                .await
                .map_err(|e| PublishError::io(&upload.local, e))?;

            match self.client.upload_file(&upload.remote_path, data).await? {
                UploadStatus::Uploaded => {
                    report::info(format!("File {}: uploaded", upload.local.display()));
                    summary.uploaded.push(upload.local);
                }
                UploadStatus::Conflict => {
                    report::warning(format!(
                        "File {} ({}): already exists",
                        upload.local.display(),
                        upload.remote_path
                    ));
                    summary.conflicts.push(upload.local);
                }
            }
        }

        Ok(summary)
    }

    async fn create_version(&self, repo: &str, version: &str) -> Result<(), PublishError> {
        let status = self
            .client
            .create_version(repo, &self.config.package, version, &self.config.description)
            .await?;
        match status {
            VersionStatus::Created => report::info(format!("Version {}/{} created", repo, version)),
            VersionStatus::AlreadyExists => {
                report::info(format!("Version {}/{} already exists", repo, version))
            }
        }
        Ok(())
    }

    /// Lists the files of the configured package in `repo`.
    pub async fn files(
        &self,
        repo: &str,
        include_unpublished: bool,
    ) -> Result<Vec<RemoteFile>, PublishError> {
        self.client
            .list_files(repo, &self.config.package, include_unpublished)
            .await
    }

    /// Returns the configured package's description in `repo`.
    pub async fn versions(&self, repo: &str) -> Result<serde_json::Value, PublishError> {
        self.client.package_info(repo, &self.config.package).await
    }

    /// Deletes all but the newest `keep` files of every group in `repo`.
    ///
    /// With `dry_run` deletions are only reported.
    pub async fn prune(
        &self,
        repo: &str,
        keep: usize,
        include_unpublished: bool,
        dry_run: bool,
    ) -> Result<RetentionPlan, PublishError> {
        let files = self.files(repo, include_unpublished).await?;
        let plan = retention::plan(files, keep);

        for file in &plan.keep {
            report::info(format!("keep {}", file.path));
        }

        let removed = if dry_run {
            retention::apply(&plan, |path| async move {
                report::info(format!("delete {} (dry run)", path));
                Ok::<(), PublishError>(())
            })
            .await?
        } else {
            retention::apply(&plan, |path| async move {
                report::info(format!("delete {}", path));
                self.client.delete_file(repo, &path).await
            })
            .await?
        };
        tracing::debug!(
            "Retention in {}: kept {}, removed {}, skipped {}",
            repo,
            plan.keep.len(),
            removed,
            plan.skipped.len()
        );

        Ok(plan)
    }
}
