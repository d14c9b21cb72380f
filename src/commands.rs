//! Command execution.

use crate::Commands;
use teonet_bintray::{
    classify, report, BintrayConfig, Classification, PublishError, Publisher, RepoKind,
};

/// Executes a command.
pub async fn execute(command: Commands) -> Result<(), PublishError> {
    let config = BintrayConfig::load()?;
    tracing::debug!("Using API {} as org '{}'", config.api_url, config.org());

    match command {
        Commands::Classify { files, repo_kind } => {
            classify_files(&config, &files, repo_kind)?;
        }

        Commands::Upload {
            remote_path,
            local_file,
        } => {
            let publisher = Publisher::new(config)?;
            publisher.upload(&remote_path, &local_file).await?;
        }

        Commands::Publish {
            directory,
            repo_kind,
        } => {
            let publisher = Publisher::new(config)?;
            let summary = publisher.publish(&directory, repo_kind).await?;
            report::info(format!(
                "Published {} files ({} already present, {} skipped)",
                summary.uploaded.len(),
                summary.conflicts.len(),
                summary.skipped.len()
            ));
        }

        Commands::Prune {
            repo,
            keep,
            include_unpublished,
            dry_run,
        } => {
            let publisher = Publisher::new(config)?;
            let keep = keep.unwrap_or(publisher.config().retention_keep);
            let plan = publisher
                .prune(&repo, keep, include_unpublished, dry_run)
                .await?;
            report::info(format!(
                "{}: kept {}, deleted {}, ignored {}",
                repo,
                plan.keep.len(),
                plan.delete.len(),
                plan.skipped.len()
            ));
        }

        Commands::Files {
            repo,
            include_unpublished,
        } => {
            let publisher = Publisher::new(config)?;
            for file in publisher.files(&repo, include_unpublished).await? {
                let created = file
                    .created
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}\t{}\t{}\t{}", file.version, created, file.size, file.path);
            }
        }

        Commands::Versions { repo } => {
            let publisher = Publisher::new(config)?;
            let info = publisher.versions(&repo).await?;
            let text = serde_json::to_string_pretty(&info).unwrap_or_else(|_| info.to_string());
            println!("{}", text);
        }
    }

    Ok(())
}

fn classify_files(
    config: &BintrayConfig,
    files: &[String],
    hint: Option<RepoKind>,
) -> Result<(), PublishError> {
    let mut first_error = None;

    for file in files {
        match classify(file, hint) {
            Ok(Classification::Package(artifact)) => {
                report::info(format!(
                    "{}: repo={} version={} path={}{};publish={}",
                    artifact.basename,
                    config.repo_for(artifact.kind),
                    artifact.version,
                    artifact.remote_dir(&config.package),
                    artifact.matrix_params(config.component.as_deref()),
                    u8::from(artifact.publish_flag())
                ));
            }
            Ok(Classification::Archive { basename }) => {
                report::info(format!("{}: archive, not published", basename));
            }
            Err(e) => {
                report::warning(&e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
