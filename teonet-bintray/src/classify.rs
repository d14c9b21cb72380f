//! Package filename classification.
//!
//! Maps an artifact filename to the repository, version and remote location
//! it is published under:
//!
//! ```text
//! Debian family: name_version_distro.arch.deb
//! RPM family:    name-version-release.dist.arch.rpm
//! anything else: archive, not published
//! ```

use crate::error::ClassificationError;
use crate::version::VersionInfo;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Distribution identifiers and their release codenames.
pub const CODENAMES: &[(&str, &str)] = &[
    ("ubuntu20.04", "focal"),
    ("ubuntu18.04", "bionic"),
    ("ubuntu16.04", "xenial"),
    ("debian10", "buster"),
    ("debian9", "stretch"),
];

/// Looks up the release codename of a distribution identifier.
pub fn codename(distro: &str) -> Option<&'static str> {
    CODENAMES
        .iter()
        .find(|(id, _)| *id == distro)
        .map(|(_, name)| *name)
}

/// Remote repository kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RepoKind {
    Ubuntu,
    Debian,
    Centos,
    Fedora,
    Rhel,
    Opensuse,
    Tar,
}

impl RepoKind {
    pub const ALL: [RepoKind; 7] = [
        RepoKind::Ubuntu,
        RepoKind::Debian,
        RepoKind::Centos,
        RepoKind::Fedora,
        RepoKind::Rhel,
        RepoKind::Opensuse,
        RepoKind::Tar,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RepoKind::Ubuntu => "ubuntu",
            RepoKind::Debian => "debian",
            RepoKind::Centos => "centos",
            RepoKind::Fedora => "fedora",
            RepoKind::Rhel => "rhel",
            RepoKind::Opensuse => "opensuse",
            RepoKind::Tar => "tar",
        }
    }

    pub fn is_debian_family(self) -> bool {
        matches!(self, RepoKind::Ubuntu | RepoKind::Debian)
    }

    pub fn is_rpm_family(self) -> bool {
        matches!(
            self,
            RepoKind::Centos | RepoKind::Fedora | RepoKind::Rhel | RepoKind::Opensuse
        )
    }

    /// Release series of these kinds get a `-release` suffix unless stable.
    pub(crate) fn uses_release_suffix(self) -> bool {
        matches!(self, RepoKind::Centos | RepoKind::Fedora | RepoKind::Rhel)
    }
}

impl FromStr for RepoKind {
    type Err = ClassificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepoKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ClassificationError::UnknownRepoKind(s.to_string()))
    }
}

impl fmt::Display for RepoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Family-specific parts of a package filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Family {
    Debian {
        distro: String,
        codename: &'static str,
    },
    Rpm {
        release: String,
        dist: String,
    },
}

/// A classified package artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub basename: String,
    pub kind: RepoKind,
    pub name: String,
    /// Full version (`version-release` for RPM).
    pub version: String,
    pub arch: String,
    pub info: VersionInfo,
    pub family: Family,
}

impl Artifact {
    /// Directory below the version the file is uploaded to.
    pub fn remote_dir(&self, package: &str) -> String {
        let series = self.info.series_path(self.kind);
        match &self.family {
            Family::Debian { .. } => format!("pool/{}/{}", series, package),
            Family::Rpm { dist, .. } => format!("linux/{}/{}/{}", series, dist, self.arch),
        }
    }

    /// Debian matrix parameters (`;key=value` pairs), empty for RPM.
    pub fn matrix_params(&self, component: Option<&str>) -> String {
        match &self.family {
            Family::Debian { codename, .. } => {
                let component = component
                    .map(str::to_string)
                    .unwrap_or_else(|| self.info.component());
                format!(
                    ";deb_component={};deb_distribution={};deb_architecture={}",
                    component, codename, self.arch
                )
            }
            Family::Rpm { .. } => String::new(),
        }
    }

    /// Whether the upload is published immediately.
    pub fn publish_flag(&self) -> bool {
        is_publishable(&self.basename)
    }

    /// Files of one package build line share a retention group.
    pub fn retention_group(&self) -> String {
        match &self.family {
            Family::Debian { distro, .. } => format!("{}_{}.{}", self.name, distro, self.arch),
            Family::Rpm { dist, .. } => format!("{}.{}.{}", self.name, dist, self.arch),
        }
    }
}

/// Result of classifying a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Package(Artifact),
    Archive { basename: String },
}

impl Classification {
    pub fn basename(&self) -> &str {
        match self {
            Classification::Package(artifact) => &artifact.basename,
            Classification::Archive { basename } => basename,
        }
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            Classification::Package(artifact) => Some(artifact),
            Classification::Archive { .. } => None,
        }
    }
}

/// Uploads of `-dirty` builds (any case) are left unpublished.
pub fn is_publishable(basename: &str) -> bool {
    !basename.to_lowercase().contains("-dirty")
}

/// Classifies an artifact path. `hint` overrides the detected repository kind.
pub fn classify(path: &str, hint: Option<RepoKind>) -> Result<Classification, ClassificationError> {
    let path = path.trim();
    let basename = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    let (stem, ext) = split_extension(&basename);

    let kind = match hint {
        Some(kind) => kind,
        None => detect_kind(&basename, stem, ext)?,
    };

    if kind.is_debian_family() {
        parse_debian(&basename, stem, kind).map(Classification::Package)
    } else if kind.is_rpm_family() {
        parse_rpm(&basename, stem, kind).map(Classification::Package)
    } else {
        Ok(Classification::Archive { basename })
    }
}

fn split_extension(basename: &str) -> (&str, &str) {
    match basename.rfind('.') {
        Some(pos) if pos > 0 => basename.split_at(pos),
        _ => (basename, ""),
    }
}

fn contains_after_start(haystack: &str, needle: &str) -> bool {
    haystack.find(needle).is_some_and(|pos| pos > 0)
}

fn detect_kind(file: &str, stem: &str, ext: &str) -> Result<RepoKind, ClassificationError> {
    let detected = match ext {
        ".deb" => [("_ubuntu", RepoKind::Ubuntu), ("_debian", RepoKind::Debian)]
            .into_iter()
            .find(|(marker, _)| contains_after_start(stem, marker)),
        ".rpm" => [
            (".centos", RepoKind::Centos),
            (".fc", RepoKind::Fedora),
            (".opensuse", RepoKind::Opensuse),
        ]
        .into_iter()
        .find(|(marker, _)| contains_after_start(stem, marker)),
        _ => return Ok(RepoKind::Tar),
    };

    detected
        .map(|(_, kind)| kind)
        .ok_or_else(|| ClassificationError::UnknownFamily {
            file: file.to_string(),
            ext: ext.to_string(),
        })
}

fn parse_debian(file: &str, stem: &str, kind: RepoKind) -> Result<Artifact, ClassificationError> {
    let malformed = |reason| ClassificationError::MalformedName {
        file: file.to_string(),
        reason,
    };

    let (debbase, arch) = stem
        .rsplit_once('.')
        .filter(|(_, arch)| !arch.is_empty())
        .ok_or_else(|| malformed("missing architecture"))?;
    let (name, version_distro) = debbase
        .split_once('_')
        .or_else(|| debbase.split_once('-'))
        .ok_or_else(|| malformed("missing version"))?;
    let (version, distro) = version_distro
        .rsplit_once('_')
        .ok_or_else(|| malformed("missing distribution"))?;

    let codename = codename(distro).ok_or_else(|| ClassificationError::UnknownDistribution {
        file: file.to_string(),
        distro: distro.to_string(),
    })?;
    let info = VersionInfo::parse(version)?;

    Ok(Artifact {
        basename: file.to_string(),
        kind,
        name: name.to_string(),
        version: version.to_string(),
        arch: arch.to_string(),
        info,
        family: Family::Debian {
            distro: distro.to_string(),
            codename,
        },
    })
}

fn parse_rpm(file: &str, stem: &str, kind: RepoKind) -> Result<Artifact, ClassificationError> {
    let malformed = |reason| ClassificationError::MalformedName {
        file: file.to_string(),
        reason,
    };

    let (rpmbase, arch) = stem
        .rsplit_once('.')
        .ok_or_else(|| malformed("missing architecture"))?;
    let (rest, release_tail) = rpmbase
        .rsplit_once('-')
        .ok_or_else(|| malformed("missing release"))?;
    let (name, upstream) = rest
        .rsplit_once('-')
        .ok_or_else(|| malformed("missing version"))?;
    let (release, dist) = release_tail
        .split_once('.')
        .ok_or_else(|| malformed("missing dist tag"))?;

    let version = format!("{}-{}", upstream, release);
    let info = VersionInfo::parse(&version)?;

    Ok(Artifact {
        basename: file.to_string(),
        kind,
        name: name.to_string(),
        version,
        arch: arch.to_string(),
        info,
        family: Family::Rpm {
            release: release.to_string(),
            dist: dist.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn package(path: &str) -> Artifact {
        match classify(path, None).unwrap() {
            Classification::Package(artifact) => artifact,
            other => panic!("expected a package, got {:?}", other),
        }
    }

    #[test]
    fn test_ubuntu_package() {
        let artifact = package("build/libtest_0.0.3-14_ubuntu20.04.amd64.deb");
        assert_eq!(artifact.basename, "libtest_0.0.3-14_ubuntu20.04.amd64.deb");
        assert_eq!(artifact.kind, RepoKind::Ubuntu);
        assert_eq!(artifact.name, "libtest");
        assert_eq!(artifact.version, "0.0.3-14");
        assert_eq!(artifact.arch, "amd64");
        assert_eq!(
            artifact.family,
            Family::Debian {
                distro: "ubuntu20.04".to_string(),
                codename: "focal"
            }
        );
        assert_eq!(artifact.remote_dir("libteonet"), "pool/t/libteonet");
        assert_eq!(
            artifact.matrix_params(None),
            ";deb_component=unstable;deb_distribution=focal;deb_architecture=amd64"
        );
        assert!(artifact.publish_flag());
        assert_eq!(artifact.retention_group(), "libtest_ubuntu20.04.amd64");
    }

    #[test]
    fn test_debian_package() {
        let artifact = package("libtest_0.0.3-14_debian9.amd64.deb");
        assert_eq!(artifact.kind, RepoKind::Debian);
        assert!(matches!(
            artifact.family,
            Family::Debian {
                codename: "stretch",
                ..
            }
        ));

        let artifact = package("  libtest_0.0.3-14_debian10.amd64.deb\n");
        assert_eq!(artifact.basename, "libtest_0.0.3-14_debian10.amd64.deb");
        assert!(matches!(
            artifact.family,
            Family::Debian {
                codename: "buster",
                ..
            }
        ));
    }

    #[test]
    fn test_release_series_debian() {
        let artifact = package("libteonet_4.2.1-3~ga_ubuntu18.04.arm64.deb");
        assert_eq!(artifact.remote_dir("libteonet"), "pool/4.2/libteonet");
        assert_eq!(
            artifact.matrix_params(None),
            ";deb_component=stable-4.2;deb_distribution=bionic;deb_architecture=arm64"
        );
        assert_eq!(
            artifact.matrix_params(Some("main")),
            ";deb_component=main;deb_distribution=bionic;deb_architecture=arm64"
        );
    }

    #[test]
    fn test_fedora_package() {
        let artifact = package("libtest-0.0.3-14.fc32.x86_64.rpm");
        assert_eq!(artifact.kind, RepoKind::Fedora);
        assert_eq!(artifact.name, "libtest");
        assert_eq!(artifact.version, "0.0.3-14");
        assert_eq!(artifact.arch, "x86_64");
        assert_eq!(
            artifact.family,
            Family::Rpm {
                release: "14".to_string(),
                dist: "fc32".to_string()
            }
        );
        assert_eq!(artifact.remote_dir("libteonet"), "linux/t/fc32/x86_64");
        assert_eq!(artifact.matrix_params(Some("main")), "");
        assert_eq!(artifact.retention_group(), "libtest.fc32.x86_64");
    }

    #[test]
    fn test_centos_and_opensuse_packages() {
        let artifact = package("libtest-0.0.3-14.el7.7.centos.x86_64.rpm");
        assert_eq!(artifact.kind, RepoKind::Centos);
        assert!(matches!(&artifact.family, Family::Rpm { dist, .. } if dist == "el7.7.centos"));

        let artifact = package("libtest-0.0.3-14.opensuse15.2.x86_64.rpm");
        assert_eq!(artifact.kind, RepoKind::Opensuse);
        assert!(matches!(&artifact.family, Family::Rpm { dist, .. } if dist == "opensuse15.2"));

        let artifact = package("libteonet-4.2.1-3.el8.0.centos.x86_64.rpm");
        assert_eq!(artifact.remote_dir("libteonet"), "linux/4.2-release/el8.0.centos/x86_64");
    }

    #[test]
    fn test_archive() {
        let classification = classify("dist/libtest-v0.0.6.tar.gz", None).unwrap();
        assert_eq!(
            classification,
            Classification::Archive {
                basename: "libtest-v0.0.6.tar.gz".to_string()
            }
        );
        assert!(classification.artifact().is_none());

        assert!(matches!(
            classify("README", None).unwrap(),
            Classification::Archive { .. }
        ));
    }

    #[test]
    fn test_classification_errors() {
        assert!(matches!(
            classify("libtest_0.0.3-14_ubuntu12.04.amd64.deb", None),
            Err(ClassificationError::UnknownDistribution { distro, .. }) if distro == "ubuntu12.04"
        ));
        assert!(matches!(
            classify("libtest_0.0.3-14_arch.amd64.deb", None),
            Err(ClassificationError::UnknownFamily { .. })
        ));
        assert!(matches!(
            classify("libtest-0.0.3-14.el7.x86_64.rpm", None),
            Err(ClassificationError::UnknownFamily { .. })
        ));
        assert!(matches!(
            classify("libtest-0.0.3.fc32.x86_64.rpm", None),
            Err(ClassificationError::MalformedName { .. })
        ));
        assert!(matches!(
            classify("libtest_x.y-1_ubuntu20.04.amd64.deb", None),
            Err(ClassificationError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_hint_overrides_detection() {
        let classification = classify("libtest_0.0.3-14_ubuntu20.04.amd64.deb", Some(RepoKind::Tar));
        assert!(matches!(classification, Ok(Classification::Archive { .. })));

        let artifact = match classify("libtest-4.2.0-1.el7.x86_64.rpm", Some(RepoKind::Rhel)) {
            Ok(Classification::Package(artifact)) => artifact,
            other => panic!("unexpected: {:?}", other),
        };
        assert_eq!(artifact.kind, RepoKind::Rhel);
        assert_eq!(artifact.remote_dir("libteonet"), "linux/4.2-release/el7/x86_64");
    }

    #[test]
    fn test_repo_kind_from_str() {
        assert_eq!("ubuntu".parse::<RepoKind>().unwrap(), RepoKind::Ubuntu);
        assert_eq!("CentOS".parse::<RepoKind>().unwrap(), RepoKind::Centos);
        assert!("slackware".parse::<RepoKind>().is_err());
        for kind in RepoKind::ALL {
            assert_eq!(kind.to_string().parse::<RepoKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_dirty_builds_are_unpublished() {
        assert!(!is_publishable("libtest_0.0.3-14-dirty_ubuntu20.04.amd64.deb"));
        assert!(!is_publishable("libtest-0.0.3-14-DIRTY.fc32.x86_64.rpm"));
        assert!(is_publishable("libtest_0.0.3-14_ubuntu20.04.amd64.deb"));
        assert!(is_publishable("dirty_0.0.3-14_ubuntu20.04.amd64.deb"));
    }

    fn deb_distro() -> impl Strategy<Value = &'static str> {
        prop::sample::select(CODENAMES.iter().map(|(id, _)| *id).collect::<Vec<_>>())
    }

    proptest! {
        #[test]
        fn prop_debian_names_round_trip(
            name in "[a-z][a-z0-9]{0,12}",
            version in "[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,2}-[0-9]{1,3}",
            distro in deb_distro(),
            arch in "(amd64|arm64|i386|armhf)",
        ) {
            let file = format!("{}_{}_{}.{}.deb", name, version, distro, arch);
            let artifact = package(&file);

            prop_assert_eq!(&artifact.name, &name);
            prop_assert_eq!(&artifact.version, &version);
            prop_assert_eq!(&artifact.arch, &arch);
            prop_assert_eq!(debian_codename(&artifact), codename(distro));
        }

        #[test]
        fn prop_rpm_names_split_from_the_right(
            name in "[a-z][a-z0-9]{0,6}(\\.[0-9]{1,2}){0,2}(-[a-z]{1,5})?",
            upstream in "[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,2}",
            release in "[0-9]{1,3}",
            dist in "(fc32|fc33|el7\\.7\\.centos|el8\\.0\\.centos|opensuse15\\.2)",
            arch in "(x86_64|aarch64|noarch)",
        ) {
            let file = format!("{}-{}-{}.{}.{}.rpm", name, upstream, release, dist, arch);
            let artifact = package(&file);

            prop_assert_eq!(&artifact.name, &name);
            prop_assert_eq!(artifact.version, format!("{}-{}", upstream, release));
            prop_assert_eq!(&artifact.arch, &arch);
            prop_assert_eq!(
                artifact.family,
                Family::Rpm { release: release.clone(), dist: dist.clone() }
            );
        }

        #[test]
        fn prop_publish_flag_tracks_dirty_marker(
            prefix in "[a-zA-Z0-9_.]{0,10}",
            marker in "-[dD][iI][rR][tT][yY]",
            suffix in "[a-zA-Z0-9_.]{0,10}",
        ) {
            let dirty = format!("{}{}{}", prefix, marker, suffix);
            let clean = format!("{}{}", prefix, suffix);
            prop_assert!(!is_publishable(&dirty));
            prop_assert!(is_publishable(&clean));
        }
    }

    fn debian_codename(artifact: &Artifact) -> Option<&'static str> {
        match artifact.family {
            Family::Debian { codename, .. } => Some(codename),
            Family::Rpm { .. } => None,
        }
    }
}
