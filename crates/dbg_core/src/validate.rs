//! Consistency checks for generated configs.
//!
//! Each selected config is read back and checked against what its own content
//! implies: the filename, the architecture, the output names and the encoding
//! of the kernel config blob. The run stops at the first mismatch.

use base64::Engine;
use camino::Utf8Path;

use crate::error::{Error, Result};
use crate::identity::ArtifactKind;
use crate::kernel;
use crate::looper::{FsLooper, Looper};
use crate::options::Options;
use crate::record::ConfigRecord;

/// Validates every config the target selects and returns how many passed.
///
/// Validation only reads, so dry-run does not apply.
pub fn validate(opts: &Options) -> Result<usize> {
    let opts = opts.clone().with_dry_run(false);
    let mut validated = 0;

    FsLooper::configs().loop_filtered(&opts, &mut |_driver_version, path| {
        tracing::info!("Validating {}", path);
        validate_config(&opts, Utf8Path::new(path))?;
        validated += 1;
        Ok(())
    })?;

    Ok(validated)
}

/// Checks one config file.
pub fn validate_config(opts: &Options, path: &Utf8Path) -> Result<()> {
    let record = ConfigRecord::read(path)?;
    let identity = record.identity();

    let expected_name = identity.config_name();
    let found_name = path.file_name().unwrap_or_default();
    if found_name != expected_name {
        return Err(Error::NamingMismatch {
            path: path.to_owned(),
            found: found_name.to_string(),
            expected: expected_name,
        });
    }

    let expected_arch = opts.architecture.deb();
    if record.architecture != expected_arch {
        return Err(Error::ArchitectureMismatch {
            path: path.to_owned(),
            found: record.architecture.clone(),
            expected: expected_arch.to_string(),
        });
    }

    for kind in [ArtifactKind::Module, ArtifactKind::Probe] {
        let output = record.output.get(kind);
        if output.is_empty() {
            continue;
        }

        let supported = match kind {
            ArtifactKind::Module => kernel::supports_module(&record.kernel_release, opts.architecture),
            ArtifactKind::Probe => kernel::supports_probe(&record.kernel_release, opts.architecture),
        };
        if !supported {
            tracing::warn!(
                "Output {} set for {} but kernel release {} does not support it",
                kind,
                path,
                record.kernel_release
            );
        }

        let output_path = Utf8Path::new(output);
        let expected = identity.artifact_name(&opts.driver_name, kind);
        let found = output_path.file_name().unwrap_or_default();
        if found != expected {
            return Err(Error::OutputNamingMismatch {
                path: path.to_owned(),
                kind,
                found: found.to_string(),
                expected,
            });
        }

        // The architecture token must be a folder of the path; kernel releases
        // often carry one in the filename itself.
        let arch_folder = opts.architecture.non_deb();
        let in_folder = output_path
            .parent()
            .is_some_and(|dir| dir.components().any(|c| c.as_str() == arch_folder));
        if !in_folder {
            return Err(Error::OutputArchitectureMismatch {
                kind,
                path: output.to_string(),
                expected: arch_folder.to_string(),
            });
        }
    }

    if !record.kernel_config_data.is_empty()
        && base64::engine::general_purpose::STANDARD
            .decode(record.kernel_config_data.as_bytes())
            .is_err()
    {
        return Err(Error::Encoding {
            path: path.to_owned(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::Architecture;
    use crate::identity::Identity;
    use crate::paths;
    use crate::target::Target;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Options) {
        let temp = TempDir::new().unwrap();
        let root = Utf8Path::from_path(temp.path()).unwrap().to_owned();
        let opts = Options::new(root, Architecture::Amd64).with_driver_versions(["1.0.0+driver"]);
        (temp, opts)
    }

    fn write(opts: &Options, name: &str, record: &ConfigRecord) -> Utf8PathBuf {
        let path = paths::config_path(opts.repo_root(), "1.0.0+driver", opts.architecture, name);
        record.write(&path).unwrap();
        path
    }

    fn good_record() -> ConfigRecord {
        let mut record = ConfigRecord::new(&Identity::new("centos", "5.10.0", "1"), Architecture::Amd64);
        record.fill_outputs("1.0.0+driver", "falco", Architecture::Amd64, true, true);
        record
    }

    #[test]
    fn test_valid_config() {
        let (_temp, opts) = setup();
        write(&opts, "centos_5.10.0_1.yaml", &good_record());
        assert_eq!(validate(&opts).unwrap(), 1);
    }

    #[test]
    fn test_wrong_filename() {
        let (_temp, opts) = setup();
        let bad = write(&opts, "centos_5.10.0_2.yaml", &good_record());
        assert!(matches!(
            validate(&opts),
            Err(Error::NamingMismatch { path, found, expected })
                if path == bad
                    && found == "centos_5.10.0_2.yaml"
                    && expected == "centos_5.10.0_1.yaml"
        ));
    }

    #[test]
    fn test_wrong_architecture() {
        let (_temp, opts) = setup();
        let mut record = good_record();
        record.architecture = "arm64".to_string();
        write(&opts, "centos_5.10.0_1.yaml", &record);
        assert!(matches!(validate(&opts), Err(Error::ArchitectureMismatch { .. })));
    }

    #[test]
    fn test_wrong_output_name() {
        let (_temp, opts) = setup();
        let mut record = good_record();
        record.output.probe = "output/1.0.0+driver/x86_64/falco_centos_5.10.0_2.o".to_string();
        let config = write(&opts, "centos_5.10.0_1.yaml", &record);
        assert!(matches!(
            validate(&opts),
            Err(Error::OutputNamingMismatch { path, kind: ArtifactKind::Probe, .. }) if path == config
        ));
    }

    #[test]
    fn test_output_name_uses_driver_name() {
        let (_temp, opts) = setup();
        write(&opts, "centos_5.10.0_1.yaml", &good_record());
        let opts = opts.with_driver_name("CUSTOM");
        assert!(matches!(
            validate(&opts),
            Err(Error::OutputNamingMismatch { kind: ArtifactKind::Module, .. })
        ));
    }

    #[test]
    fn test_wrong_output_architecture() {
        let (_temp, opts) = setup();
        let mut record = ConfigRecord::new(
            &Identity::new("centos", "5.14.0-284.el9.x86_64", "1"),
            Architecture::Amd64,
        );
        record.output.module =
            "output/1.0.0+driver/aarch64/falco_centos_5.14.0-284.el9.x86_64_1.ko".to_string();
        write(&opts, "centos_5.14.0-284.el9.x86_64_1.yaml", &record);
        assert!(matches!(
            validate(&opts),
            Err(Error::OutputArchitectureMismatch { kind: ArtifactKind::Module, .. })
        ));
    }

    #[test]
    fn test_bad_kernel_config_data() {
        let (_temp, opts) = setup();
        let mut record = good_record();
        record.kernel_config_data = "not base64!".to_string();
        write(&opts, "centos_5.10.0_1.yaml", &record);
        assert!(matches!(validate(&opts), Err(Error::Encoding { .. })));
    }

    #[test]
    fn test_unsupported_output_only_warns() {
        let (_temp, opts) = setup();
        let mut record = ConfigRecord::new(&Identity::new("centos", "3.10.0", "1"), Architecture::Amd64);
        record.fill_outputs("1.0.0+driver", "falco", Architecture::Amd64, true, true);
        write(&opts, "centos_3.10.0_1.yaml", &record);
        assert_eq!(validate(&opts).unwrap(), 1);
    }

    #[test]
    fn test_stops_at_first_failure() {
        let (_temp, opts) = setup();
        let mut bad = good_record();
        bad.architecture = "arm64".to_string();
        write(&opts, "centos_5.10.0_1.yaml", &bad);
        write(&opts, "centos_5.10.0_9.yaml", &good_record());
        let opts = opts.with_target(Target::new("centos", "", ""));
        assert!(validate(&opts).is_err());
    }
}
