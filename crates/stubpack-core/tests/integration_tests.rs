//! End-to-end build tests for stubpack-core.

#![allow(clippy::unwrap_used)]

use std::fs;
use std::io::Cursor;
use std::io::Read;
use std::path::Path;
use stubpack_core::BuildOutcome;
use stubpack_core::BuildReport;
use stubpack_core::CompressMode;
use stubpack_core::ContainerFormat;
use stubpack_core::CopyEntry;
use stubpack_core::ExtensionPolicy;
use stubpack_core::Options;
use stubpack_core::PackError;
use stubpack_core::StalePolicy;
use stubpack_core::assembler::checksum_path;
use stubpack_core::assembler::digest_hex;
use stubpack_core::build;
use stubpack_core::build_manifest;
use stubpack_core::loader;
use stubpack_core::verify_checksum;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn built(outcome: BuildOutcome) -> BuildReport {
    match outcome {
        BuildOutcome::Built(report) => report,
        BuildOutcome::NothingToBuild => panic!("expected a build"),
    }
}

fn manifest_paths(options: &Options) -> Vec<String> {
    build_manifest(options)
        .unwrap()
        .iter()
        .map(|entry| entry.relative_path.clone())
        .collect()
}

#[test]
fn test_ignored_directory_is_excluded() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "src/a.php", "a");
    write(temp.path(), "src/tests/b.php", "b");

    let options = Options::new(temp.path())
        .with_directories(vec!["src".to_string()])
        .with_ignore(vec!["tests".to_string()]);

    assert_eq!(manifest_paths(&options), vec!["src/a.php"]);
}

#[test]
fn test_php_always_allowed_with_custom_allowlist() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "run.php", "<?php");

    let options = Options::new(temp.path())
        .with_files(vec!["run.php".to_string()])
        .with_extensions(vec!["stub".to_string()]);

    assert_eq!(manifest_paths(&options), vec!["run.php"]);
}

#[test]
fn test_clear_before_build_removes_old_content() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "src/a.php", "a");
    write(temp.path(), "dist/old.txt", "old");

    let options = Options::new(temp.path())
        .with_directories(vec!["src".to_string()])
        .with_output_name("app.phar")
        .with_clear_before_build(true);

    built(build(&options).unwrap());
    assert!(!temp.path().join("dist/old.txt").exists());
    assert!(temp.path().join("dist/app.phar").is_file());
}

#[test]
fn test_gzip_builds_are_reproducible() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "src/a.php", &"<?php echo 'a';\n".repeat(100));
    write(temp.path(), "src/z/b.php", "<?php echo 'b';");
    write(temp.path(), "src/m.php", "<?php echo 'm';");

    let options = Options::new(temp.path())
        .with_directories(vec!["src".to_string()])
        .with_output_name("app.phar")
        .with_compress(CompressMode::Gzip);

    let first = built(build(&options).unwrap()).archive.unwrap();
    let second = built(build(&options).unwrap()).archive.unwrap();
    assert_eq!(first.checksum_hex, second.checksum_hex);
    assert_eq!(first.size_bytes, second.size_bytes);
}

#[test]
fn test_no_archive_mode_with_copy_map() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "src/a.php", "a");
    write(temp.path(), "assets/css/site.css", "body {}");
    write(temp.path(), "assets/logo.svg", "<svg/>");

    let options = Options::new(temp.path())
        .with_directories(vec!["src".to_string()])
        .with_copy(vec![CopyEntry::new("assets", "assets")]);

    let report = built(build(&options).unwrap());
    assert!(report.archive.is_none());
    assert_eq!(report.aux_copies, 1);
    for relative in ["assets/css/site.css", "assets/logo.svg", "src/a.php"] {
        assert_eq!(
            fs::read(temp.path().join("dist").join(relative)).unwrap(),
            fs::read(temp.path().join(relative)).unwrap(),
            "{relative} differs"
        );
    }
}

#[test]
fn test_copy_map_applies_independently_of_rules() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "src/a.php", "a");
    write(temp.path(), "README.md", "readme");

    let options = Options::new(temp.path())
        .with_directories(vec!["src".to_string()])
        .with_output_name("app.phar")
        .with_ignore(vec!["README".to_string()])
        .with_copy(vec![CopyEntry::new("README.md", "docs/README.md")]);

    built(build(&options).unwrap());
    assert_eq!(
        fs::read_to_string(temp.path().join("dist/docs/README.md")).unwrap(),
        "readme"
    );
}

#[test]
fn test_archive_checksum_sidecar() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "src/a.php", "a");

    let options = Options::new(temp.path())
        .with_directories(vec!["src".to_string()])
        .with_output_name("app.phar");

    let archive = built(build(&options).unwrap()).archive.unwrap();
    let bytes = fs::read(&archive.output_path).unwrap();
    let sidecar = fs::read_to_string(checksum_path(&archive.output_path)).unwrap();

    assert_eq!(sidecar, digest_hex(&bytes));
    assert_eq!(sidecar.len(), 32);
    assert!(!sidecar.ends_with('\n'));
    assert_eq!(verify_checksum(&archive.output_path).unwrap(), sidecar);
}

#[test]
fn test_archive_contents_and_preamble() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "src/App.php", "<?php class App {}");
    write(temp.path(), "src/notes.txt", "skipped");
    write(temp.path(), "bin/run.php", "<?php run();");

    let options = Options::new(temp.path())
        .with_directories(vec!["src".to_string()])
        .with_files(vec!["bin/run.php".to_string()])
        .with_output_name("tool.phar")
        .with_main_entry("bin/run.php")
        .with_shebang(Some("php".to_string()))
        .with_compress(CompressMode::Bzip2);

    let report = built(build(&options).unwrap());
    assert_eq!(report.total_files, 2);

    let bytes = fs::read(temp.path().join("dist/tool.phar")).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.starts_with("#!/usr/bin/env php\n<?php\nPhar::mapPhar('tool.phar');"));
    assert!(text.contains("require 'phar://tool.phar/bin/run.php';"));

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert_eq!(names.len(), 2);

    let mut content = String::new();
    archive
        .by_name("bin/run.php")
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert_eq!(content, "<?php run();");
}

#[test]
fn test_custom_stub_is_verbatim() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "index.php", "<?php");
    write(temp.path(), "stub.php", "<?php /* custom */ __HALT_COMPILER(); ?>\r\n");

    let options = Options::new(temp.path())
        .with_files(vec!["index.php".to_string()])
        .with_output_name("app.phar")
        .with_stub_path(Some("stub.php".into()));

    built(build(&options).unwrap());
    let bytes = fs::read(temp.path().join("dist/app.phar")).unwrap();
    assert!(bytes.starts_with(b"<?php /* custom */ __HALT_COMPILER(); ?>\r\n"));
}

#[test]
fn test_tar_container() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "src/a.php", "alpha");

    let options = Options::new(temp.path())
        .with_directories(vec!["src".to_string()])
        .with_output_name("app.tar.phar")
        .with_format(ContainerFormat::Tar)
        .with_compress(CompressMode::Gzip);

    let report = built(build(&options).unwrap());
    let bytes = fs::read(temp.path().join("dist/app.tar.phar")).unwrap();
    assert_eq!(report.archive.unwrap().size_bytes, bytes.len() as u64);

    let halt = b"__HALT_COMPILER(); ?>\r\n";
    let start = bytes
        .windows(halt.len())
        .position(|window| window == halt)
        .unwrap()
        + halt.len();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(&bytes[start..]));
    let paths: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|entry| entry.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(paths, vec!["src/a.php"]);
}

#[test]
fn test_extension_policy_any() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "src/a.php", "a");
    write(temp.path(), "src/data.json", "{}");

    let allowlist = Options::new(temp.path()).with_directories(vec!["src".to_string()]);
    assert_eq!(manifest_paths(&allowlist), vec!["src/a.php"]);

    let any = allowlist.with_extension_policy(ExtensionPolicy::Any);
    assert_eq!(manifest_paths(&any), vec!["src/a.php", "src/data.json"]);
}

#[test]
fn test_stale_policies() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "src/a.php", "a");
    write(temp.path(), "dist/app.phar", "stale");

    let options = Options::new(temp.path())
        .with_directories(vec!["src".to_string()])
        .with_output_name("app.phar")
        .with_stale_policy(StalePolicy::Strict);

    built(build(&options).unwrap());
    assert_ne!(fs::read(temp.path().join("dist/app.phar")).unwrap(), b"stale");

    // A directory in the artifact's place cannot be unlinked
    fs::remove_file(temp.path().join("dist/app.phar")).unwrap();
    write(temp.path(), "dist/app.phar/keep.txt", "keep");

    let strict = build(&options).unwrap_err();
    assert!(matches!(strict, PackError::StaleArtifact { .. }));

    let best_effort = build(&options.with_stale_policy(StalePolicy::BestEffort));
    assert!(matches!(best_effort.unwrap_err(), PackError::Io(_)));
    assert!(temp.path().join("dist/app.phar/keep.txt").is_file());
}

#[test]
fn test_rebuild_with_root_walk_skips_dist() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "index.php", "<?php");
    write(temp.path(), "lib/util.php", "<?php");

    let options = Options::new(temp.path())
        .with_directories(vec![String::new()])
        .with_output_name("app.phar")
        .with_extension_policy(ExtensionPolicy::Any);

    let first = built(build(&options).unwrap());
    let second = built(build(&options).unwrap());
    assert_eq!(first.total_files, 2);
    assert_eq!(second.total_files, 2);
    assert_eq!(
        first.archive.unwrap().checksum_hex,
        second.archive.unwrap().checksum_hex
    );

    let bytes = fs::read(temp.path().join("dist/app.phar")).unwrap();
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort_unstable();
    assert_eq!(names, ["index.php", "lib/util.php"]);
}

#[test]
fn test_nothing_to_build() {
    let temp = TempDir::new().unwrap();
    let options = Options::new(temp.path()).with_output_name("app.phar");
    assert!(build(&options).unwrap().is_nothing_to_build());
    assert!(!temp.path().join("dist").exists());
}

#[test]
fn test_configuration_file_drives_build() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "lib/Util.php", "<?php");
    write(temp.path(), "lib/vendor/x.php", "<?php");
    write(
        temp.path(),
        loader::CONFIG_FILE_NAME,
        r#"{"output": "lib.phar", "directories": ["lib"], "ignore": ["lib/vendor"], "compress": "bz2"}"#,
    );

    let raw = loader::load_configuration(temp.path());
    let options =
        loader::resolve_options(temp.path(), raw, loader::Overrides::default()).unwrap();
    assert_eq!(options.compress, CompressMode::Bzip2);

    let report = built(build(&options).unwrap());
    assert_eq!(report.total_files, 1);
    assert!(temp.path().join("dist/lib.phar").is_file());
}
