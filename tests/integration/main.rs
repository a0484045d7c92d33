//! Integration tests for flatbake

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn flatbake() -> Command {
        cargo_bin_cmd!("flatbake")
    }

    const JSON_MANIFEST: &str =
        r#"{"app-id": "org.example.App", "modules": [{"name": "app"}]}"#;

    #[test]
    fn help_displays() {
        flatbake()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Flatpak build automation"));
    }

    #[test]
    fn version_displays() {
        flatbake()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("flatbake"));
    }

    #[test]
    fn key_derives_from_manifest_bytes() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("app.json");
        std::fs::write(&manifest, JSON_MANIFEST).unwrap();

        flatbake()
            .args(["key", manifest.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::is_match("^flatpak-builder-[0-9a-f]{20}\n$").unwrap());
    }

    #[test]
    fn key_is_deterministic() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("app.json");
        std::fs::write(&manifest, JSON_MANIFEST).unwrap();

        let first = flatbake()
            .args(["key", manifest.to_str().unwrap()])
            .output()
            .unwrap();
        let second = flatbake()
            .args(["key", manifest.to_str().unwrap()])
            .output()
            .unwrap();

        assert!(first.status.success());
        assert_eq!(first.stdout, second.stdout);
    }

    #[test]
    fn key_changes_with_content() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("app.json");

        std::fs::write(&manifest, JSON_MANIFEST).unwrap();
        let first = flatbake()
            .args(["key", manifest.to_str().unwrap()])
            .output()
            .unwrap();

        // A whitespace-only change still produces a new key
        std::fs::write(&manifest, format!("{JSON_MANIFEST} ")).unwrap();
        let second = flatbake()
            .args(["key", manifest.to_str().unwrap()])
            .output()
            .unwrap();

        assert_ne!(first.stdout, second.stdout);
    }

    #[test]
    fn key_prefers_explicit_key() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("app.json");
        std::fs::write(&manifest, JSON_MANIFEST).unwrap();

        flatbake()
            .args(["key", manifest.to_str().unwrap(), "--cache-key", "my-key"])
            .assert()
            .success()
            .stdout(predicate::eq("my-key\n"));
    }

    #[test]
    fn key_rejects_unsupported_extension() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("app.toml");
        std::fs::write(&manifest, "app-id = \"org.example.App\"").unwrap();

        flatbake()
            .args(["key", manifest.to_str().unwrap()])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unsupported manifest format"));
    }

    #[test]
    fn check_reports_manifest_fields() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("app.yml");
        std::fs::write(
            &manifest,
            "app-id: org.example.App\nbranch: stable\nmodules:\n- name: app\n",
        )
        .unwrap();

        flatbake()
            .args(["check", manifest.to_str().unwrap()])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("org.example.App")
                    .and(predicate::str::contains("stable")),
            );
    }

    #[test]
    fn check_json_output() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("app.json");
        std::fs::write(&manifest, JSON_MANIFEST).unwrap();

        flatbake()
            .args(["check", manifest.to_str().unwrap(), "--json"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("\"app_id\": \"org.example.App\"")
                    .and(predicate::str::contains("\"modules\": 1")),
            );
    }

    #[test]
    fn check_fails_without_app_id() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("app.json");
        std::fs::write(&manifest, r#"{"modules": []}"#).unwrap();

        flatbake()
            .args(["check", manifest.to_str().unwrap()])
            .assert()
            .failure()
            .stderr(predicate::str::contains("no app-id"));
    }

    #[test]
    fn build_rejects_unsupported_manifest_before_running_anything() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("app.toml"), "").unwrap();

        flatbake()
            .current_dir(temp.path())
            .args(["build", "--manifest", "app.toml"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unsupported manifest format"));
    }

    #[test]
    fn build_requires_a_manifest() {
        let temp = TempDir::new().unwrap();

        flatbake()
            .current_dir(temp.path())
            .arg("build")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No manifest given"));
    }

    #[test]
    fn build_reports_missing_manifest_file() {
        let temp = TempDir::new().unwrap();

        flatbake()
            .current_dir(temp.path())
            .args(["build", "--manifest", "app.yml"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("reading manifest"));
    }

    #[test]
    fn init_creates_local_config() {
        let temp = TempDir::new().unwrap();

        flatbake()
            .args(["init", "--path", temp.path().to_str().unwrap()])
            .assert()
            .success();

        assert!(temp.path().join(".flatbake.toml").exists());

        // Second run without --force refuses to overwrite
        flatbake()
            .args(["init", "--path", temp.path().to_str().unwrap()])
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }
}

/// End-to-end pipeline runs against stub flatpak tooling on PATH.
#[cfg(unix)]
mod pipeline_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::TempDir;

    const YAML_MANIFEST: &str = "app-id: org.example.App\nmodules:\n- name: app\n";

    fn write_stub(dir: &Path, name: &str, script: &str) {
        let path = dir.join(name);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// Fake flatpak, flatpak-builder and xvfb-run. The xvfb-run stub records
    /// its arguments and leaves a builder state dir behind; the flatpak stub
    /// writes the bundle file on build-bundle.
    fn stub_tools(dir: &Path) {
        write_stub(dir, "flatpak-builder", "#!/bin/sh\nexit 0\n");
        write_stub(
            dir,
            "xvfb-run",
            "#!/bin/sh\nmkdir -p .flatpak-builder/ccache\necho state > .flatpak-builder/ccache/data\nprintf '%s\\n' \"$@\" > xvfb-args.txt\nexit 0\n",
        );
        write_stub(
            dir,
            "flatpak",
            "#!/bin/sh\nif [ \"$1\" = \"build-bundle\" ]; then echo bundle > \"$3\"; fi\nexit 0\n",
        );
    }

    fn stubbed_path(stub_dir: &Path) -> String {
        format!(
            "{}:{}",
            stub_dir.display(),
            std::env::var("PATH").unwrap_or_default()
        )
    }

    fn flatbake() -> Command {
        cargo_bin_cmd!("flatbake")
    }

    #[test]
    fn build_with_tests_and_no_cache() {
        let stubs = TempDir::new().unwrap();
        stub_tools(stubs.path());
        let ws = TempDir::new().unwrap();
        std::fs::write(ws.path().join("app.yml"), YAML_MANIFEST).unwrap();

        flatbake()
            .current_dir(ws.path())
            .env("PATH", stubbed_path(stubs.path()))
            .args([
                "build",
                "--manifest",
                "app.yml",
                "--run-tests",
                "true",
                "--cache",
                "false",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("org.example.App"));

        // Artifact published under the bundle name minus .flatpak
        let artifact = ws.path().join("artifacts/app/app.flatpak");
        assert!(artifact.exists());

        // Manifest rewritten in place with the test patch
        let patched = std::fs::read_to_string(ws.path().join("app.yml")).unwrap();
        assert!(patched.contains("run-tests: true"));
        assert!(patched.contains("--socket=x11"));
        assert!(patched.contains("--share=network"));
        assert!(patched.contains("DISPLAY: 0:0") || patched.contains("DISPLAY: '0:0'"));

        // No remote registered (default URL), no --ccache with cache off
        let args = std::fs::read_to_string(ws.path().join("xvfb-args.txt")).unwrap();
        assert!(args.contains("--install-deps-from=flathub"));
        assert!(args.contains("--force-clean"));
        assert!(args.contains("--disable-rofiles-fuse"));
        assert!(!args.contains("--ccache"));
    }

    #[test]
    fn build_with_cache_saves_state_under_derived_key() {
        let stubs = TempDir::new().unwrap();
        stub_tools(stubs.path());
        let ws = TempDir::new().unwrap();
        let cache_root = TempDir::new().unwrap();
        std::fs::write(ws.path().join("app.yml"), YAML_MANIFEST).unwrap();

        flatbake()
            .current_dir(ws.path())
            .env("PATH", stubbed_path(stubs.path()))
            .args([
                "build",
                "--manifest",
                "app.yml",
                "--cache",
                "yes",
                "--cache-root",
                cache_root.path().to_str().unwrap(),
            ])
            .assert()
            .success();

        // Builder got --ccache, manifest untouched (tests not requested)
        let args = std::fs::read_to_string(ws.path().join("xvfb-args.txt")).unwrap();
        assert!(args.contains("--ccache"));
        let manifest = std::fs::read_to_string(ws.path().join("app.yml")).unwrap();
        assert!(!manifest.contains("run-tests"));

        // One cache entry under the derived key, holding the state dir
        let entries: Vec<_> = std::fs::read_dir(cache_root.path())
            .unwrap()
            .map(|e| e.unwrap())
            .collect();
        assert_eq!(entries.len(), 1);
        let name = entries[0].file_name().to_string_lossy().into_owned();
        assert!(name.starts_with("flatpak-builder-"));
        assert!(entries[0].path().join(".flatpak-builder/ccache/data").exists());
        assert!(entries[0].path().join("meta.json").exists());
    }

    #[test]
    fn build_with_explicit_cache_key() {
        let stubs = TempDir::new().unwrap();
        stub_tools(stubs.path());
        let ws = TempDir::new().unwrap();
        let cache_root = TempDir::new().unwrap();
        std::fs::write(ws.path().join("app.yml"), YAML_MANIFEST).unwrap();

        flatbake()
            .current_dir(ws.path())
            .env("PATH", stubbed_path(stubs.path()))
            .args([
                "build",
                "--manifest",
                "app.yml",
                "--cache",
                "true",
                "--cache-key",
                "flatpak-builder-pinned",
                "--cache-root",
                cache_root.path().to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("flatpak-builder-pinned"));

        assert!(cache_root.path().join("flatpak-builder-pinned").is_dir());
    }
}
