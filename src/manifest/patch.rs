//! Manifest patching for sandboxed test execution
//!
//! Rewrites `build-options` so the builder grants network and X11 access
//! during `make check`, and marks the last module (the application itself)
//! with `run-tests: true`.

use crate::error::{FlatbakeError, FlatbakeResult};
use crate::manifest::Manifest;
use serde_json::{json, Map, Value};

/// Sandbox flags injected ahead of any caller-specified test args
pub const TEST_SANDBOX_ARGS: [&str; 2] = ["--socket=x11", "--share=network"];

/// DISPLAY value the test sandbox points at (xvfb-run's virtual display)
pub const TEST_DISPLAY: &str = "0:0";

impl Manifest {
    /// Patch the manifest in memory to enable test execution.
    ///
    /// Existing `test-args` are preserved after the sandbox flags, without
    /// deduplication. Existing env entries other than `DISPLAY` are kept.
    /// Fails with `EmptyModuleList` when there is no module to mark.
    pub fn enable_tests(&mut self) -> FlatbakeResult<()> {
        let path = self.path().to_path_buf();
        let root = self.root_mut();

        let build_options = root
            .entry("build-options")
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(build_options) = build_options else {
            return Err(FlatbakeError::manifest_invalid(
                &path,
                "build-options must be a mapping",
            ));
        };

        let existing_args = match build_options.get("test-args") {
            Some(Value::Array(args)) => args.clone(),
            Some(_) => {
                return Err(FlatbakeError::manifest_invalid(
                    &path,
                    "build-options.test-args must be a sequence",
                ))
            }
            None => Vec::new(),
        };
        let mut test_args: Vec<Value> =
            TEST_SANDBOX_ARGS.iter().map(|a| json!(a)).collect();
        test_args.extend(existing_args);
        build_options.insert("test-args".to_string(), Value::Array(test_args));

        let env = build_options
            .entry("env")
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(env) = env else {
            return Err(FlatbakeError::manifest_invalid(
                &path,
                "build-options.env must be a mapping",
            ));
        };
        env.insert("DISPLAY".to_string(), json!(TEST_DISPLAY));

        let modules = match root.get_mut("modules") {
            Some(Value::Array(modules)) if !modules.is_empty() => modules,
            Some(Value::Array(_)) | None => {
                return Err(FlatbakeError::EmptyModuleList(path))
            }
            Some(_) => {
                return Err(FlatbakeError::manifest_invalid(
                    &path,
                    "modules must be a sequence",
                ))
            }
        };
        // Only the last module is under test
        let Some(Value::Object(last)) = modules.last_mut() else {
            return Err(FlatbakeError::manifest_invalid(
                &path,
                "modules entries must be mappings",
            ));
        };
        last.insert("run-tests".to_string(), json!(true));

        Ok(())
    }
}
