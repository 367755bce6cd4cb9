//! Golden tests for verifying JSON output format stability
//!
//! These tests ensure that the JSON output format remains stable across
//! releases.
//!
//! Run with: `cargo test --features golden`

#![cfg(feature = "golden")]

use std::process::Command;

/// Get the path to the sc binary
fn sc_binary() -> String {
    let output = Command::new("cargo")
        .args(["build", "--release", "-p", "stratus-cli"])
        .output()
        .expect("Failed to build sc binary");

    if !output.status.success() {
        panic!(
            "Failed to build sc binary: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    env!("CARGO_MANIFEST_DIR").to_string() + "/../../target/release/sc"
}

mod uri_tests {
    use super::*;

    fn uri_json(address: &str) -> serde_json::Value {
        let output = Command::new(sc_binary())
            .args(["uri", address, "--transfer", "--json"])
            .output()
            .expect("Failed to execute sc");

        assert!(output.status.success(), "Command should succeed");
        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout).expect("Output should be valid JSON")
    }

    #[test]
    fn test_uri_user_scoped_object_json() {
        let json = uri_json("stratus://users/U1/buckets/box/objects/o1");
        insta::assert_json_snapshot!("uri_user_scoped_object", json);
    }

    #[test]
    fn test_uri_crypto_bucket_json() {
        let json = uri_json("stratus://buckets/CRYPTO:vault/objects/o1");
        insta::assert_json_snapshot!("uri_crypto_bucket", json);
    }
}

mod profile_tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_profile_list_empty_json() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_dir = temp_dir.path().to_str().unwrap();

        let output = Command::new(sc_binary())
            .args(["profile", "ls", "--json"])
            .env("STRATUS_CONFIG_DIR", config_dir)
            .output()
            .expect("Failed to execute sc");

        assert!(output.status.success(), "Command should succeed");

        let stdout = String::from_utf8_lossy(&output.stdout);
        let json: serde_json::Value =
            serde_json::from_str(&stdout).expect("Output should be valid JSON");

        insta::assert_json_snapshot!("profile_list_empty", json);
    }
}
