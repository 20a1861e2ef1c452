//! CLI integration tests for surface-bind binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("surface-bind"))
}

// Helper to create a temp document file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const DRIVE: &str = r#"{
    "name": "drive",
    "description": "Manages files in Drive.",
    "baseUrl": "https://x/",
    "resources": {
        "files": {
            "methods": {
                "list": {
                    "path": "files",
                    "httpMethod": "GET",
                    "parameters": {
                        "q": { "type": "string", "location": "query" },
                        "pageSize": { "type": "integer", "location": "query", "default": "10" }
                    }
                },
                "get": {
                    "path": "files/{fileId}",
                    "httpMethod": "GET",
                    "parameterOrder": ["fileId"],
                    "parameters": {
                        "fileId": { "type": "string", "location": "path", "required": true }
                    }
                }
            },
            "resources": {
                "revisions": {
                    "methods": {
                        "list": {
                            "path": "files/{fileId}/revisions",
                            "httpMethod": "GET",
                            "parameters": {
                                "fileId": { "type": "string", "location": "path", "required": true }
                            }
                        }
                    }
                }
            }
        }
    }
}"#;

mod request_command {
    use super::*;

    #[test]
    fn keyword_query_parameter() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "drive.json", DRIVE);

        cmd()
            .args([
                "request",
                doc.to_str().unwrap(),
                "files.list",
                "--param",
                "q=name contains 'x'",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""url":"https://x/files""#))
            .stdout(predicate::str::contains(
                r#""query":{"q":"name contains 'x'","pageSize":10}"#,
            ));
    }

    #[test]
    fn positional_path_parameter() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "drive.json", DRIVE);

        cmd()
            .args(["request", doc.to_str().unwrap(), "files.get", "abc"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""http_method":"GET""#))
            .stdout(predicate::str::contains(r#""url":"https://x/files/abc""#));
    }

    #[test]
    fn nested_operation() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "drive.json", DRIVE);

        cmd()
            .args([
                "request",
                doc.to_str().unwrap(),
                "files.revisions.list",
                "-p",
                "fileId=f1",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("https://x/files/f1/revisions"));
    }

    #[test]
    fn pretty_output() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "drive.json", DRIVE);

        cmd()
            .args([
                "request",
                doc.to_str().unwrap(),
                "files.get",
                "abc",
                "--pretty",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("{\n"));
    }

    #[test]
    fn missing_required_argument_exits_1() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "drive.json", DRIVE);

        cmd()
            .args(["request", doc.to_str().unwrap(), "files.get"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("missing required argument"));
    }

    #[test]
    fn unknown_keyword_exits_1() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "drive.json", DRIVE);

        cmd()
            .args([
                "request",
                doc.to_str().unwrap(),
                "files.list",
                "-p",
                "corpus=user",
            ])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("corpus"));
    }

    #[test]
    fn unknown_operation_exits_2() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "drive.json", DRIVE);

        cmd()
            .args(["request", doc.to_str().unwrap(), "files.delete"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("no operation named files.delete"));
    }

    #[test]
    fn malformed_param_exits_2() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "drive.json", DRIVE);

        cmd()
            .args(["request", doc.to_str().unwrap(), "files.list", "-p", "q"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("NAME=VALUE"));
    }
}

mod inspect_command {
    use super::*;

    #[test]
    fn text_tree() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "drive.json", DRIVE);

        cmd()
            .args(["inspect", doc.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("drive (https://x/)"))
            .stdout(predicate::str::contains("Manages files in Drive."))
            .stdout(predicate::str::contains(
                "GET https://x/files/{fileId} get(fileId)",
            ))
            .stdout(predicate::str::contains("revisions"));
    }

    #[test]
    fn json_tree() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "drive.json", DRIVE);

        let output = cmd()
            .args(["inspect", doc.to_str().unwrap(), "--json", "--name", "files-api"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let tree: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(tree["name"], "files-api");
        assert_eq!(tree["resources"][0]["methods"][1]["name"], "get");
        assert_eq!(
            tree["resources"][0]["methods"][1]["parameters"][0]["location"],
            "path"
        );
        assert_eq!(
            tree["resources"][0]["resources"][0]["name"],
            "revisions"
        );
    }
}

mod error_handling {
    use super::*;

    #[test]
    fn file_not_found_exits_3() {
        cmd()
            .args(["inspect", "/nonexistent/drive.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn invalid_json_exits_2() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "bad.json", "not json");

        cmd()
            .args(["inspect", doc.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid JSON"));
    }

    #[test]
    fn schema_error_exits_2() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "nobase.json", r#"{"resources": {}}"#);

        cmd()
            .args(["inspect", doc.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("baseUrl"));
    }

    #[test]
    fn unknown_parameter_type_exits_2() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(
            &dir,
            "badtype.json",
            r#"{
                "baseUrl": "https://x/",
                "resources": {
                    "files": {
                        "methods": {
                            "list": {
                                "path": "files",
                                "httpMethod": "GET",
                                "parameters": { "q": { "type": "text", "location": "query" } }
                            }
                        }
                    }
                }
            }"#,
        );

        cmd()
            .args(["inspect", doc.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("unknown type \"text\""));
    }
}

#[cfg(feature = "remote")]
mod discover_command {
    use super::*;

    #[test]
    fn fetches_preferred_version_to_file() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/apis")
            .with_status(200)
            .with_body(r#"{"items":[{"name":"drive","version":"v3","preferred":true}]}"#)
            .create();
        server
            .mock("GET", "/apis/drive/v3/rest")
            .with_status(200)
            .with_body(DRIVE)
            .create();

        let dir = TempDir::new().unwrap();
        let output = dir.path().join("drive.json");

        cmd()
            .args([
                "discover",
                "drive",
                "--directory",
                &server.url(),
                "--output",
                output.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.contains(r#""baseUrl":"https://x/""#));
    }

    #[test]
    fn explicit_version_falls_back_to_v2_template() {
        let mut server = mockito::Server::new();
        let listing = server.mock("GET", "/apis").with_status(503).expect(0).create();
        server
            .mock("GET", "/apis/drive/v3/rest")
            .with_status(404)
            .create();
        server
            .mock("GET", "/v2/drive/rest")
            .match_query(mockito::Matcher::UrlEncoded("version".into(), "v3".into()))
            .with_status(200)
            .with_body(DRIVE)
            .create();

        let template = format!("{}/v2/{{name}}/rest?version={{version}}", server.url());
        cmd()
            .args([
                "discover",
                "drive",
                "--version",
                "v3",
                "--directory",
                &server.url(),
                "--v2-template",
                &template,
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""baseUrl":"https://x/""#));
        listing.assert();
    }

    #[test]
    fn unknown_api_exits_2() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/apis")
            .with_status(200)
            .with_body(r#"{"items":[]}"#)
            .create();

        cmd()
            .args(["discover", "nosuchapi", "--directory", &server.url()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("no service with such name: nosuchapi"));
    }
}
