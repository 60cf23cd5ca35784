// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Input Loader Tests
 * URL lists, exported request files and header override files on disk
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use lonkero_mutator::config::ConfigLoader;
use lonkero_mutator::input::InputSource;
use lonkero_mutator::request::Body;
use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;

fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_url_list_file() {
    let file = temp_file(
        ".txt",
        "https://shop.example.com/item?id=5&ref=\n\nhttps://shop.example.com/cart?a=1&a=2\n",
    );

    let requests = InputSource::UrlList(file.path().to_path_buf()).load().unwrap();

    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url.as_str(), "https://shop.example.com/item");
    assert_eq!(Value::Object(requests[0].query.clone()), json!({"id": "5"}));
    assert_eq!(Value::Object(requests[1].query.clone()), json!({"a": ["1", "2"]}));
}

#[test]
fn test_exported_file_with_xml_and_form_bodies() {
    let content = json!([
        {"Request": {
            "Method": "POST",
            "Host": "http://soap.example.com",
            "Path": "/service",
            "ContentType": "text/xml",
            "Body": "<Envelope><id>5</id></Envelope>"
        }},
        {"Request": {
            "Method": "POST",
            "Host": "http://app.example.com",
            "Path": "/login",
            "ContentType": "application/json",
            "Body": "user=admin&pass=secret"
        }}
    ]);
    let file = temp_file(".json", &content.to_string());

    let requests = InputSource::Exported(file.path().to_path_buf()).load().unwrap();

    assert_eq!(requests.len(), 2);
    assert!(matches!(requests[0].body, Body::Xml(ref root) if root.name == "Envelope"));
    assert_eq!(requests[0].content_type, "text/xml");

    // detected form encoding wins over the declared JSON content type
    assert_eq!(
        requests[1].body,
        Body::Structured(json!({"user": "admin", "pass": "secret"}))
    );
    assert_eq!(requests[1].content_type, "application/x-www-form-urlencoded");
    assert!(!requests[1].wants_json());
}

#[test]
fn test_exported_file_must_be_an_array() {
    let file = temp_file(".json", r#"{"Request": {}}"#);
    assert!(InputSource::Exported(file.path().to_path_buf()).load().is_err());
}

#[test]
fn test_missing_input_file() {
    let source = InputSource::UrlList("/nonexistent/urls.txt".into());
    assert!(source.load().is_err());
}

#[test]
fn test_header_override_file_formats() {
    let yaml = temp_file(".yaml", "X-Api-Key: abc\nUser-Agent: fuzzer\n");
    let headers = ConfigLoader::new(yaml.path())
        .unwrap()
        .load_header_overrides()
        .unwrap();
    assert_eq!(headers["X-Api-Key"], "abc");

    let toml = temp_file(".toml", "\"X-Api-Key\" = \"abc\"\n");
    let headers = ConfigLoader::new(toml.path())
        .unwrap()
        .load_header_overrides()
        .unwrap();
    assert_eq!(headers.len(), 1);
}
