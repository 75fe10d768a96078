//! Configuration file parsing (YAML/JSON/JSONC).
//!
//! Router options live in a single file; service descriptors may be spread
//! across several files selected by a glob pattern.

use crate::config::error::ConfigError;
use crate::config::options::MockRouterOptions;
use crate::types::descriptor::ServiceDescriptor;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

/// Syntax of a configuration file, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
    Jsonc,
}

impl Format {
    fn of(path: &str) -> Option<Self> {
        let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            "jsonc" => Some(Format::Jsonc),
            _ => None,
        }
    }
}

/// Strip `//` and `/* */` comments from JSONC content, leaving strings intact.
///
/// Line comments keep their terminating newline so error positions survive.
fn strip_json_comments(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek().copied()) {
            ('"', _) => {
                in_string = true;
                result.push(c);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' || skipped == '\r' {
                        result.push(skipped);
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
            }
            _ => result.push(c),
        }
    }

    result
}

/// Deserialize `content` using the syntax implied by `path`'s extension.
pub fn parse_config<T: DeserializeOwned>(content: &str, path: &str) -> Result<T, ConfigError> {
    let parsed = match Format::of(path) {
        Some(Format::Yaml) => serde_yaml::from_str(content)?,
        Some(Format::Json) => serde_json::from_str(content)?,
        Some(Format::Jsonc) => serde_json::from_str(&strip_json_comments(content))?,
        None => return Err(ConfigError::UnknownFileType(path.to_owned())),
    };
    Ok(parsed)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Load router options from a single YAML/JSON/JSONC file
pub fn load_options(path: &str) -> Result<MockRouterOptions, ConfigError> {
    let content = read_file(Path::new(path))?;
    parse_config(&content, path)
}

/// Load service descriptors from every file matching `pattern`.
///
/// Each file holds a list of services. Files are read in sorted path order
/// and their lists concatenated.
pub fn load_services(pattern: &str) -> Result<Vec<ServiceDescriptor>, ConfigError> {
    let mut paths = glob::glob(pattern)?.collect::<Result<Vec<_>, _>>()?;
    paths.sort();

    let mut services = Vec::new();
    for path in paths {
        let content = read_file(&path)?;
        let mut loaded: Vec<ServiceDescriptor> =
            parse_config(&content, &path.display().to_string())?;
        debug!(path = %path.display(), count = loaded.len(), "loaded service descriptors");
        services.append(&mut loaded);
    }
    Ok(services)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::descriptor::MethodKind;
    use rstest::rstest;
    use std::fs;

    #[rstest]
    #[case("services.yaml", Some(Format::Yaml))]
    #[case("services.YML", Some(Format::Yaml))]
    #[case("router.json", Some(Format::Json))]
    #[case("router.jsonc", Some(Format::Jsonc))]
    #[case("router.toml", None)]
    #[case("router", None)]
    fn test_format_of(#[case] path: &str, #[case] expected: Option<Format>) {
        assert_eq!(Format::of(path), expected);
    }

    #[rstest]
    #[case("{\"a\": 1} // trailing", "{\"a\": 1} ")]
    #[case("{/* inline */\"a\": 1}", "{\"a\": 1}")]
    #[case("// header\n{\"a\": 1}", "\n{\"a\": 1}")]
    #[case("{\"a\": 1 /* multi\nline */}", "{\"a\": 1 }")]
    #[case("{\"url\": \"https://demo.connectrpc.com\"}", "{\"url\": \"https://demo.connectrpc.com\"}")]
    #[case("{\"q\": \"say \\\"hi\\\" // still text\"}", "{\"q\": \"say \\\"hi\\\" // still text\"}")]
    fn test_strip_json_comments(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_json_comments(input), expected);
    }

    #[rstest]
    fn test_strip_json_comments_unterminated_block() {
        assert_eq!(strip_json_comments("{} /* never closed"), "{} ");
    }

    const ELIZA_JSON: &str = r#"{
        "typeName": "connectrpc.eliza.v1.ElizaService",
        "methods": {
            "say": {"name": "Say", "kind": "unary", "input": "connectrpc.eliza.v1.SayRequest"},
            "converse": {"name": "Converse", "kind": "bidi_streaming"}
        }
    }"#;

    #[rstest]
    fn test_parse_json_service() {
        let service: ServiceDescriptor = parse_config(ELIZA_JSON, "eliza.json").unwrap();
        assert_eq!(service.type_name, "connectrpc.eliza.v1.ElizaService");
        let say = service.method("say").unwrap();
        assert_eq!(say.input.as_deref(), Some("connectrpc.eliza.v1.SayRequest"));
        assert_eq!(say.output, None);
        assert_eq!(
            service.method_by_name("Converse").unwrap().kind,
            MethodKind::BiDiStreaming
        );
    }

    #[rstest]
    fn test_parse_json_unknown_kind() {
        let content = r#"{"typeName": "s", "methods": {"m": {"name": "M", "kind": "duplex"}}}"#;
        let result: Result<ServiceDescriptor, _> = parse_config(content, "bad.json");
        assert!(matches!(result.unwrap_err(), ConfigError::Json(_)));
    }

    #[rstest]
    fn test_parse_jsonc_service() {
        let content = format!("// eliza\n{ELIZA_JSON} /* end */");
        let service: ServiceDescriptor = parse_config(&content, "eliza.jsonc").unwrap();
        assert_eq!(service.methods.len(), 2);
    }

    #[rstest]
    fn test_parse_yaml_options() {
        let content = "baseUrl: http://localhost:8080\nreadMaxBytes: 1024\n";
        let options: MockRouterOptions = parse_config(content, "router.yaml").unwrap();
        assert_eq!(options.base_url, "http://localhost:8080");
        assert_eq!(options.read_max_bytes, 1024);
        assert!(options.binary_options.read_unknown_fields);
    }

    #[rstest]
    fn test_parse_yaml_invalid() {
        let result: Result<MockRouterOptions, _> = parse_config("baseUrl: [", "router.yml");
        assert!(matches!(result.unwrap_err(), ConfigError::Yaml(_)));
    }

    #[rstest]
    fn test_parse_config_json() {
        let content = r#"{"typeName": "test.v1.TestService", "methods": {}}"#;
        let result: Result<ServiceDescriptor, _> = parse_config(content, "test.json");
        assert!(result.is_ok());
    }

    #[rstest]
    fn test_parse_config_jsonc() {
        let content = r#"{"baseUrl": "http://localhost:8080"} // comment"#;
        let result: Result<MockRouterOptions, _> = parse_config(content, "test.jsonc");
        assert_eq!(result.unwrap().base_url, "http://localhost:8080");
    }

    #[rstest]
    fn test_parse_config_yaml() {
        let content = "typeName: test.v1.TestService\nmethods:\n  unaryOne:\n    name: UnaryOne\n    kind: unary";
        let result: ServiceDescriptor = parse_config(content, "test.yaml").unwrap();
        assert_eq!(result.method("unaryOne").unwrap().kind, MethodKind::Unary);
    }

    #[rstest]
    #[case("test.txt")]
    #[case("test.unknown")]
    #[case("")]
    fn test_parse_config_unknown_file_type(#[case] path: &str) {
        let result: Result<MockRouterOptions, _> = parse_config(r#"{"baseUrl": "x"}"#, path);
        assert!(matches!(result.unwrap_err(), ConfigError::UnknownFileType(_)));
    }

    #[rstest]
    fn test_load_options_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mock.yaml");
        fs::write(
            &path,
            "baseUrl: https://demo.connectrpc.com\njsonOptions:\n  ignoreUnknownFields: false\n",
        )
        .unwrap();

        let options = load_options(path.to_str().unwrap()).unwrap();
        assert_eq!(options.base_url, "https://demo.connectrpc.com");
        assert!(!options.json_options.ignore_unknown_fields);
    }

    #[rstest]
    fn test_load_options_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let result = load_options(path.to_str().unwrap());
        assert!(matches!(result.unwrap_err(), ConfigError::Io { .. }));
    }

    #[rstest]
    fn test_load_services_glob_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("b.json"),
            r#"[{"typeName": "b.v1.Second", "methods": {}}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("a.yaml"),
            "- typeName: a.v1.First\n  methods:\n    ping:\n      name: Ping\n      kind: unary\n",
        )
        .unwrap();
        fs::write(dir.path().join("ignored.txt"), "not matched").unwrap();

        let pattern = format!("{}/[ab].*", dir.path().display());
        let services = load_services(&pattern).unwrap();

        assert_eq!(services.len(), 2);
        assert_eq!(services[0].type_name, "a.v1.First");
        assert_eq!(services[1].type_name, "b.v1.Second");
    }

    #[rstest]
    fn test_load_services_no_match_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.yaml", dir.path().display());
        assert!(load_services(&pattern).unwrap().is_empty());
    }

    #[rstest]
    fn test_load_services_invalid_pattern() {
        let result = load_services("[");
        assert!(matches!(result.unwrap_err(), ConfigError::Pattern(_)));
    }

    #[rstest]
    fn test_load_services_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("services.txt"), "[]").unwrap();
        let pattern = format!("{}/*.txt", dir.path().display());
        let result = load_services(&pattern);
        assert!(matches!(result.unwrap_err(), ConfigError::UnknownFileType(_)));
    }
}
