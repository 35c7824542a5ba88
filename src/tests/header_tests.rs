use super::*;

const FULL: &str = "// Type definitions for non-npm package boring 1.2.3
// Project: https://boring.com, https://github.com/boring/boring
// Definitions by: Some Guy From Space <https://github.com/goodspaceguy420>,
//                 Another Person <https://example.com/another>
// Definitions: https://github.com/DefinitelyTyped/DefinitelyTyped
// TypeScript Version: 3.1

export const x: number;
";

#[test]
fn parses_every_field() {
    let header = parse_header(FULL).unwrap();
    assert_eq!(header.library_name, "boring");
    assert_eq!(header.library_major_version, 1);
    assert_eq!(header.library_minor_version, 2);
    assert_eq!(header.typescript_version, TypeScriptVersion::new(3, 1));
    assert_eq!(
        header.projects,
        vec!["https://boring.com".to_string(), "https://github.com/boring/boring".to_string()]
    );
    assert_eq!(
        header.contributors,
        vec![
            Contributor {
                name: "Some Guy From Space".into(),
                url: "https://github.com/goodspaceguy420".into(),
                github_username: Some("goodspaceguy420".into()),
            },
            Contributor {
                name: "Another Person".into(),
                url: "https://example.com/another".into(),
                github_username: None,
            },
        ]
    );
}

#[test]
fn typescript_version_defaults_to_oldest() {
    let text = "// Type definitions for jquery 3.3
// Project: https://jquery.com
// Definitions by: Someone <https://github.com/someone>
// Definitions: https://github.com/DefinitelyTyped/DefinitelyTyped

/// <reference path=\"JQuery.d.ts\" />
";
    let header = parse_header(text).unwrap();
    assert_eq!(header.typescript_version, TypeScriptVersion::OLDEST);
    assert_eq!((header.library_major_version, header.library_minor_version), (3, 3));
}

#[test]
fn minor_version_may_be_x() {
    let text = "// Type definitions for dashed-name 0.x
// Project: https://example.com
// Definitions by: Someone <https://github.com/someone>
// Definitions: https://github.com/DefinitelyTyped/DefinitelyTyped
";
    let header = parse_header(text).unwrap();
    assert_eq!(header.library_name, "dashed-name");
    assert_eq!(header.library_minor_version, 0);
}

#[test]
fn missing_header_is_an_error() {
    let err = parse_header("export const x: number;\n").unwrap_err();
    assert_eq!(err, "missing header");
}

#[test]
fn malformed_lines_are_described() {
    let no_version = "// Type definitions for boring\n";
    assert!(parse_header(no_version).unwrap_err().contains("Type definitions for"));

    let no_project = "// Type definitions for boring 1.0
// Definitions by: Someone <https://github.com/someone>
";
    assert!(parse_header(no_project).unwrap_err().contains("'Project:'"));

    let bad_contributor = "// Type definitions for boring 1.0
// Project: https://boring.com
// Definitions by: Someone without a url
// Definitions: https://github.com/DefinitelyTyped/DefinitelyTyped
";
    assert!(parse_header(bad_contributor).unwrap_err().contains("Name <url>"));

    let bad_ts = "// Type definitions for boring 1.0
// Project: https://boring.com
// Definitions by: Someone <https://github.com/someone>
// Definitions: https://github.com/DefinitelyTyped/DefinitelyTyped
// TypeScript Version: 1.8
";
    assert!(parse_header(bad_ts).unwrap_err().contains("unsupported TypeScript version"));
}
