use super::*;

const FORK: &str = "s3cmd @ https://github.com/unioslo/s3cmd/archive/v2.1.0-custom-headers.tar.gz#egg=s3cmd-2.1.0-custom-headers";

fn v(input: &str) -> Version {
    Version::parse(input).unwrap()
}

#[test]
fn test_normalize_name() {
    assert_eq!(normalize_name("TSD_API.Client"), "tsd-api-client");
    assert_eq!(normalize_name("importlib__metadata"), "importlib-metadata");
    assert_eq!(normalize_name("s3cmd"), "s3cmd");
}

#[test]
fn test_minimum_version_requirement() {
    let req = Requirement::parse("tsd-api-client>=3.4.3").unwrap();
    assert_eq!(req.name, "tsd-api-client");
    assert!(req.marker.is_none());
    assert!(req.is_satisfied_by(&v("3.4.3")));
    assert!(req.is_satisfied_by(&v("3.5.0")));
    assert!(!req.is_satisfied_by(&v("3.4.2")));
    assert_eq!(req.to_string(), "tsd-api-client>=3.4.3");
}

#[test]
fn test_pinned_fork_requirement() {
    let req = Requirement::parse(FORK).unwrap();
    assert_eq!(req.name, "s3cmd");
    let url = req.direct_url().unwrap();
    assert_eq!(
        url.url,
        "https://github.com/unioslo/s3cmd/archive/v2.1.0-custom-headers.tar.gz"
    );
    let egg = url.egg.as_ref().unwrap();
    assert_eq!(egg.name, "s3cmd");
    assert_eq!(egg.tag.as_deref(), Some("2.1.0-custom-headers"));
    assert!(req.specifiers().is_none());
    assert_eq!(req.to_string(), FORK);
}

#[test]
fn test_egg_name_may_contain_dash_digit() {
    let req = Requirement::parse("py-3to2 @ https://x.org/a.tar.gz#egg=py-3to2-1.0").unwrap();
    let egg = req.direct_url().unwrap().egg.as_ref().unwrap();
    assert_eq!(egg.name, "py-3to2");
    assert_eq!(egg.tag.as_deref(), Some("1.0"));

    let req = Requirement::parse("Py_3to2 @ https://x.org/a.tar.gz#egg=py-3to2").unwrap();
    let egg = req.direct_url().unwrap().egg.as_ref().unwrap();
    assert_eq!(egg.name, "py-3to2");
    assert!(egg.tag.is_none());

    let err = Requirement::parse("py @ https://x.org/a.tar.gz#egg=pyyaml-1.0").unwrap_err();
    assert!(err.to_string().contains("does not name 'py'"));
}

#[test]
fn test_conditional_backport_requirement() {
    let req = Requirement::parse(r#"importlib-metadata>=1.4;python_version<"3.8""#).unwrap();
    assert!(req.applies_to(&MarkerEnvironment::python("3.6.8")));
    assert!(req.applies_to(&MarkerEnvironment::python("3.7.3")));
    assert!(!req.applies_to(&MarkerEnvironment::python("3.8.0")));
    assert!(!req.applies_to(&MarkerEnvironment::python("3.11.2")));
    assert_eq!(
        req.to_string(),
        r#"importlib-metadata>=1.4; python_version < "3.8""#
    );
}

#[test]
fn test_unconditional_requirement_always_applies() {
    let req = Requirement::parse("tsd-api-client>=3.4.3").unwrap();
    assert!(req.applies_to(&MarkerEnvironment::python("3.6.0")));
    assert!(req.applies_to(&MarkerEnvironment::python("3.12.0")));
}

#[test]
fn test_extras_parenthesized_specifiers_and_url_markers() {
    let req = Requirement::parse("requests [socks, security] (>=2.0, <3)").unwrap();
    assert_eq!(req.extras, vec!["socks", "security"]);
    assert!(req.is_satisfied_by(&v("2.31")));
    assert!(!req.is_satisfied_by(&v("3.0")));

    let req = Requirement::parse(&format!("{FORK} ; os_name == \"posix\"")).unwrap();
    assert!(req.direct_url().is_some());
    assert!(req.marker.is_some());
    let reparsed = Requirement::parse(&req.to_string()).unwrap();
    assert_eq!(reparsed, req);
}

#[test]
fn test_bare_name_admits_any_final_release() {
    let req = Requirement::parse("s3cmd").unwrap();
    assert!(req.specifiers().unwrap().is_empty());
    assert!(req.is_satisfied_by(&v("2.1.0")));
}

#[test]
fn test_serde_uses_requirement_strings() {
    let reqs: Vec<Requirement> =
        serde_yaml::from_str("- tsd-api-client>=3.4.3\n- 'importlib-metadata>=1.4;python_version<\"3.8\"'\n")
            .unwrap();
    assert_eq!(reqs.len(), 2);
    assert!(reqs[1].marker.is_some());
}

#[test]
fn test_invalid_requirements() {
    for input in [
        "",
        ">=1.0",
        "-leading-dash",
        "name[extra",
        "name>=",
        "name @ not-a-url",
        "s3cmd @ https://example.org/x.tar.gz#egg=other-1.0",
        "name @ https://example.org/x.tar.gz trailing",
        "name>=1.0; bogus_var == '1'",
    ] {
        assert!(Requirement::parse(input).is_err(), "expected '{input}' to fail");
    }
}
