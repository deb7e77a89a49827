use crate::version::{REPO_URL, Release, VERSION, is_newer, print_update_notice, print_version};

#[test]
fn newer_versions_compare_numerically() {
    assert!(is_newer("0.6.2", "v0.6.3"));
    assert!(is_newer("v0.9.0", "0.10.0"));
    assert!(is_newer("1.2", "1.2.1"));
    assert!(is_newer("0.6.2", "v1.0.0-rc1"));
    assert!(!is_newer("0.6.3", "v0.6.3"));
    assert!(!is_newer("0.6.3+build7", "0.6.3"));
    assert!(!is_newer("1.0.0", "0.99.99"));
    assert!(!is_newer("dev", "v1.0.0"));
    assert!(!is_newer("1.0.0", "latest"));
}

#[test]
fn version_lines_name_the_source() {
    let mut out: Vec<u8> = Vec::new();
    print_version(&mut out).expect("print");
    let text = String::from_utf8(out).expect("utf8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], format!("version: {VERSION}"));
    assert!(lines[1].starts_with(" commit: "));
    assert_eq!(lines[3], format!(" source: {REPO_URL}"));
}

#[test]
fn update_notice_shows_release_day() {
    let release = Release {
        tag_name: "v9.9.9".to_string(),
        published_at: Some("2026-01-02T03:04:05Z".to_string()),
    };
    let mut out: Vec<u8> = Vec::new();
    print_update_notice(&mut out, &release).expect("print");
    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("version v9.9.9 is the latest, released on 2026-01-02"));
    assert!(text.contains(&format!("{REPO_URL}/releases/tag/v9.9.9")));
}
