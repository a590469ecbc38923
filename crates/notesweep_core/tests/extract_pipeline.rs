use notesweep_core::{extract_tasks, ExtractionMode, ScanContext, SectionTag};

fn tags() -> Vec<SectionTag> {
    vec![
        SectionTag::parse("#work").unwrap(),
        SectionTag::parse("#personal").unwrap(),
    ]
}

#[test]
fn hashtag_scoped_extraction_over_mixed_sections() {
    // "#Tasks" title echoes and repeated title-tag lines are not tasks.
    let tags = tags();
    let ctx = ScanContext {
        title: "#Tasks",
        section_tags: &tags,
    };
    let body = "#Tasks\n#work\n- buy milk\n#personal\n* read book\n#Tasks";

    let tasks = extract_tasks(body, &ctx, ExtractionMode::HashtagScopedBullets, None);
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].text, "buy milk");
    assert_eq!(tasks[0].section.as_ref().unwrap().as_str(), "#work");
    assert_eq!(tasks[1].text, "read book");
    assert_eq!(tasks[1].section.as_ref().unwrap().as_str(), "#personal");
}

#[test]
fn flat_extraction_excludes_title_echo_comment_blank_and_sentinel() {
    let tags = tags();
    let ctx = ScanContext {
        title: "Groceries",
        section_tags: &tags,
    };
    let body = "Groceries\n// note to self\n\n\u{FFFC}";

    let tasks = extract_tasks(body, &ctx, ExtractionMode::FlatNonEmptyLine, None);
    assert!(tasks.is_empty());
}

#[test]
fn documents_without_markers_yield_no_scoped_tasks() {
    let tags = tags();
    let ctx = ScanContext {
        title: "Inbox",
        section_tags: &tags,
    };
    for body in ["", "- bullet\n* bullet\n1. bullet", "plain\ntext\nonly"] {
        let tasks = extract_tasks(body, &ctx, ExtractionMode::HashtagScopedBullets, None);
        assert!(tasks.is_empty(), "body {body:?} should yield nothing");
    }
}

#[test]
fn every_scoped_bullet_maps_to_nearest_preceding_marker() {
    let tags = tags();
    let ctx = ScanContext {
        title: "#Tasks",
        section_tags: &tags,
    };
    let body = "#work\n- a\n- b\n#personal\n- c\n#work\n- d";

    let tasks = extract_tasks(body, &ctx, ExtractionMode::HashtagScopedBullets, None);
    let pairs: Vec<(&str, &str)> = tasks
        .iter()
        .map(|task| (task.text.as_str(), task.section.as_ref().unwrap().as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("a", "#work"),
            ("b", "#work"),
            ("c", "#personal"),
            ("d", "#work"),
        ]
    );
}

#[test]
fn extracted_text_is_always_non_empty_after_trim() {
    let tags = tags();
    let ctx = ScanContext {
        title: "#Tasks",
        section_tags: &tags,
    };
    let body = "#work\n-   \n- \t\n- real";

    for mode in [
        ExtractionMode::HashtagScopedBullets,
        ExtractionMode::FlatNonEmptyLine,
    ] {
        let tasks = extract_tasks(body, &ctx, mode, None);
        assert!(tasks.iter().all(|task| !task.text.trim().is_empty()));
    }
}
