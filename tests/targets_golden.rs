use icon_debug_patcher::targets::{icon_grid, objection_accordion, outcome_icons, Target};
use icon_debug_patcher::{patch_content, patch_file, PatchOptions, PatchOutcome, RuleStatus};
use proptest::prelude::*;
use std::fs;

fn load_fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|err| panic!("failed to load fixture {name}: {err}"))
}

fn statuses(target: &Target, content: &mut String) -> Vec<RuleStatus> {
    patch_content(target, content)
        .expect("rules apply")
        .into_iter()
        .map(|r| r.status)
        .collect()
}

fn assert_golden(target: Target, fixture: &str) {
    let input = load_fixture(&format!("{fixture}.input"));
    let expected = load_fixture(&format!("{fixture}.expected"));

    let mut content = input.clone();
    assert_eq!(
        statuses(&target, &mut content),
        [RuleStatus::Applied, RuleStatus::Applied]
    );
    assert_eq!(content, expected);

    // Second application finds no anchors and leaves the text alone
    let mut again = content.clone();
    assert_eq!(
        statuses(&target, &mut again),
        [RuleStatus::AlreadyApplied, RuleStatus::AlreadyApplied]
    );
    assert_eq!(again, expected);
}

#[test]
fn icon_grid_fixture() {
    assert_golden(icon_grid().unwrap(), "IconGrid.tsx");
}

#[test]
fn objection_accordion_fixture() {
    assert_golden(objection_accordion().unwrap(), "ObjectionAccordion.tsx");
}

#[test]
fn outcome_icons_fixture() {
    assert_golden(outcome_icons().unwrap(), "OutcomeIcons.tsx");
}

#[test]
fn crlf_sources_patch_like_lf_sources() {
    let cases = [
        (icon_grid().unwrap(), "IconGrid.tsx"),
        (objection_accordion().unwrap(), "ObjectionAccordion.tsx"),
        (outcome_icons().unwrap(), "OutcomeIcons.tsx"),
    ];

    for (target, fixture) in cases {
        let input = load_fixture(&format!("{fixture}.input")).replace('\n', "\r\n");
        let expected = load_fixture(&format!("{fixture}.expected")).replace('\n', "\r\n");

        let mut content = input;
        assert_eq!(
            statuses(&target, &mut content),
            [RuleStatus::Applied, RuleStatus::Applied],
            "{fixture}"
        );
        assert_eq!(content, expected, "{fixture}");
        assert!(
            !content.replace("\r\n", "").contains('\n'),
            "{fixture} has bare LF lines"
        );

        assert_eq!(
            statuses(&target, &mut content),
            [RuleStatus::AlreadyApplied, RuleStatus::AlreadyApplied],
            "{fixture}"
        );
        assert_eq!(content, expected, "{fixture}");
    }
}

#[test]
fn anchor_insertion_keeps_surrounding_bytes() {
    let input = load_fixture("IconGrid.tsx.input");
    let target = icon_grid().unwrap();

    // Only the anchor rule
    let mut content = input.clone();
    assert_eq!(target.rules[0].apply(&mut content).unwrap(), RuleStatus::Applied);

    let split = input.find("\n\n  return titleList.map").unwrap() + 1;
    let (head, tail) = input.split_at(split);
    assert!(content.starts_with(head));
    assert!(content.ends_with(tail));

    let inserted = &content[head.len()..content.len() - tail.len()];
    assert!(inserted.starts_with("  if (process.env.NEXT_PUBLIC_DEBUG_ICON_SELECTION === 'true') {\n"));
    assert_eq!(inserted.matches("console.log").count(), 1);
}

#[test]
fn patch_file_writes_fixture_in_place() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("ObjectionAccordion.tsx");
    fs::write(&path, load_fixture("ObjectionAccordion.tsx.input")).unwrap();

    let outcome =
        patch_file(&objection_accordion().unwrap(), &path, &PatchOptions::default()).unwrap();

    let PatchOutcome::Patched(report) = outcome else {
        panic!("expected a patch report");
    };
    assert!(report.written);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        load_fixture("ObjectionAccordion.tsx.expected")
    );
}

#[test]
fn fixture_for_one_target_is_noop_for_another() {
    let input = load_fixture("OutcomeIcons.tsx.input");
    let mut content = input.clone();

    assert_eq!(
        statuses(&icon_grid().unwrap(), &mut content),
        [RuleStatus::NotFound, RuleStatus::NotFound]
    );
    assert_eq!(content, input);
}

proptest! {
    #[test]
    fn text_without_anchors_is_untouched(body in "[a-z =;(){}\\n]{0,200}") {
        for target in [icon_grid().unwrap(), objection_accordion().unwrap(), outcome_icons().unwrap()] {
            let mut content = body.clone();
            let result = statuses(&target, &mut content);
            prop_assert!(result.iter().all(|s| *s == RuleStatus::NotFound));
            prop_assert_eq!(&content, &body);
        }
    }
}
