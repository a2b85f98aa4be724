//! Property-based tests for tag parsing and integration.
//!
//! Uses `proptest` to check the parser and integrator invariants over
//! arbitrary text, keywords and documents.

use proptest::prelude::*;

use ltmm_core::integrator;
use ltmm_core::parser::{self, parse_order, split_keywords};
use ltmm_core::types::render_content;
use ltmm_core::{LtmEntry, Position, TagGrammar, Uid, WorldInfoDocument};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// A keyword: no tag delimiters, non-blank once trimmed.
fn arb_keyword() -> impl Strategy<Value = String> {
    "[A-Za-z가-힣][A-Za-z0-9 가-힣]{0,12}".prop_map(|s| s.trim().to_string())
}

/// A description: free text without pipes, colons or parentheses.
fn arb_description() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ,.]{0,40}".prop_map(|s| s.trim().to_string())
}

fn arb_trailing_garbage() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ,.!?]{0,16}"
}

// ---------------------------------------------------------------------------
// Property: text without a tag start yields nothing
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn no_tag_start_no_entries(text in any::<String>()) {
        prop_assume!(!text.contains("LTM -"));
        prop_assert!(parser::parse(&text).is_empty());
    }
}

// ---------------------------------------------------------------------------
// Property: rendered content is always rebuilt from the fields
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn rendered_content_law(
        main in arb_keyword(),
        desc in arb_description(),
        ts in "[a-z0-9 ]{1,8}",
        order in arb_trailing_garbage(),
        flag in arb_trailing_garbage(),
    ) {
        let text = format!("LTM - {main}: {desc} ({ts}) |k|{flag}|{order}");
        let entries = parser::parse(&text);
        prop_assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        prop_assert_eq!(entry.grammar, TagGrammar::Canonical);
        prop_assert_eq!(&entry.main_keyword, &main);
        prop_assert_eq!(&entry.description, &desc);
        prop_assert_eq!(
            &entry.rendered_content,
            &render_content(&main, &desc, entry.timestamp.as_deref())
        );
        let expected_prefix = format!("LTM - {main}: {desc}");
        prop_assert!(entry.rendered_content.starts_with(&expected_prefix));
    }

    #[test]
    fn legacy_rendered_content_has_no_timestamp(
        main in arb_keyword(),
        desc in arb_description(),
        garbage in arb_trailing_garbage(),
    ) {
        let text = format!("LTM - {main}: {desc} | s | A | k | {garbage}");
        let entries = parser::parse(&text);
        prop_assert_eq!(entries.len(), 1);
        prop_assert_eq!(&entries[0].rendered_content, &format!("LTM - {main}: {desc}"));
    }
}

// ---------------------------------------------------------------------------
// Property: field normalisation
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn keyword_lists_never_contain_blanks(list in "[a-z ,]{0,40}") {
        let keywords = split_keywords(&list);
        for keyword in &keywords {
            prop_assert!(!keyword.is_empty());
            prop_assert_eq!(keyword.trim(), keyword.as_str());
        }
        let expected: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect();
        prop_assert_eq!(keywords, expected);
    }

    #[test]
    fn non_numeric_order_falls_back_to_zero(order in "[a-zA-Z]{1,8}") {
        prop_assert_eq!(parse_order(&order), 0);
    }

    #[test]
    fn numeric_order_is_preserved(order in any::<i32>()) {
        prop_assert_eq!(parse_order(&order.to_string()), i64::from(order));
    }
}

// ---------------------------------------------------------------------------
// Property: integration round trip and UID allocation
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn integrate_round_trip(
        main in arb_keyword(),
        desc in arb_description(),
        constant in any::<bool>(),
        order in -1000i64..1000,
        after in any::<bool>(),
    ) {
        let entry = LtmEntry::new(main, desc, Some("t".into()), TagGrammar::Canonical)
            .with_constant(constant)
            .with_order(order);
        let position = if after { Position::AfterCharacter } else { Position::BeforeCharacter };

        let mut doc = WorldInfoDocument::new();
        let uid = integrator::integrate(&mut doc, &entry, position).expect("integrate");
        let record = doc.get(uid).expect("record");
        prop_assert_eq!(&record.comment, &entry.main_keyword);
        prop_assert_eq!(&record.content, &entry.rendered_content);
        prop_assert_eq!(record.constant, entry.is_constant);
        prop_assert_eq!(record.order, entry.order_value);
        prop_assert_eq!(record.position, position);
    }

    #[test]
    fn new_uid_exceeds_every_existing_uid(
        existing in prop::collection::btree_set(0u64..10_000, 0..20),
    ) {
        let mut doc = WorldInfoDocument::new();
        let template = LtmEntry::new("seed", "", None, TagGrammar::Legacy);
        if let Some(entries) = doc.entries.as_mut() {
            for &uid in &existing {
                entries.insert(
                    Uid(uid),
                    ltmm_core::WorldInfoEntry::from_ltm(Uid(uid), &template, Position::default()),
                );
            }
        }

        let entry = LtmEntry::new("new", "", None, TagGrammar::Legacy);
        let uid = integrator::integrate(&mut doc, &entry, Position::default()).expect("integrate");
        match existing.iter().max() {
            Some(&max) => prop_assert_eq!(uid, Uid(max + 1)),
            None => prop_assert_eq!(uid, Uid(0)),
        }
        prop_assert_eq!(doc.len(), existing.len() + 1);
    }

    #[test]
    fn every_parsed_tag_integrates(count in 1usize..6) {
        let text: String = (0..count)
            .map(|i| format!("LTM - K{i}: d{i} (t{i}) |a,b|1|{i} "))
            .collect();
        let entries = parser::parse(&text);
        prop_assert_eq!(entries.len(), count);

        let mut doc = WorldInfoDocument::new();
        let report = integrator::integrate_batch(&mut doc, &entries, Position::default());
        prop_assert_eq!(report.succeeded, count);
        for (i, created) in report.created.iter().enumerate() {
            prop_assert_eq!(created.uid, Uid(i as u64));
            prop_assert_eq!(&created.keyword, &format!("K{i}"));
        }
    }
}
