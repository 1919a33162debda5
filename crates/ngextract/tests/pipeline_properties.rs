//! Property-based tests for naming and declaration rewiring.

use ngextract::app::naming::{self, NamingOptions, SuffixPolicy};
use ngextract::app::rewrite::{self, ListEdit, RewriteOutcome};
use ngextract::app::scanner::BlockScan;
use ngextract::domain::model::Identifier;
use proptest::prelude::*;

/// Lowercase kebab-case identifiers such as `foo`, `main-menu`, `a1-b2-c3`.
fn kebab_identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,6}(-[a-z][a-z0-9]{0,6}){0,3}"
}

/// Text that never contains the component marker.
fn surrounding_text() -> impl Strategy<Value = String> {
    "[a-z ;=\n]{0,40}"
}

fn any_scan() -> impl Strategy<Value = BlockScan> {
    prop_oneof![Just(BlockScan::FirstClose), Just(BlockScan::Balanced)]
}

fn rewritten_source(outcome: RewriteOutcome) -> String {
    match outcome {
        RewriteOutcome::Rewritten { source, .. } => source,
        other => panic!("expected a rewrite, got {other:?}"),
    }
}

proptest! {
    #[test]
    fn derived_names_follow_conventions(raw in kebab_identifier()) {
        let identifier = Identifier::parse(&raw).unwrap();
        let names = naming::derive(&identifier, &NamingOptions::default());

        prop_assert_eq!(&names.symbolic_name, &format!("{}Component", naming::pascal_case(&raw)));
        prop_assert!(!names.symbolic_name.contains('-'));
        prop_assert!(names.symbolic_name.starts_with(|ch: char| ch.is_ascii_uppercase()));
        prop_assert_eq!(&names.selector, &format!("app-{raw}"));
        prop_assert_eq!(&names.file_base_name, &format!("{raw}.component"));
        prop_assert_eq!(&names.reference_tag, &format!("<app-{raw}></app-{raw}>"));
        prop_assert_eq!(naming::module_path(&names), format!("./{raw}.component"));
    }

    #[test]
    fn if_missing_policy_never_doubles_the_suffix(raw in kebab_identifier()) {
        let options = NamingOptions {
            policy: SuffixPolicy::IfMissing,
            ..NamingOptions::default()
        };
        let with_suffix = format!("{raw}-component");
        let names = naming::derive(&Identifier::parse(&with_suffix).unwrap(), &options);
        prop_assert!(names.symbolic_name.ends_with("Component"));
        prop_assert!(!names.symbolic_name.ends_with("ComponentComponent"));
    }

    #[test]
    fn bytes_outside_the_block_are_preserved(
        prefix in surrounding_text(),
        suffix in surrounding_text(),
        scan in any_scan(),
    ) {
        let block = "@Component({\n  selector: 'app-x'\n})";
        let source = format!("{prefix}{block}{suffix}");
        let out = rewritten_source(rewrite::rewrite(&source, "NewComponent", "./new.component", scan));

        let import = rewrite::import_statement("NewComponent", "./new.component", "\n");
        let expected_start = format!("{import}{prefix}@Component({{");
        let expected_end = format!("}}){suffix}");
        prop_assert!(out.starts_with(&expected_start));
        prop_assert!(out.ends_with(&expected_end));
        prop_assert_eq!(out.matches("imports: [NewComponent]").count(), 1);
    }

    #[test]
    fn inserted_list_is_found_again(raw in kebab_identifier(), scan in any_scan()) {
        let names = naming::derive(&Identifier::parse(&raw).unwrap(), &NamingOptions::default());
        let source = "@Component({\n  selector: 'app-host',\n  template: '<p></p>'\n})\nexport class HostComponent {}\n";
        let out = rewritten_source(rewrite::rewrite(
            source,
            &names.symbolic_name,
            &naming::module_path(&names),
            scan,
        ));

        let found = scan.scan(&out).expect("block still present");
        let list = found.list.expect("imports list inserted");
        prop_assert_eq!(list.entries(&out), vec![names.symbolic_name.as_str()]);
    }

    #[test]
    fn rewiring_twice_adds_a_second_entry(scan in any_scan()) {
        let source = "@Component({\n  imports: [Other]\n})";
        let once = rewritten_source(rewrite::rewrite(source, "N", "./n", scan));
        let outcome = rewrite::rewrite(&once, "N", "./n", scan);
        match &outcome {
            RewriteOutcome::Rewritten { edit, .. } => {
                prop_assert_eq!(*edit, ListEdit::Prepended { existing_entries: 2 });
            }
            other => prop_assert!(false, "unexpected {:?}", other),
        }
        prop_assert!(rewritten_source(outcome).contains("imports: [N,N,Other]"));
    }

    #[test]
    fn scan_strategies_agree_on_flat_blocks(
        selector in "[a-z]{1,8}",
        prefix in surrounding_text(),
    ) {
        let source = format!("{prefix}@Component({{ selector: '{selector}', imports: [A] }})\nclass X {{}}");
        let first = BlockScan::FirstClose.scan(&source);
        let balanced = BlockScan::Balanced.scan(&source);
        prop_assert!(first.is_some());
        prop_assert_eq!(first, balanced);
    }
}

#[test]
fn foo_bar_scenario() {
    let names = naming::derive(&Identifier::parse("foo-bar").unwrap(), &NamingOptions::default());
    assert_eq!(names.symbolic_name, "FooBarComponent");
    assert_eq!(names.selector, "app-foo-bar");
    assert_eq!(names.file_base_name, "foo-bar.component");
    assert_eq!(names.reference_tag, "<app-foo-bar></app-foo-bar>");
}

#[test]
fn existing_list_scenario() {
    let source = "@Component({\n  selector: 'app-host',\n  imports: [Other]\n})\nexport class HostComponent {}";
    let out = rewritten_source(rewrite::rewrite(
        source,
        "FooBarComponent",
        "./foo-bar.component",
        BlockScan::FirstClose,
    ));
    assert!(out.starts_with("import { FooBarComponent } from './foo-bar.component';\n"));
    assert!(out.contains("imports: [FooBarComponent,Other]"));
}

#[test]
fn no_marker_scenario() {
    let source = "export class Plain {}\n";
    let outcome = rewrite::rewrite(source, "FooBarComponent", "./foo-bar.component", BlockScan::Balanced);
    assert_eq!(
        outcome,
        RewriteOutcome::BlockNotFound {
            source_with_import: format!(
                "import {{ FooBarComponent }} from './foo-bar.component';\n{source}"
            ),
        }
    );
}
