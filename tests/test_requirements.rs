//! Requirement evaluation against routing contexts

mod test_helpers;

use agent_router::context::{
    requirement_met, requirements_met, Condition, ContextMap, ContextValue, Requirement,
    RoutingContext,
};
use serde::Deserialize;
use test_helpers::context_map;

fn project() -> ContextMap {
    let mut context = context_map(&[
        ("languages", &["rust", "typescript"]),
        ("stories", &["login", "signup", "search"]),
    ]);
    context.insert("version".to_string(), ContextValue::from("v12"));
    context.insert("deployed".to_string(), ContextValue::from(false));
    context.insert("reviewer".to_string(), ContextValue::Absent);
    context
}

#[test]
fn test_presence_and_absence() {
    let context = project();

    assert!(requirement_met(&context, &Requirement::present("languages")));
    assert!(!requirement_met(&context, &Requirement::present("reviewer")));
    assert!(!requirement_met(&context, &Requirement::present("budget")));

    let absent = |name: &str| Requirement::with_condition(name, Condition::Absent);
    assert!(requirement_met(&context, &absent("budget")));
    assert!(requirement_met(&context, &absent("reviewer")));
    assert!(!requirement_met(&context, &absent("languages")));
}

#[test]
fn test_minimum_length() {
    let context = project();

    assert!(requirement_met(&context, &Requirement::parse("stories:3")));
    assert!(!requirement_met(&context, &Requirement::parse("stories:4")));
    assert!(requirement_met(&context, &Requirement::parse("version:3")));
    // Booleans have no length
    assert!(!requirement_met(&context, &Requirement::parse("deployed:0")));
}

#[test]
fn test_membership_conditions() {
    let context = project();

    assert!(requirement_met(&context, &Requirement::parse("languages:rust")));
    assert!(!requirement_met(&context, &Requirement::parse("languages:cobol")));
    assert!(requirement_met(&context, &Requirement::parse("languages:!cobol")));
    assert!(!requirement_met(&context, &Requirement::parse("languages:!rust")));
    // Exclusion only applies to sequences
    assert!(!requirement_met(&context, &Requirement::parse("version:!v1")));
}

#[test]
fn test_pattern_conditions() {
    let context = project();

    assert!(requirement_met(&context, &Requirement::parse(r"version:/^v\d+$/")));
    assert!(!requirement_met(&context, &Requirement::parse(r"version:/^release/")));
    // Invalid patterns never match
    assert!(!requirement_met(&context, &Requirement::parse("version:/([/")));
}

#[test]
fn test_other_shapes_fall_back_to_truthiness() {
    let context = project();

    assert!(!requirement_met(&context, &Requirement::parse("deployed:yes")));
    assert!(requirement_met(&context, &Requirement::parse("version:anything")));
}

#[test]
fn test_requirements_are_conjunctive() {
    let context = RoutingContext::from(project());

    assert!(context.satisfies(&[]));
    assert!(context.satisfies(&[
        Requirement::parse("languages:rust"),
        Requirement::parse("stories:2"),
    ]));
    assert!(!context.satisfies(&[
        Requirement::parse("languages:rust"),
        Requirement::parse("stories:10"),
    ]));
    assert!(requirements_met(&ContextMap::new(), &[Requirement::parse("x:undefined")]));
}

#[derive(Deserialize)]
struct Step {
    requires: Vec<Requirement>,
}

#[test]
fn test_requirements_decode_from_toml() {
    let step: Step = toml::from_str(
        r#"
requires = [
    { name = "stories", condition = 2 },
    { name = "languages", condition = "!cobol" },
    { name = "reviewer", condition = "undefined" },
    { name = "version", condition = "/^v/" },
    { name = "project_name" },
]
"#,
    )
    .unwrap();

    assert_eq!(
        step.requires,
        vec![
            Requirement::with_condition("stories", Condition::MinLength(2)),
            Requirement::with_condition("languages", Condition::Excludes("cobol".to_string())),
            Requirement::with_condition("reviewer", Condition::Absent),
            Requirement::with_condition("version", Condition::Pattern("^v".to_string())),
            Requirement::present("project_name"),
        ]
    );

    let mut context = project();
    assert!(!requirements_met(&context, &step.requires));
    context.insert("project_name".to_string(), ContextValue::from("router"));
    assert!(requirements_met(&context, &step.requires));
}
