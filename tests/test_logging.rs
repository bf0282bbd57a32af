//! Tests for logging configuration and format parsing
//!
//! Covers the pure parsing helpers and that installing a subscriber twice is harmless.

use agent_router::observability::{init_logging, parse_level, LogFormat};
use agent_router::{route_span, selection_span};
use tracing::Level;

#[test]
fn test_log_format_parse_is_case_insensitive() {
    assert_eq!(LogFormat::parse("json"), LogFormat::Json);
    assert_eq!(LogFormat::parse("Pretty"), LogFormat::Pretty);
    assert_eq!(LogFormat::parse("COMPACT"), LogFormat::Compact);
}

#[test]
fn test_log_format_parse_invalid_defaults_to_json() {
    for raw in ["", "xml", "yaml", "123", "jsonl"] {
        assert_eq!(LogFormat::parse(raw), LogFormat::Json, "{raw:?}");
    }
}

#[test]
fn test_log_format_parse_whitespace() {
    assert_eq!(LogFormat::parse("  pretty  "), LogFormat::Pretty);
    assert_eq!(LogFormat::parse("compact\n"), LogFormat::Compact);
    assert_eq!(LogFormat::parse("\tjson"), LogFormat::Json);
}

#[test]
fn test_log_level_parsing() {
    assert_eq!(parse_level("error"), Level::ERROR);
    assert_eq!(parse_level("WARN"), Level::WARN);
    assert_eq!(parse_level("Debug"), Level::DEBUG);
    assert_eq!(parse_level(" trace "), Level::TRACE);
    assert_eq!(parse_level("INFO"), Level::INFO);
    assert_eq!(parse_level("verbose"), Level::INFO);
}

#[test]
fn test_init_logging_twice_does_not_panic() {
    init_logging(Level::DEBUG, LogFormat::Compact, false);
    init_logging(Level::INFO, LogFormat::Json, true);

    let route = route_span!(router = "router", hops = 1);
    let _entered = route.enter();
    let selection = selection_span!(provider = "mock", model = "test-model");
    let _selection = selection.enter();
    tracing::info!("logging still works after a second init");
}
