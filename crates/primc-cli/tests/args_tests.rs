use clap::Parser;
use primc_cli::args::{CliArgs, OutputFormat};
use std::path::{Path, PathBuf};

#[test]
fn test_parses_defaults() {
    let args = CliArgs::try_parse_from(["primc", "decls.json"]).expect("default args should parse");

    assert_eq!(args.input, PathBuf::from("decls.json"));
    assert!(args.config.is_none());
    assert!(!args.member_biased);
    assert!(!args.no_color_color);
    assert!(!args.sequential);
    assert!(!args.emit_artifacts);
    assert_eq!(args.format, OutputFormat::Text);
    assert!(args.construct.is_none());
    assert!(args.construct_args.is_empty());
}

#[test]
fn test_parses_common_flags() {
    let args = CliArgs::try_parse_from([
        "primc",
        "--config",
        "configs/primc.json",
        "--member-biased",
        "--no-color-color",
        "--sequential",
        "--no-advisory-warnings",
        "--format",
        "json",
        "--emit-artifacts",
        "--no-color",
        "decls.json",
    ])
    .expect("flagged args should parse");

    assert_eq!(args.config.as_deref(), Some(Path::new("configs/primc.json")));
    assert!(args.member_biased);
    assert!(args.no_color_color);
    assert!(args.sequential);
    assert!(args.no_advisory_warnings);
    assert_eq!(args.format, OutputFormat::Json);
    assert!(args.emit_artifacts);
    assert!(args.no_color);
}

#[test]
fn test_construct_arguments_repeat_and_accept_negatives() {
    let args = CliArgs::try_parse_from([
        "primc",
        "decls.json",
        "--construct",
        "Point",
        "--arg",
        "3",
        "--arg",
        "-4",
    ])
    .expect("construct args should parse");

    assert_eq!(args.construct.as_deref(), Some("Point"));
    assert_eq!(args.construct_args, vec![3, -4]);
}

#[test]
fn test_input_is_required() {
    assert!(CliArgs::try_parse_from(["primc"]).is_err());
}

#[test]
fn test_rejects_unknown_format() {
    assert!(CliArgs::try_parse_from(["primc", "--format", "xml", "decls.json"]).is_err());
}
