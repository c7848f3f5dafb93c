//! Tests for fetch and probe subcommands.

use super::parse;
use crate::cli::CliCommand;
use clap::Parser;

#[test]
fn cli_parse_fetch_defaults() {
    match parse(&["mfetch", "fetch", "https://rr3---sn-x.googlevideo.com/videoplayback"]) {
        CliCommand::Fetch {
            url,
            workers,
            dir,
            verify,
        } => {
            assert_eq!(url, "https://rr3---sn-x.googlevideo.com/videoplayback");
            assert!(workers.is_none());
            assert!(dir.is_none());
            assert!(!verify);
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_parse_fetch_options() {
    match parse(&[
        "mfetch",
        "fetch",
        "https://example.com/x",
        "--workers",
        "8",
        "--dir",
        "/tmp",
        "--verify",
    ]) {
        CliCommand::Fetch {
            url,
            workers,
            dir,
            verify,
        } => {
            assert_eq!(url, "https://example.com/x");
            assert_eq!(workers, Some(8));
            assert_eq!(dir.as_deref(), Some(std::path::Path::new("/tmp")));
            assert!(verify);
        }
        _ => panic!("expected Fetch with options"),
    }
}

#[test]
fn cli_parse_fetch_short_workers() {
    match parse(&["mfetch", "fetch", "https://example.com/x", "-w", "2"]) {
        CliCommand::Fetch { workers, .. } => assert_eq!(workers, Some(2)),
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_fetch_requires_url() {
    assert!(crate::cli::Cli::try_parse_from(["mfetch", "fetch"]).is_err());
}

#[test]
fn cli_parse_probe() {
    match parse(&["mfetch", "probe", "https://rr1---sn-x.googlevideo.com/v"]) {
        CliCommand::Probe { url } => assert_eq!(url, "https://rr1---sn-x.googlevideo.com/v"),
        _ => panic!("expected Probe"),
    }
}
