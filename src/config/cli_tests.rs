//! Tests for CLI argument parsing.

use std::path::PathBuf;

use clap::Parser;

use super::cli::{Cli, Command};

mod parsing {
    use super::*;

    #[test]
    fn parse_query_with_params() {
        let cli = Cli::parse_from_iter([
            "sanity",
            "query",
            "*[_type == $type]",
            "--param",
            "type=\"movie\"",
            "--param",
            "limit=10",
        ]);

        match cli.command {
            Command::Query { query, params } => {
                assert_eq!(query, "*[_type == $type]");
                assert_eq!(params, vec!["type=\"movie\"", "limit=10"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_global_options_after_subcommand() {
        let cli = Cli::parse_from_iter([
            "sanity",
            "get",
            "doc-1",
            "--project",
            "abc123",
            "--dataset",
            "staging",
            "--api-version",
            "X",
            "--token",
            "t0k",
            "--tag",
            "cli",
            "--cdn",
        ]);

        assert_eq!(cli.project.as_deref(), Some("abc123"));
        assert_eq!(cli.dataset.as_deref(), Some("staging"));
        assert_eq!(cli.api_version.as_deref(), Some("X"));
        assert_eq!(cli.token.as_deref(), Some("t0k"));
        assert_eq!(cli.tag.as_deref(), Some("cli"));
        assert!(cli.cdn);
    }

    #[test]
    fn parse_multiple_ids() {
        let cli = Cli::parse_from_iter(["sanity", "get", "a", "b", "c"]);

        match cli.command {
            Command::Get { ids } => assert_eq!(ids, vec!["a", "b", "c"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_headers() {
        let cli = Cli::parse_from_iter([
            "sanity",
            "--header",
            "X-Api-Key=secret",
            "--header",
            "X-Other: value",
            "query",
            "*",
        ]);

        assert_eq!(cli.headers, vec!["X-Api-Key=secret", "X-Other: value"]);
    }

    #[test]
    fn parse_sign_options() {
        let cli = Cli::parse_from_iter([
            "sanity",
            "sign",
            "--secret",
            "s3cret",
            "--timestamp",
            "1633519811129",
            "--body-file",
            "payload.json",
        ]);

        match cli.command {
            Command::Sign {
                secret,
                timestamp,
                body_file,
            } => {
                assert_eq!(secret.as_deref(), Some("s3cret"));
                assert_eq!(timestamp, Some(1_633_519_811_129));
                assert_eq!(body_file, Some(PathBuf::from("payload.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_verify_requires_signature() {
        let result = Cli::try_parse_from(["sanity", "verify", "--secret", "s"]);

        assert!(result.is_err());
    }

    #[test]
    fn parse_get_requires_ids() {
        let result = Cli::try_parse_from(["sanity", "get"]);

        assert!(result.is_err());
    }

    #[test]
    fn parse_config_and_verbose() {
        let cli = Cli::parse_from_iter(["sanity", "-c", "my.toml", "-v", "query", "*"]);

        assert_eq!(cli.config, Some(PathBuf::from("my.toml")));
        assert!(cli.verbose);
    }
}

mod init {
    use super::*;

    #[test]
    fn is_init_detects_subcommand() {
        let cli = Cli::parse_from_iter(["sanity", "init"]);

        assert!(cli.is_init());
    }

    #[test]
    fn init_with_output() {
        let cli = Cli::parse_from_iter(["sanity", "init", "--output", "out.toml"]);

        match cli.command {
            Command::Init { output } => assert_eq!(output, Some(PathBuf::from("out.toml"))),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn query_is_not_init() {
        let cli = Cli::parse_from_iter(["sanity", "query", "*"]);

        assert!(!cli.is_init());
    }
}
