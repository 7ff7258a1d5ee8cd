use cognova_hooks::cli::Args;
use cognova_hooks::config::Config;
use serial_test::serial;
use tempfile::TempDir;

const VARS: &[&str] = &[
    "COGNOVA_API_URL",
    "COGNOVA_API_TOKEN",
    "COGNOVA_PROJECT_DIR",
    "CLAUDE_PROJECT_DIR",
    "CLAUDE_SESSION_ID",
    "COGNOVA_MEMORY_LIMIT",
    "DEBUG",
];

fn clear_env() {
    for var in VARS {
        unsafe { std::env::remove_var(var) };
    }
}

fn parse(args: &[&str]) -> Args {
    let mut argv = vec!["cognova-hook"];
    argv.extend_from_slice(args);
    Args::try_parse_from_iter(argv).unwrap()
}

#[test]
#[serial]
fn environment_feeds_the_config() {
    clear_env();
    let install = TempDir::new().unwrap();
    unsafe {
        std::env::set_var("COGNOVA_API_URL", "http://collector:4000/");
        std::env::set_var("COGNOVA_API_TOKEN", " env-token ");
        std::env::set_var("COGNOVA_PROJECT_DIR", install.path());
        std::env::set_var("CLAUDE_PROJECT_DIR", "/work/app");
        std::env::set_var("CLAUDE_SESSION_ID", "sess-env");
        std::env::set_var("COGNOVA_MEMORY_LIMIT", "9");
        std::env::set_var("DEBUG", "1");
    }

    let args = parse(&["session-end"]);
    let config = Config::from_args(&args);
    clear_env();

    assert!(args.debug_enabled());
    assert_eq!(config.credentials.api_base, "http://collector:4000");
    assert_eq!(config.credentials.api_token, "env-token");
    assert_eq!(config.install_dir.as_deref(), Some(install.path()));
    assert_eq!(config.project_dir.as_deref(), Some("/work/app"));
    assert_eq!(config.session_id.as_deref(), Some("sess-env"));
    assert_eq!(config.memory_limit, 9);
}

#[test]
#[serial]
fn token_file_in_install_dir_is_used_without_env_token() {
    clear_env();
    let install = TempDir::new().unwrap();
    std::fs::write(install.path().join(".api-token"), "file-token\n").unwrap();
    unsafe { std::env::set_var("COGNOVA_PROJECT_DIR", install.path()) };

    let config = Config::from_args(&parse(&["session-end"]));
    clear_env();

    assert_eq!(config.credentials.api_token, "file-token");
    assert_eq!(config.credentials.api_base, "http://localhost:3000");
}

#[test]
#[serial]
fn debug_falsy_values_stay_quiet() {
    clear_env();
    for value in ["0", "false", "off", ""] {
        unsafe { std::env::set_var("DEBUG", value) };
        assert!(!parse(&["stop"]).debug_enabled(), "DEBUG={:?}", value);
    }
    clear_env();
    assert!(parse(&["stop", "--debug"]).debug_enabled());
}

#[test]
#[serial]
fn malformed_memory_limit_uses_default() {
    clear_env();
    unsafe { std::env::set_var("COGNOVA_MEMORY_LIMIT", "ten") };

    let args = Args::try_parse_from_iter(["cognova-hook", "session-start"]);
    let config = args.map(|a| Config::from_args(&a));
    clear_env();

    assert_eq!(config.map(|c| c.memory_limit).ok(), Some(5));
}

#[test]
#[serial]
fn blank_values_count_as_unset() {
    clear_env();
    unsafe {
        std::env::set_var("CLAUDE_PROJECT_DIR", "  ");
        std::env::set_var("CLAUDE_SESSION_ID", "");
    }

    let config = Config::from_args(&parse(&["stop"]));
    clear_env();

    assert!(config.project_dir.is_none());
    assert!(config.session_id.is_none());
}
