use std::io::Write;

use cognova_hooks::cli::{Args, HookCommand, ParseFailure};
use cognova_hooks::config::Config;
use cognova_hooks::dispatch::Dispatcher;
use cognova_hooks::logging;
use cognova_hooks::models::HookInput;
use cognova_hooks::utils::read_stdin;

fn main() {
    let args = match Args::try_parse_from_env() {
        Ok(args) => args,
        Err(ParseFailure::Display(text)) => {
            print!("{}", text);
            std::process::exit(0);
        }
        // Exit 1, not clap's 2: the host reads 2 as "block this action"
        Err(ParseFailure::Usage(text)) => {
            eprint!("{}", text);
            std::process::exit(1);
        }
    };

    logging::init(args.debug_enabled());
    let config = Config::from_args(&args);
    let code = run(&args.command, &config);

    let _ = std::io::stdout().flush();
    std::process::exit(code);
}

fn run(command: &HookCommand, config: &Config) -> i32 {
    let dispatcher = Dispatcher::new(config);
    let stdin = || {
        read_stdin().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "treating hook input as empty");
            Vec::new()
        })
    };

    let token_state = if config.credentials.has_token() {
        "set"
    } else {
        "NOT SET"
    };
    tracing::debug!(
        ?command,
        api_base = %config.credentials.api_base,
        token = token_state,
        "hook invoked"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match command {
        HookCommand::SessionStart => {
            dispatcher.session_start(&HookInput::from_slice(&stdin()), &mut out)
        }
        HookCommand::SessionEnd => dispatcher.session_end(&HookInput::from_slice(&stdin())),
        HookCommand::PreCompact => dispatcher.pre_compact(&HookInput::from_slice(&stdin())),
        HookCommand::Stop => dispatcher.stop(&HookInput::from_slice(&stdin())),
        HookCommand::LogEvent {
            event_type,
            matcher,
            command,
        } => {
            let raw = stdin();
            let stderr = std::io::stderr();
            let mut err = stderr.lock();
            dispatcher.log_event(
                event_type,
                matcher.as_deref(),
                command,
                &raw,
                &mut out,
                &mut err,
            )
        }
        HookCommand::Extract { transcript_path } => match transcript_path {
            Some(path) => dispatcher.extract(Some(path.as_str()), &[]),
            None => dispatcher.extract(None, &stdin()),
        },
    }
}
