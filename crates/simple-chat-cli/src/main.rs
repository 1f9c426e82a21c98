// simple-chat: interactive terminal client for chat completions
// Flag parsing, config loading, and error reporting around a Session

mod cli;
mod console;

use cli::Cli;
use console::StdTerminal;
use simple_chat_core::color::ansi;
use simple_chat_core::{Error, OpenAiClient, Palette, ResolvedConfig, Session};
use std::process::ExitCode;

/// Print a fatal error the way the user expects to see it.
fn report_fatal(err: &Error, palette: Option<&Palette>) {
    let red = |text: &str| match palette {
        Some(palette) => palette.error(text),
        None => ansi::paint(text, ansi::RED),
    };
    match err {
        Error::Collaborator(detail) => {
            println!("\n   Something went wrong: {}\n", red(detail));
        }
        _ => println!("{}: {}", red(err.tag()), err),
    }
}

async fn run(cli: Cli) -> Result<(), (Error, Option<Palette>)> {
    let config =
        ResolvedConfig::load(cli.config.as_deref(), cli.key.clone()).map_err(|e| (e, None))?;
    let palette = config.palette.clone();
    let fail = |e: Error| (e, Some(palette.clone()));

    let client = OpenAiClient::new(config.api_settings());
    let mut session = Session::new(config, client, StdTerminal::new()).map_err(fail)?;

    session.print_banner().map_err(fail)?;
    if let Some(path) = &cli.chat {
        session.start_with_chat(path).map_err(fail)?;
    }
    if let Some(path) = &cli.prompt {
        session.start_with_prompt(path).map_err(fail)?;
    }
    session.run().await.map_err(fail)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = match Cli::parse_from_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err((err, palette)) => {
            log::debug!("exiting after error: {:?}", err);
            report_fatal(&err, palette.as_ref());
            ExitCode::FAILURE
        }
    }
}
