mod core;
mod ui;

use relm4::{set_global_css, RelmApp};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use ui::main_window::MainWindow;

const APP_ID: &str = "dev.cellar.Cellar";

#[derive(Debug, PartialEq, Eq)]
enum CliAction {
    RunGui,
    PrintVersion,
    Unknown(String),
}

/// The only recognized flag is --version; anything else is an error.
fn parse_args(args: &[String]) -> CliAction {
    if args.is_empty() {
        return CliAction::RunGui;
    }
    if args.iter().any(|arg| arg == "--version") {
        return CliAction::PrintVersion;
    }
    CliAction::Unknown(args[0].clone())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_args(&args) {
        CliAction::PrintVersion => {
            println!("Cellar {}", ui::about_dialog::version());
            ExitCode::SUCCESS
        }
        CliAction::Unknown(arg) => {
            eprintln!(
                "Error: parameter '{}' not understood (only --version is an accepted parameter)!",
                arg
            );
            ExitCode::FAILURE
        }
        CliAction::RunGui => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("cellar=info")),
                )
                .init();

            let app = RelmApp::new(APP_ID);
            set_global_css(include_str!("ui/style.css"));
            app.run::<MainWindow>(());
            ExitCode::SUCCESS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_starts_the_gui() {
        assert_eq!(parse_args(&[]), CliAction::RunGui);
    }

    #[test]
    fn version_flag_prints_the_version() {
        assert_eq!(
            parse_args(&["--version".to_string()]),
            CliAction::PrintVersion
        );
        // Position does not matter, matching the original behavior
        assert_eq!(
            parse_args(&["--verbose".to_string(), "--version".to_string()]),
            CliAction::PrintVersion
        );
    }

    #[test]
    fn unknown_arguments_are_rejected() {
        assert_eq!(
            parse_args(&["--bogus".to_string()]),
            CliAction::Unknown("--bogus".to_string())
        );
    }
}
