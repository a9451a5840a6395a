use std::process::ExitCode;

fn main() -> ExitCode {
    resub_cli::run()
}
