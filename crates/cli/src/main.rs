use std::process::ExitCode;

fn main() -> ExitCode {
    winloss_cli::run()
}
