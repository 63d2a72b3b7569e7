use std::process::ExitCode;

fn main() -> ExitCode {
    hybrid_triage_lib::run()
}
