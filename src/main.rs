use std::process::ExitCode;

fn main() -> ExitCode {
    match saving_plan_days::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
