// src/bin/litr.rs

use std::env;
use std::process::ExitCode;

use colored::Colorize;
use litr::cli::Application;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();

    match Application::run(&args) {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("{} {err:#}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
