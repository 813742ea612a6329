use std::process::ExitCode;

use anyhow::Result;
use env_logger::Env;
use log::{debug, error};

use crate::cli::{Cli, Command};
use crate::command::VerifyReport;
use crate::config::Config;

mod cli;
mod command;
mod config;
mod input;

fn main() -> Result<ExitCode> {
    env_logger::init_from_env(Env::default().default_filter_or("error"));

    let cli = Cli::parse();
    let mut config = Config::load_or_default(&cli.config)?;
    if let Some(segment_size) = cli.segment_size {
        config.segment_size = segment_size;
    }
    debug!("Using config: {config:?}");

    match cli.command {
        Command::Sum {
            file,
            offset,
            size,
            initial,
        } => {
            let buffer = input::load(&file, config.format, config.segment_size)?;
            let report = command::sum(&buffer, offset, size, initial);
            println!("sum:      0x{:04x}", report.sum);
            println!("checksum: 0x{:04x}", report.checksum);
            Ok(ExitCode::SUCCESS)
        }
        Command::Icmp { file } => {
            let buffer = input::load(&file, config.format, config.segment_size)?;
            Ok(print_verify_report(&command::icmp(&buffer)?))
        }
        Command::Icmpv6 { file, src, dst } => {
            let buffer = input::load(&file, config.format, config.segment_size)?;
            Ok(print_verify_report(&command::icmpv6(&buffer, src, dst)?))
        }
    }
}

fn print_verify_report(report: &VerifyReport) -> ExitCode {
    println!("stored:   0x{:04x}", report.stored);
    println!("computed: 0x{:04x}", report.computed);
    if report.valid {
        println!("checksum OK");
        ExitCode::SUCCESS
    } else {
        error!("Checksum verification failed");
        println!("checksum MISMATCH");
        ExitCode::FAILURE
    }
}
