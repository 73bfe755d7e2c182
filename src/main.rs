//! Flash a firmware image onto a device through its serial bootloader.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use fwflash::{connect, open, Firmware, Options, Updater, DEFAULT_BAUD_RATE, DEFAULT_PORT};
use log::info;
// Only used by the library.
use {crc as _, heapless as _, serialport as _};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    #[arg(index = 1, help = "Path to the signed firmware image")]
    firmware: PathBuf,
    #[arg(short, long, env = "FWFLASH_PORT", default_value = DEFAULT_PORT, help = "Serial port the bootloader is attached to")]
    port: String,
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE, help = "Baud rate of the serial port")]
    baud_rate: u32,
    #[arg(long, default_value_t = 5000, help = "Time to wait for each bootloader response in milliseconds")]
    timeout: u64,
    #[arg(long, default_value_t = 500, help = "Interval between sync sequences in milliseconds")]
    sync_delay: u64,
    #[arg(long, default_value_t = 3000, help = "Time to wait for the flash to be erased in milliseconds")]
    erase_delay: u64,
}

impl Args {
    fn options(&self) -> Options {
        Options::default()
            .with_sync_delay(Duration::from_millis(self.sync_delay))
            .with_sync_timeout(Duration::from_millis(self.timeout))
            .with_response_timeout(Duration::from_millis(self.timeout))
            .with_erase_delay(Duration::from_millis(self.erase_delay))
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Args::try_parse() {
        Ok(args) => exit_code(run(&args)),
        Err(error) => usage(&error),
    }
}

/// Prints the usage or help text.
///
/// Only `--help` and `--version` exit successfully.
fn usage(error: &clap::Error) -> ExitCode {
    let _ = error.print();

    if error.use_stderr() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn exit_code(result: fwflash::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> fwflash::Result<()> {
    let firmware = Firmware::read(&args.firmware)?;
    firmware.validate()?;
    info!("Read firmware image ({} bytes).", firmware.len());

    let serial_port = open(&args.port, args.baud_rate)?;
    info!("Opened {} at {} baud.", args.port, args.baud_rate);
    let (transport, listener) = connect(serial_port)?;

    let mut updater = Updater::new(transport, args.options());
    updater.on_progress(|progress| {
        info!("Progress: {:.1} %", progress.percent());
    });
    let result = updater.run(&firmware);
    listener.terminate();
    result
}

#[cfg(test)]
mod tests {
    use std::process::ExitCode;
    use std::time::Duration;

    use clap::Parser;
    use fwflash::Error;

    use super::{exit_code, run, usage, Args};

    #[test]
    fn test_missing_firmware_argument() {
        let error = Args::try_parse_from(["fwflash"]).expect_err("Firmware path is required.");
        assert_eq!(usage(&error), ExitCode::FAILURE);
    }

    #[test]
    fn test_help_succeeds() {
        let error = Args::try_parse_from(["fwflash", "--help"]).expect_err("Help is not a run.");
        assert_eq!(usage(&error), ExitCode::SUCCESS);
    }

    #[test]
    fn test_options() {
        let args = Args::try_parse_from([
            "fwflash",
            "image.bin",
            "--timeout",
            "100",
            "--sync-delay",
            "10",
            "--erase-delay",
            "0",
        ])
        .expect("Arguments should parse.");
        let options = args.options();
        assert_eq!(options.sync_delay, Duration::from_millis(10));
        assert_eq!(options.sync_timeout, Duration::from_millis(100));
        assert_eq!(options.response_timeout, Duration::from_millis(100));
        assert_eq!(options.erase_delay, Duration::ZERO);
        assert_eq!(args.baud_rate, 115_200);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(Ok(())), ExitCode::SUCCESS);
        assert_eq!(exit_code(Err(Error::Nack)), ExitCode::FAILURE);
        assert_eq!(
            exit_code(Err(Error::Timeout(Duration::from_millis(5000)))),
            ExitCode::FAILURE
        );
    }

    #[test]
    fn test_unreadable_firmware_fails_before_opening_port() {
        let args = Args::try_parse_from(["fwflash", "/nonexistent/fwflash/image.bin"])
            .expect("Arguments should parse.");
        let result = run(&args);
        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(exit_code(result), ExitCode::FAILURE);
    }
}
