//! tacl_auth - runs the TSD API client with the given arguments

use std::process::ExitCode;

use tsd_s3cmd::EntryPoint;
use tsd_s3cmd::dispatch;

fn main() -> ExitCode {
    dispatch::run(EntryPoint::TaclAuth)
}
