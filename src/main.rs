//! tsd-s3cmd - runs the pinned s3cmd fork with the given arguments

use std::process::ExitCode;

use tsd_s3cmd::EntryPoint;
use tsd_s3cmd::dispatch;

fn main() -> ExitCode {
    dispatch::run(EntryPoint::TsdS3cmd)
}
