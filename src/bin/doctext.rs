use clap::Parser;
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::{Format, Severity};
use sloggers::Build;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "doctext")]
#[command(about = "Print the text of Word documents")]
#[command(version)]
struct Args {
    /// Log debug details to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Documents to read, printed in order
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() {
    std::process::exit(real_main(Args::parse()));
}

fn real_main(args: Args) -> i32 {
    let mut builder = TerminalLoggerBuilder::new();
    builder.level(if args.verbose {
        Severity::Debug
    } else {
        Severity::Warning
    });
    builder.destination(Destination::Stderr);
    builder.format(Format::Full);
    let logger = match builder.build() {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Unable to build logger: {}", e);
            return 1;
        }
    };

    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();
    let mut status = 0;
    for path in &args.files {
        let logger = logger.new(slog::o!("path" => path.display().to_string()));
        let text = olefs::doc::text_with_logger(path, logger.clone())
            .and_then(|mut reader| reader.read_to_string());
        let text = match text {
            Ok(text) => text,
            Err(e) => {
                slog::crit!(logger, "{}", e; "kind" => ?e.kind());
                status = 1;
                continue;
            }
        };
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        if let Err(e) = stdout
            .write_all(text.as_bytes())
            .and_then(|()| stdout.write_all(b"\n"))
        {
            slog::crit!(logger, "Unable to write text: {}", e);
            return 1;
        }
    }
    status
}
