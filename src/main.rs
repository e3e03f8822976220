// Tue Jan 13 2026 - Alex

use binlayout::cli::{parse_args, CommandHandler};
use binlayout::utils::LoggingUtils;
use colored::Colorize;

fn main() {
    let args = parse_args();

    if args.no_color {
        colored::control::set_override(false);
    }
    LoggingUtils::init_logger(args.log_level.as_deref());

    let result = CommandHandler::from_args(&args).and_then(|handler| handler.execute(args.command));

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        for cause in e.chain().skip(1) {
            eprintln!("  {} Caused by: {}", "->".yellow(), cause);
        }
        std::process::exit(1);
    }
}
