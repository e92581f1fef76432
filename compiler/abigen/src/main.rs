//! ABI bridge generator CLI.

use abigen::cli::{parse_generate_args, GENERATE_USAGE};

fn main() {
    abigen::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "generate" => {
            let options = match parse_generate_args(&args[2..]) {
                Ok(options) => options,
                Err(message) => {
                    eprintln!("error: {message}");
                    eprintln!("{GENERATE_USAGE}");
                    std::process::exit(1);
                }
            };
            match abigen::run(&options) {
                Ok(summary) => {
                    println!(
                        "{} headers ({} skipped), {} resources, {} files written, {} common resources copied",
                        summary.headers,
                        summary.skipped,
                        summary.resources,
                        summary.artifacts,
                        summary.common_resources
                    );
                }
                Err(err) => {
                    eprintln!("error: {err}");
                    std::process::exit(1);
                }
            }
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-V" => {
            println!("abigen {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("ABI bridge generator");
    println!();
    println!("Usage: abigen <command> [options]");
    println!();
    println!("Commands:");
    println!("  generate             Scan headers and write export/import bridge sources");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Generate options:");
    println!("  --headers <list>     `;`-separated headers, relative to the source tree");
    println!("  --config <file>      Generator configuration (JSON)");
    println!("  --output <dir>       Root directory for generated files");
    println!("  --source-tree <dir>  Root of the scanned sources (default: .)");
    println!("  --revision <sha>     Revision stamped into build_info.h");
    println!("  --common-lib <dir>   Common-resource manifests (default: <output>/common_lib)");
    println!();
    println!("Set RUST_LOG=debug to trace each phase.");
}
