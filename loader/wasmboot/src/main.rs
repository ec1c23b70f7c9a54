//! wasmboot CLI
//!
//! Fetch, instantiate and start WebAssembly modules the way a script-tag
//! bootstrapper would.

use wasmboot::commands::{boot_script, load_module, CommandError};
use wasmboot::BootConfig;

#[tokio::main]
async fn main() {
    wasmboot::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "boot" => {
            let mut config = BootConfig::from_env();
            let positional = config.apply_args(&args[2..]);
            let Some(url) = positional.first() else {
                eprintln!("Usage: wasmboot boot <script-url> [--root=<dir>] [--max-ops=<n>]");
                std::process::exit(1);
            };
            exit_on_error(boot_script(url, &config).await.map(drop));
        }
        "load" => {
            let mut config = BootConfig::from_env();
            let positional = config.apply_args(&args[2..]);
            let Some(identifier) = positional.first() else {
                eprintln!("Usage: wasmboot load <identifier> [--secure] [--base=<url>|--root=<dir>]");
                std::process::exit(1);
            };
            exit_on_error(load_module(identifier, &config).await.map(drop));
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-v" => {
            println!("wasmboot {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn exit_on_error(result: Result<(), CommandError>) {
    if let Err(e) = result {
        eprintln!("error: {e}");
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = std::error::Error::source(cause);
        }
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("wasmboot - WebAssembly module bootstrapper");
    println!();
    println!("Usage: wasmboot <command> [options]");
    println!();
    println!("Commands:");
    println!("  boot <script-url>    Load the module named by the URL fragment");
    println!("  load <identifier>    Load /wasm/<identifier>.wasm directly");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Options:");
    println!("  --base=<url>        Fetch binaries from this origin (env: WASMBOOT_BASE)");
    println!("  --root=<dir>        Serve binaries from a local directory (env: WASMBOOT_ROOT)");
    println!("  --secure            Disable env.js and extra capabilities (load only)");
    println!("  --max-ops=<n>       Operation limit for guest scripts");
    println!();
    println!("Examples:");
    println!("  wasmboot boot 'https://example.com/loader.js#clock'");
    println!("  wasmboot boot 'https://example.com/loader.js?secure#clock'");
    println!("  wasmboot boot 'file:///srv/www/loader.js#clock' --root=/srv/www");
    println!("  wasmboot load clock --root=./public");
    println!("  wasmboot load clock --secure --base=https://example.com/");
    println!();
    println!("Logging: RUST_LOG=wasmboot=debug");
}
