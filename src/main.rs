/// Entry point for the native resolver tool
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;
    use hoverzoom::cli::{self, Cli};

    let args = Cli::parse();

    let loaded = match cli::load_config(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    env_logger::Builder::new()
        .filter_level(loaded.config.log_level.to_level_filter())
        .parse_default_env()
        .init();
    loaded.log_source();

    let resolver = match cli::resolver_for(&args) {
        Ok(resolver) => resolver,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    let entries = cli::resolve_all(&resolver, &args.urls);
    match cli::render(&entries, args.compact) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

// WASM doesn't use main(), it uses wasm_bindgen's start function
#[cfg(target_arch = "wasm32")]
fn main() {}
