//! Command line access to the mapping engine
//!
//! Decodes and encodes values through the value factory registry and
//! queries XML documents with location patterns.

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::process;
use std::sync::Arc;
use url::Url;
use xmapper::{
    ClassRef, Context, Element, MapperConfig, ModuleClassLoader, Path, ValueFactoryRegistry,
    ValueType,
};

#[derive(Parser)]
#[command(name = "xmap")]
#[command(about = "Decode values and query XML documents the way the mapper does")]
#[command(version)]
struct Cli {
    /// JSON file with mapper configuration
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Class names the class loader can resolve
    #[arg(short, long = "define", global = true)]
    defines: Vec<String>,

    /// Root URL relative resources resolve against
    #[arg(short, long, global = true)]
    resource_root: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode text as a value of the given type
    Decode {
        /// Value type, e.g. integer, date, url, class
        value_type: String,
        /// Text to decode
        text: String,
    },
    /// Decode text and encode it back in canonical form
    Encode {
        /// Value type, e.g. integer, date, url, class
        value_type: String,
        /// Text to normalize
        text: String,
    },
    /// Select text from a document with a location pattern
    Query {
        /// Location pattern, e.g. extension@point
        pattern: String,
        /// XML file (reads from stdin if not provided)
        #[arg(short, long)]
        file: Option<String>,
        /// Print every match instead of the first
        #[arg(short, long)]
        all: bool,
        /// Keep surrounding whitespace of element text
        #[arg(long)]
        no_trim: bool,
    },
    /// List the value types with a registered factory
    Types,
}

fn main() {
    human_panic::setup_panic!();
    env_logger::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());
    let registry = ValueFactoryRegistry::standard(&config);
    let ctx = build_context(&cli.defines, cli.resource_root.as_deref());

    match cli.command {
        Commands::Decode { value_type, text } => {
            handle_decode(&registry, &ctx, &value_type, &text, false);
        }
        Commands::Encode { value_type, text } => {
            handle_decode(&registry, &ctx, &value_type, &text, true);
        }
        Commands::Query {
            pattern,
            file,
            all,
            no_trim,
        } => {
            let trim = config.trim_text && !no_trim;
            handle_query(&pattern, file.as_deref(), all, trim);
        }
        Commands::Types => {
            let mut names: Vec<String> = registry.types().map(ValueType::to_string).collect();
            names.sort();
            for name in names {
                println!("{name}");
            }
        }
    }
}

fn load_config(path: Option<&str>) -> MapperConfig {
    let Some(path) = path else {
        return MapperConfig::default();
    };
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading config '{path}': {e}");
            process::exit(1);
        }
    };
    match MapperConfig::from_json(&text) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}

fn build_context(defines: &[String], resource_root: Option<&str>) -> Context {
    let loader = ModuleClassLoader::new("cli");
    for name in defines {
        loader.define(ClassRef::named(name.as_str()));
    }
    let ctx = Context::with_class_loader(Arc::new(loader));
    match resource_root.map(Url::parse) {
        None => ctx,
        Some(Ok(root)) => ctx.with_resource_root(root),
        Some(Err(e)) => {
            eprintln!("Invalid resource root: {e}");
            process::exit(1);
        }
    }
}

fn handle_decode(
    registry: &ValueFactoryRegistry,
    ctx: &Context,
    value_type: &str,
    text: &str,
    encode: bool,
) {
    let value_type: ValueType = match value_type.parse() {
        Ok(value_type) => value_type,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let value = match registry.decode(ctx, &value_type, text) {
        Ok(Some(value)) => value,
        Ok(None) => {
            eprintln!("No value factory registered for {value_type}");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    if !encode {
        println!("{}: {value}", value.type_name());
        return;
    }
    match registry.encode(ctx, &value_type, &value) {
        Ok(Some(text)) => println!("{text}"),
        Ok(None) => {
            eprintln!("No value factory registered for {value_type}");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}

fn handle_query(pattern: &str, file: Option<&str>, all: bool, trim: bool) {
    let path = match Path::parse(pattern) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let xml = if let Some(filename) = file {
        match fs::read_to_string(filename) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{filename}': {e}");
                process::exit(1);
            }
        }
    } else {
        let mut buffer = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut buffer) {
            eprintln!("Error reading from stdin: {e}");
            process::exit(1);
        }
        buffer
    };

    let root = match Element::parse(&xml) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let matches = if all {
        path.select_texts(&root, trim)
    } else {
        path.select_text(&root, trim).into_iter().collect()
    };
    if matches.is_empty() {
        process::exit(2);
    }
    for text in matches {
        println!("{text}");
    }
}
