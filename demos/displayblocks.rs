#![warn(missing_docs)]
#![warn(unsafe_code)]
//! Display the decoded block list of a turn file
//! Usage: cargo run --example displayblocks -- --input FILENAME
//!
use std::process::exit;

use clap::Parser;
use config::Config;
use log::{error, info};

use stars_rider::block_format::blocks::BlockKind;
use stars_rider::block_format::turn_file::TurnFile;
use stars_rider::file::read_file;

/// Command line arguments to display the blocks of a turn file
#[derive(Parser, Debug)]
#[clap(about, version, author)]
struct Args {
    /// Filename to parse
    #[clap(short, long)]
    input: String,
    /// Print the decrypted payload of every block as hex
    #[clap(long)]
    dump_payloads: bool,
}

/// Parse a turn file and print its blocks
fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if let Err(e) = env_logger::try_init() {
        panic!("couldn't initialize logger: {:?}", e);
    }

    let settings_result = load_settings("config/stars-rider");
    let settings = match settings_result {
        Ok(settings) => {
            info!("merged in config");
            settings
        }
        Err(s) => {
            error!("error loading config: {:?}", s);
            Config::default()
        }
    };

    let dump_payloads = args.dump_payloads || settings.get_bool("dump-payloads").unwrap_or(false);

    stars_rider::init();

    let data = match read_file(&args.input) {
        Ok(data) => data,
        Err(e) => {
            error!("{}", e);
            exit(1);
        }
    };

    let turn_file = match TurnFile::parse(&data) {
        Ok(turn_file) => turn_file,
        Err(e) => {
            error!("{}", e);
            exit(1);
        }
    };

    println!(
        "{} blocks, {}",
        turn_file.block_list().len(),
        turn_file.file_header()
    );

    for (index, block) in turn_file.block_list().iter().enumerate() {
        println!("{:4}  type {:2}  {}", index, block.block_type, block);

        if let BlockKind::Player(player) = &block.kind {
            if let Some(hash) = player.hashed_password_u32() {
                println!("      hashed password: {:#010x}", hash);
            }
        }

        if dump_payloads {
            println!("      {:02x?}", block.decrypted);
        }
    }

    exit(0);
}

/// load settings from a config file
/// returns the config settings as a Config on success, or a ConfigError on failure
fn load_settings(config_name: &str) -> Result<Config, config::ConfigError> {
    let builder = Config::builder()
        // Add in config file
        .add_source(config::File::with_name(config_name))
        // Add in settings from the environment (with a prefix of APP)
        // E.g. `APP_DEBUG=1 cargo run --example displayblocks` sets the `debug` key
        .add_source(config::Environment::with_prefix("APP"))
        .build();

    builder
}
