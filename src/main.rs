use std::{fs::File, io::Write, path::Path, sync::Arc};

use env_logger::Env;
use fc::{
    cli::{parse_cli, CliOptions, GetCommandOptions},
    config::{Config, ConfigProperties},
    controller::Controller,
    error::{self, AddContext},
    exec::{TaskSpawner, ThreadSpawner},
    gateway::Gateway,
    http::NetClient,
    init,
    io::{Fetcher, Method, Request},
    store::{FileStore, NoStore, PartitionStore, VersionTag},
    Result,
};

const CONFIG_PATH: &str = ".config/forecache/api";

struct Host {
    controller: Controller,
    spawner: Arc<ThreadSpawner>,
    origin: String,
}

fn main() -> Result<()> {
    let option_args = parse_cli();
    let cli_args = option_args.cli_args;
    if cli_args.verbose {
        let env = Env::default().default_filter_or("info");
        env_logger::init_from_env(env);
    }
    let config_file = match cli_args.config {
        Some(path) => path,
        None => {
            let home_dir = std::env::var("HOME").unwrap();
            Path::new(&home_dir).join(CONFIG_PATH)
        }
    };
    let cli_options = option_args.cli_options;
    if let CliOptions::Init(options) = cli_options {
        return init::execute(options, config_file);
    }
    let domain = cli_options.domain().ok_or_else(|| {
        error::gen("Cannot derive a config domain from the target, pass --domain")
    })?;
    let host = host(&config_file, &domain)?;
    let result = match cli_options {
        CliOptions::Get(options) => execute_get(&host, options),
        CliOptions::Install(_) => host.controller.install(),
        CliOptions::Activate(_) => host.controller.activate(),
        CliOptions::Status(_) => execute_status(&host),
        CliOptions::Message(options) => {
            host.controller.run()?;
            host.controller.handle_message(&options.payload)
        }
        // handled above before the host is built
        CliOptions::Init(_) => unreachable!(),
    };
    // a stale-while-revalidate refresh may still be in flight
    host.spawner.wait();
    result
}

fn host(config_file: &Path, domain: &str) -> Result<Host> {
    let f = File::open(config_file).err_context(format!(
        "Unable to open config file at {}, run `fc init --domain {}` first",
        config_file.display(),
        domain
    ))?;
    let config = Arc::new(Config::new(f, domain)?);
    let store: Arc<dyn PartitionStore> = match config.cache_location() {
        Some(_) => {
            let store = FileStore::new(config.clone());
            store.validate_location()?;
            Arc::new(store)
        }
        None => Arc::new(NoStore),
    };
    let fetcher: Arc<dyn Fetcher> = Arc::new(NetClient::new());
    let spawner = Arc::new(ThreadSpawner::default());
    let tag = VersionTag::new(config.cache_version());
    let gateway = Gateway::builder()
        .store(store.clone())
        .fetcher(fetcher.clone())
        .spawner(spawner.clone() as Arc<dyn TaskSpawner>)
        .tag(tag.clone())
        .origin(config.origin())
        .offline_path(config.offline_path())
        .build()?;
    let controller = Controller::builder()
        .store(store)
        .fetcher(fetcher)
        .spawner(spawner.clone() as Arc<dyn TaskSpawner>)
        .gateway(gateway)
        .tag(tag)
        .origin(config.origin())
        .precache_urls(config.precache_urls())
        .max_sync_retries(config.max_sync_retries())
        .build()?;
    Ok(Host {
        controller,
        spawner,
        origin: config.origin().to_string(),
    })
}

fn execute_get(host: &Host, options: GetCommandOptions) -> Result<()> {
    host.controller.run()?;
    let url = if options.url.starts_with('/') {
        format!("{}{}", host.origin, options.url)
    } else {
        options.url
    };
    let request = Request::new(&url, Method::GET);
    let response = host.controller.handle(&request)?;
    println!("{} {}", response.status, url);
    std::io::stdout().write_all(&response.body)?;
    Ok(())
}

fn execute_status(host: &Host) -> Result<()> {
    let partitions = host.controller.status()?;
    if partitions.is_empty() {
        println!("no cache partitions");
        return Ok(());
    }
    for (partition, entries) in partitions {
        println!("{} {}", partition, entries);
    }
    Ok(())
}
