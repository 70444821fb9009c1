use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::cli::init::InitCommandOptions;
use crate::error::{AddContext, FcError};
use crate::Result;

const CONFIG_TEMPLATE: &str = r#"
# Fill in the <VALUE> below with your own values
# and tweak accordingly.

# Scheme and host of the origin this cache fronts. Required.
<DOMAIN>.origin=<VALUE>

# Root directory for the on-disk cache partitions. If left empty or commented
# out, responses are fetched but never stored.
<DOMAIN>.cache_location=.cache/forecache

# Generation tag. Bump it (v1 -> v2) to discard every cached response on the
# next activation. Old generations are evicted, the new ones start empty.
<DOMAIN>.cache_version=v1

# Path of the offline fallback document, served out of the static partition
# when both the network and the cache come up empty.
<DOMAIN>.offline_path=/offline

# Comma separated application shell paths fetched into the static partition
# at install time.
<DOMAIN>.precache_urls=/,/offline,/manifest.json,/favicon.ico,/favicon.png,/apple-touch-icon.png

# Retries for background sync reconciliation before giving up. Waits
# exponentially longer between attempts.
<DOMAIN>.max_sync_retries=3

### Other domains - add more if needed
"#;

pub fn execute<P: AsRef<Path>>(options: InitCommandOptions, config_path: P) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(config_path.as_ref());

    let mut file = match file {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(FcError::PreconditionNotMet(format!(
                "Config file at {} already exists, move it aside before running `init` again",
                config_path.as_ref().display()
            ))
            .into())
        }
        Err(e) => {
            return Err(e).err_context(format!(
                "Unable to create config file at path {}",
                config_path.as_ref().display()
            ))
        }
    };
    generate_and_persist(options, &mut file).err_context(format!(
        "Failed to generate and persist config at path {}",
        config_path.as_ref().display()
    ))
}

fn generate_and_persist<W: Write>(options: InitCommandOptions, writer: &mut W) -> Result<()> {
    let data = change_placeholders(&options.domain);
    persist_config(data, writer)
}

fn persist_config<D: Into<String>, W: Write>(data: D, writer: &mut W) -> Result<()> {
    writer
        .write_all(data.into().as_bytes())
        .err_context("Writing the data to disk failed")?;
    Ok(())
}

fn change_placeholders(domain: &str) -> String {
    CONFIG_TEMPLATE.replace("<DOMAIN>", domain)
}
