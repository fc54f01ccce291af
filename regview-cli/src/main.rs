use std::{
    io::{self, BufRead},
    path,
    sync::mpsc::Receiver,
};

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::Verbosity;
use log::{info, warn};
use regview::{
    ChannelDevice, DeviceRequest, EntityKey, Filters, ItemFilter, LoadConfig, ModelEvent,
    RegisterModel, Row,
};

#[derive(Parser)]
#[command(version, about, long_about = None, author = clap::crate_authors!(), subcommand_required = true)]
struct Cli {
    /// CMSIS-SVD source file for memory map metadata
    #[arg(long, required = true)]
    svd: String,

    /// Only load these peripherals. Overrides REGVIEW_INCLUDE_PERIPHERALS.
    #[arg(long, action = clap::ArgAction::Append)]
    include: Vec<String>,

    /// Leave these peripherals out. Overrides REGVIEW_EXCLUDE_PERIPHERALS.
    #[arg(long, action = clap::ArgAction::Append)]
    exclude: Vec<String>,

    /// Register bit-width used when neither a register nor its peripheral declares one
    #[arg(long, default_value_t = 32)]
    default_size: u32,

    #[command(flatten)]
    verbose: Verbosity,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the source file can be read completely
    DryRun,
    /// List all peripherals in the supplied source
    Ls {
        /// Only list peripherals without register counts
        #[arg(long, action = clap::ArgAction::SetTrue)]
        no_count: bool,
        #[arg(long, default_value = "alpha")]
        sorting: Sorting,
    },
    /// Print the registers and fields of a peripheral
    Show {
        peripheral: String,
        #[arg(long, default_value = "hex")]
        format: Format,
    },
    /// Print the parsed model as JSON
    Dump,
    /// Activate a peripheral and apply device reports and edits read from stdin
    ///
    /// Each line is either `<ADDRESS> <VALUE>`, a value reported by the device, or
    /// `set <REGISTER>[.<FIELD>] <VALUE>`, an edit. Numbers in reports may be decimal or `0x`
    /// prefixed hex. Edits are read in the selected format.
    Monitor {
        peripheral: String,
        #[arg(long, default_value = "hex")]
        format: Format,
    },
}

#[derive(Clone, Copy)]
enum Sorting {
    Preserve,
    Alpha,
}

impl ValueEnum for Sorting {
    fn value_variants<'a>() -> &'a [Self] {
        &[Sorting::Alpha, Sorting::Preserve]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        use clap::builder::PossibleValue;
        match self {
            Sorting::Alpha => Some(PossibleValue::new("alpha")),
            Sorting::Preserve => Some(PossibleValue::new("preserve")),
        }
    }
}

#[derive(Clone, Copy)]
struct Format(regview::Format);

impl From<Format> for regview::Format {
    fn from(value: Format) -> Self {
        value.0
    }
}

impl ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            Self(regview::Format::Hexadecimal),
            Self(regview::Format::Decimal),
            Self(regview::Format::Octal),
            Self(regview::Format::Binary),
        ]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        use clap::builder::PossibleValue;
        match self.0 {
            regview::Format::Hexadecimal => Some(PossibleValue::new("hex")),
            regview::Format::Decimal => Some(PossibleValue::new("dec")),
            regview::Format::Octal => Some(PossibleValue::new("oct")),
            regview::Format::Binary => Some(PossibleValue::new("bin")),
        }
    }
}

fn string_to_path(s: &str) -> anyhow::Result<path::PathBuf> {
    let path = std::env::current_dir()
        .context("cannot access current working dir")?
        .join(s);
    if !path.is_file() {
        return Err(anyhow!("file does not exist: {}", path.display()));
    }
    // Canonicalize paths for clear output
    Ok(path.canonicalize()?)
}

fn load_config(cli: &Cli) -> anyhow::Result<LoadConfig> {
    let mut config = LoadConfig::from_env()
        .default_register_size(cli.default_size)
        .with_context(|| format!("invalid --default-size {}", cli.default_size))?;
    if !cli.include.is_empty() || !cli.exclude.is_empty() {
        let allow_list = (!cli.include.is_empty()).then(|| cli.include.clone());
        config = config.filters(Filters::from_filters(
            Some(ItemFilter::list(allow_list, cli.exclude.clone())),
            None,
        ));
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    let path = string_to_path(&cli.svd)?;
    let config = load_config(&cli)?;

    if let Some(cmd) = &cli.command {
        match cmd {
            Command::DryRun => {
                match regview::dry_run(&path, &config)
                    .with_context(|| format!("could not execute dry run for {}", path.display()))
                {
                    Ok(count) => {
                        println!("regview: dry run completed successfully, {count} peripherals")
                    }
                    Err(e) => println!("regview: exited unsuccessfully: {e:?}"),
                }
            }
            Command::Ls { no_count, sorting } => ls(&path, &config, *sorting, *no_count),
            Command::Show { peripheral, format } => {
                let mut model = RegisterModel::new(
                    regview::load_groups(&path, &config),
                    regview::Detached,
                );
                activate(&mut model, peripheral, *format)?;
                for row in model.rows() {
                    print_row(&row);
                }
            }
            Command::Dump => {
                let groups = regview::load_groups(&path, &config);
                println!("{}", regview::groups_to_json(&groups));
            }
            Command::Monitor { peripheral, format } => {
                monitor(&path, &config, peripheral, *format)?;
            }
        }
    } else {
        println!("Nothing to do. Please issue a subcommand.")
    }

    Ok(())
}

fn ls(path: &path::Path, config: &LoadConfig, sorting: Sorting, no_count: bool) {
    let groups = regview::load_groups(path, config);
    let mut top_and_count = regview::list_groups(&groups);
    if top_and_count.is_empty() {
        println!("regview: no peripherals found in input");
    }
    match sorting {
        Sorting::Preserve => { /* do nothing */ }
        Sorting::Alpha => top_and_count.sort(),
    };
    let longest = top_and_count.iter().map(|(s, _)| s.len()).max().unwrap_or(0);
    for (top, count) in top_and_count {
        if no_count {
            println!("{top}");
        } else {
            println!("{top: <longest$} {count}");
        }
    }
}

/// Activates `peripheral` and switches every register and field to `format`
fn activate<D: regview::DeviceLink>(
    model: &mut RegisterModel<D>,
    peripheral: &str,
    format: Format,
) -> anyhow::Result<()> {
    model
        .activate(peripheral)
        .with_context(|| format!("cannot show peripheral {peripheral}"))?;
    let keys: Vec<EntityKey> = model.rows().into_iter().map(|row| row.key).collect();
    for key in keys {
        model.set_format(key, format.into())?;
    }
    Ok(())
}

fn print_row(row: &Row) {
    let indent = "  ".repeat(row.key.depth());
    let marker = if row.changed { "*" } else { " " };
    println!(
        "{marker} {:<32} {:<4} {}",
        format!("{indent}{}", row.name),
        row.access,
        row.value
    );
}

fn print_requests(requests: &Receiver<DeviceRequest>) {
    for request in requests.try_iter() {
        match request {
            DeviceRequest::Read(addresses) => {
                let addresses: Vec<_> = addresses.iter().map(|a| format!("{a:#x}")).collect();
                println!("> read {}", addresses.join(" "));
            }
            DeviceRequest::Write { address, value } => {
                println!("> write {address:#x} {value:#x}");
            }
        }
    }
}

fn print_updates(model: &RegisterModel<ChannelDevice>, events: &Receiver<ModelEvent>) {
    for event in events.try_iter() {
        let ModelEvent::Updated { key, .. } = event else {
            continue;
        };
        let Some(reg) = model.register(key) else {
            continue;
        };
        if let Some(row) = model.row(key.into()) {
            print_row(&row);
        }
        let changed_fields = reg
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| reg.is_field_changed(f));
        for (field, _) in changed_fields {
            let field_key = regview::FieldKey {
                register: key,
                field,
            };
            if let Some(row) = model.row(field_key.into()) {
                print_row(&row);
            }
        }
    }
}

fn monitor(
    path: &path::Path,
    config: &LoadConfig,
    peripheral: &str,
    format: Format,
) -> anyhow::Result<()> {
    let (device, requests) = ChannelDevice::new();
    let mut model = RegisterModel::new(regview::load_groups(path, config), device);
    let events = model.subscribe();
    activate(&mut model, peripheral, format)?;
    for row in model.rows() {
        print_row(&row);
    }
    print_requests(&requests);
    // Rows were printed in full above
    events.try_iter().for_each(drop);

    for line in io::stdin().lock().lines() {
        let line = line.context("cannot read stdin")?;
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => continue,
            ["set", target, text] => {
                let Some(key) = model.find(target) else {
                    warn!("no register or field {target} in {peripheral}");
                    continue;
                };
                match model.edit_value(key, text, format.into()) {
                    Ok(value) => info!("{target} set, register value is now {value:#x}"),
                    Err(e) => println!("regview: rejected edit of {target}: {e}"),
                }
            }
            [address, value] => {
                let (address, value) = match (
                    clap_num::maybe_hex::<u64>(address),
                    clap_num::maybe_hex::<u64>(value),
                ) {
                    (Ok(address), Ok(value)) => (address, value),
                    _ => {
                        println!("regview: cannot read report {line:?}");
                        continue;
                    }
                };
                model.apply_update(address, value);
            }
            _ => bail!("unrecognized input {line:?}, expected `<ADDRESS> <VALUE>` or `set <TARGET> <VALUE>`"),
        }
        print_updates(&model, &events);
        print_requests(&requests);
    }
    Ok(())
}
